// Copyright 2026 the ABGolf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing hooks for the parser.
//!
//! Tracing is optional and `no_std` friendly: the parser only emits the events requested by a
//! sink's [`ParseMask`]. To enable tracing, pass a [`ParseSink`] to [`parse_traced`].

#[cfg(doc)]
use crate::parser::parse_traced;

use crate::outcome::ParseOutcome;
use crate::program::{Step, StepState};

/// A set of trace events requested by a [`ParseSink`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ParseMask(u32);

impl core::ops::BitOr for ParseMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl core::ops::BitOrAssign for ParseMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl ParseMask {
    /// No tracing.
    pub const NONE: Self = Self(0);
    /// Trace each decoded step ([`ParseSink::step`]).
    pub const STEP: Self = Self(1 << 0);
    /// Trace each propagated state ([`ParseSink::state`]).
    pub const STATE: Self = Self(1 << 1);
    /// Trace the final outcome ([`ParseSink::outcome`]).
    pub const OUTCOME: Self = Self(1 << 2);
    /// Every event.
    pub const ALL: Self = Self(Self::STEP.0 | Self::STATE.0 | Self::OUTCOME.0);

    /// Returns `true` if this mask includes all bits in `other`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

/// A sink that receives parser events.
pub trait ParseSink {
    /// Returns the set of events the sink wants.
    fn mask(&self) -> ParseMask {
        ParseMask::NONE
    }

    /// Called after a step is decoded.
    ///
    /// - `index`: step index (the first decoded step is 1)
    /// - `step`: the step, without a state yet
    fn step(&mut self, _index: usize, _step: &Step<'_>) {}

    /// Called after a step's state is computed.
    ///
    /// - `index`: step index
    /// - `pc`: byte offset of the step's opcode
    /// - `state`: the newly computed state
    fn state(&mut self, _index: usize, _pc: usize, _state: StepState) {}

    /// Called once with the final outcome.
    fn outcome(&mut self, _outcome: &ParseOutcome<'_>) {}
}

/// Mask-filtering wrapper around an optional sink.
pub(crate) struct Tracer<'s> {
    mask: ParseMask,
    sink: Option<&'s mut dyn ParseSink>,
}

impl<'s> Tracer<'s> {
    pub(crate) fn none() -> Self {
        Self {
            mask: ParseMask::NONE,
            sink: None,
        }
    }

    pub(crate) fn new(sink: &'s mut dyn ParseSink) -> Self {
        Self {
            mask: sink.mask(),
            sink: Some(sink),
        }
    }

    fn wants(&mut self, event: ParseMask) -> Option<&mut (dyn ParseSink + 's)> {
        if self.mask.contains(event) {
            self.sink.as_deref_mut()
        } else {
            None
        }
    }

    pub(crate) fn step(&mut self, index: usize, step: &Step<'_>) {
        if let Some(sink) = self.wants(ParseMask::STEP) {
            sink.step(index, step);
        }
    }

    pub(crate) fn state(&mut self, index: usize, pc: usize, state: StepState) {
        if let Some(sink) = self.wants(ParseMask::STATE) {
            sink.state(index, pc, state);
        }
    }

    pub(crate) fn outcome(&mut self, outcome: &ParseOutcome<'_>) {
        if let Some(sink) = self.wants(ParseMask::OUTCOME) {
            sink.outcome(outcome);
        }
    }
}
