// Copyright 2026 the ABGolf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Forwards parser events to `tracing`.

use abgolf::outcome::ParseOutcome;
use abgolf::program::{Step, StepState};
use abgolf::trace::{ParseMask, ParseSink};
use tracing::{Level, debug, enabled, trace};

/// Logs decoded steps and states at `trace`, and the outcome at `debug`.
pub(crate) struct TraceLog;

impl ParseSink for TraceLog {
    fn mask(&self) -> ParseMask {
        let mut mask = ParseMask::NONE;
        if enabled!(Level::TRACE) {
            mask |= ParseMask::STEP | ParseMask::STATE;
        }
        if enabled!(Level::DEBUG) {
            mask |= ParseMask::OUTCOME;
        }
        mask
    }

    fn step(&mut self, index: usize, step: &Step<'_>) {
        let function = step.function.map_or("input", |f| f.name.as_str());
        trace!(index, pc = step.pc, function, params = ?step.params, "decoded step");
    }

    fn state(&mut self, index: usize, pc: usize, state: StepState) {
        trace!(index, pc, dimension = state.dimension, ty = %state.ty, "propagated state");
    }

    fn outcome(&mut self, outcome: &ParseOutcome<'_>) {
        debug!(success = outcome.is_success(), pc = ?outcome.pc(), "parse finished");
    }
}
