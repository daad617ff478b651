// Copyright 2026 the ABGolf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Phase 2: thread dimension and type through the decoded steps.

use crate::outcome::ParseOutcome;
use crate::program::{Program, StepState};
use crate::registry::Violation;
use crate::trace::Tracer;

/// Computes the state of every step after the sentinel, left to right.
///
/// Each step's function checks the previous state before producing its own. Propagation stops at
/// the first rejected state: that step and everything after it keep `state == None`, and all
/// earlier states stay in place.
pub fn propagate<'r>(program: &mut Program<'r>) -> ParseOutcome<'r> {
    propagate_traced(program, &mut Tracer::none())
}

pub(crate) fn propagate_traced<'r>(
    program: &mut Program<'r>,
    tracer: &mut Tracer<'_>,
) -> ParseOutcome<'r> {
    let mut prev = program
        .steps
        .first()
        .and_then(|s| s.state)
        .unwrap_or(StepState::INPUT);
    for (index, step) in program.steps.iter_mut().enumerate().skip(1) {
        // Only the sentinel lacks a function.
        let Some(function) = step.function else {
            continue;
        };
        match function.apply(prev) {
            Ok(next) => {
                step.state = Some(next);
                tracer.state(index, step.pc, next);
                prev = next;
            }
            Err(Violation::Dimension(actual)) => {
                return ParseOutcome::InvalidDimension {
                    step: index,
                    pc: step.pc,
                    function,
                    actual,
                };
            }
            Err(Violation::Type(actual)) => {
                return ParseOutcome::InvalidType {
                    step: index,
                    pc: step.pc,
                    function,
                    actual,
                };
            }
        }
    }
    ParseOutcome::Success
}
