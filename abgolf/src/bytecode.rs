// Copyright 2026 the ABGolf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Phase 1: split a byte program into steps.
//!
//! Each step is an opcode byte followed by exactly as many parameter bytes as the opcode's
//! function declares. Decoding stops at the first byte that is not a registered opcode, or at
//! the first function whose parameters run past the end of the input.

use crate::format::Reader;
use crate::outcome::ParseOutcome;
use crate::program::{Program, Step};
use crate::registry::FunctionRegistry;
use crate::trace::Tracer;

/// Decodes `bytes` into a [`Program`] of steps.
///
/// Returns the program together with the decode error, if any. On error the program holds every
/// step decoded before the failing offset; the failing step itself is not included. No states
/// beyond the sentinel's are computed.
///
/// # Example
/// ```
/// use abgolf::bytecode::decode;
/// use abgolf::outcome::ParseOutcome;
/// use abgolf::registry::FunctionRegistry;
///
/// let registry = FunctionRegistry::builtin();
/// let (program, err) = decode(&[0x50, 0x51, b'x', 0xff], &registry);
/// assert_eq!(program.instruction_count(), 2);
/// assert_eq!(err, Some(ParseOutcome::InvalidFunction { pc: 3, opcode: 0xff }));
/// ```
pub fn decode<'r>(
    bytes: &[u8],
    registry: &'r FunctionRegistry,
) -> (Program<'r>, Option<ParseOutcome<'r>>) {
    decode_traced(bytes, registry, &mut Tracer::none())
}

pub(crate) fn decode_traced<'r>(
    bytes: &[u8],
    registry: &'r FunctionRegistry,
    tracer: &mut Tracer<'_>,
) -> (Program<'r>, Option<ParseOutcome<'r>>) {
    let mut program = Program::new(bytes);
    let mut r = Reader::new(bytes);
    while let Ok(opcode) = r.read_u8() {
        let pc = r.offset() - 1;
        let Some(function) = registry.lookup(opcode) else {
            return (program, Some(ParseOutcome::InvalidFunction { pc, opcode }));
        };
        let Ok(params) = r.read_bytes(function.param_count) else {
            let bytes_given = r.remaining();
            return (
                program,
                Some(ParseOutcome::OutOfBytes {
                    pc,
                    function,
                    bytes_given,
                }),
            );
        };
        let step = Step::decoded(function, pc, params);
        tracer.step(program.steps.len(), &step);
        program.steps.push(step);
    }
    (program, None)
}
