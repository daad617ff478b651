// Copyright 2026 the ABGolf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable rendering of parse outcomes and programs.
//!
//! Byte offsets are 0-indexed. Opcodes are shown both as hex and as their code page 437 glyph,
//! since that is how programs are usually written down.

use alloc::string::{String, ToString};
use core::fmt;

use crate::cp437::Glyph;
use crate::outcome::ParseOutcome;
use crate::program::{Program, Step};
use crate::registry::FunctionDescriptor;

/// Renders `outcome` as a diagnostic message.
#[must_use]
pub fn render_outcome(outcome: &ParseOutcome<'_>) -> String {
    outcome.to_string()
}

/// `0x52 'dims' (R)`
struct FunctionRef<'a>(&'a FunctionDescriptor);

impl fmt::Display for FunctionRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let func = self.0;
        write!(
            f,
            "{:#04x} '{}' ({})",
            func.opcode,
            func.name,
            Glyph(func.opcode)
        )
    }
}

impl fmt::Display for ParseOutcome<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("program parsed successfully"),
            Self::InvalidFunction { pc, opcode } => write!(
                f,
                "invalid function {opcode:#04x} ({}) at byte {pc}",
                Glyph(*opcode)
            ),
            Self::OutOfBytes {
                pc,
                function,
                bytes_given,
            } => write!(
                f,
                "function {} at byte {pc} requires {} parameter bytes, but {bytes_given} were given",
                FunctionRef(function),
                function.param_count
            ),
            Self::InvalidDimension {
                step,
                pc,
                function,
                actual,
            } => {
                write!(
                    f,
                    "invalid dimension {actual} for function {} at byte {pc} (step {step})",
                    FunctionRef(function)
                )?;
                match function.dimension.accepted() {
                    Some(dims) => write!(f, "\naccepted dimensions: {dims:?}"),
                    None => f.write_str("\naccepted dimensions: Any"),
                }
            }
            Self::InvalidType {
                step,
                pc,
                function,
                actual,
            } => {
                write!(
                    f,
                    "invalid type {actual} for function {} at byte {pc} (step {step})",
                    FunctionRef(function)
                )?;
                match function.input_types {
                    Some(types) => write!(f, "\naccepted types: {types}"),
                    None => f.write_str("\naccepted types: Any"),
                }
            }
        }
    }
}

fn write_step(f: &mut fmt::Formatter<'_>, step: &Step<'_>) -> fmt::Result {
    match step.function {
        None => f.write_str("   -  input")?,
        Some(func) => {
            write!(
                f,
                "{:>4}  {:#04x} {} {}",
                step.pc,
                func.opcode,
                Glyph(func.opcode),
                func.name
            )?;
            for b in &step.params {
                write!(f, " {b:#04x}")?;
            }
        }
    }
    match step.state {
        Some(s) => write!(f, "  ; dim={} type={}", s.dimension, s.ty),
        None => f.write_str("  ; ?"),
    }
}

/// One line per step: byte offset, opcode, glyph, name, parameters and the computed state (`?`
/// where propagation never reached the step).
impl fmt::Display for Program<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps().iter().enumerate() {
            if i != 0 {
                f.write_str("\n")?;
            }
            write_step(f, step)?;
        }
        Ok(())
    }
}
