// Copyright 2026 the ABGolf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Program generators for the `abgolf` benchmarks.

/// A program of `steps` builtin instructions that parses successfully.
///
/// Cycles through `pass`, `params`, `dims` and `types`, so every constraint check runs.
#[must_use]
pub fn builtin_program(steps: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(steps * 2);
    for i in 0..steps {
        match i % 4 {
            0 => out.push(0x50),
            1 => out.extend_from_slice(&[0x51, (i & 0xff) as u8]),
            2 => out.push(0x52),
            _ => out.push(0x53),
        }
    }
    out
}

/// Like [`builtin_program`], but the final byte is an unregistered opcode.
#[must_use]
pub fn program_with_invalid_tail(steps: usize) -> Vec<u8> {
    let mut out = builtin_program(steps);
    out.push(0xff);
    out
}
