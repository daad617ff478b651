// Copyright 2026 the ABGolf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! LEB128 varints.

use alloc::vec::Vec;

use super::DecodeError;

/// Reads an unsigned LEB128 integer from `bytes` starting at `*offset`.
///
/// Rejects encodings that overflow `u64`.
pub fn read_uleb128_u64(bytes: &[u8], offset: &mut usize) -> Result<u64, DecodeError> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;
    loop {
        let byte = *bytes.get(*offset).ok_or(DecodeError::UnexpectedEof)?;
        *offset += 1;
        let low = u64::from(byte & 0x7f);
        if shift == 63 && low > 1 {
            return Err(DecodeError::InvalidVarint);
        }
        result |= low << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
        if shift > 63 {
            return Err(DecodeError::InvalidVarint);
        }
    }
}

/// Reads a signed LEB128 integer from `bytes` starting at `*offset`.
///
/// Rejects encodings that overflow `i64`.
pub fn read_sleb128_i64(bytes: &[u8], offset: &mut usize) -> Result<i64, DecodeError> {
    let mut result: i64 = 0;
    let mut shift: u32 = 0;
    loop {
        let byte = *bytes.get(*offset).ok_or(DecodeError::UnexpectedEof)?;
        *offset += 1;
        // The tenth byte may only carry the sign.
        if shift == 63 && byte != 0x00 && byte != 0x7f {
            return Err(DecodeError::InvalidVarint);
        }
        result |= i64::from(byte & 0x7f) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            if shift < 64 && byte & 0x40 != 0 {
                result |= -1_i64 << shift;
            }
            return Ok(result);
        }
        if shift > 63 {
            return Err(DecodeError::InvalidVarint);
        }
    }
}

/// Appends `v` as an unsigned LEB128 integer.
pub fn write_uleb128_u64(out: &mut Vec<u8>, mut v: u64) {
    loop {
        let byte = (v & 0x7f) as u8;
        v >>= 7;
        if v == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Appends `v` as a signed LEB128 integer.
pub fn write_sleb128_i64(out: &mut Vec<u8>, mut v: i64) {
    loop {
        let byte = (v & 0x7f) as u8;
        v >>= 7;
        let done = (v == 0 && byte & 0x40 == 0) || (v == -1 && byte & 0x40 != 0);
        if done {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}
