// Copyright 2026 the ABGolf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Byte cursors used by the program decoder and the persisted container.
//!
//! Integers in the container are LEB128 varints, except for the fixed-width version fields.
//! Strings and byte blobs carry a ULEB128 length prefix.

mod leb128;

pub use leb128::{read_sleb128_i64, read_uleb128_u64, write_sleb128_i64, write_uleb128_u64};

use alloc::vec::Vec;
use core::fmt;

/// Byte-level failure while reading a program or container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// Ran out of bytes mid-value.
    UnexpectedEof,
    /// A varint was malformed or too large for its target type.
    InvalidVarint,
    /// A count, length or offset does not fit the input.
    OutOfBounds,
    /// A string was not UTF-8.
    InvalidUtf8,
    /// The container was written by an incompatible format version.
    UnsupportedVersion {
        /// Major version found in the header.
        major: u16,
        /// Minor version found in the header.
        minor: u16,
    },
    /// The container does not start with the expected magic bytes.
    BadMagic,
    /// The container holds a section this version does not know.
    UnknownSectionTag {
        /// Tag byte of the section.
        tag: u8,
    },
    /// A section appeared twice.
    DuplicateSection {
        /// Tag byte of the section.
        tag: u8,
    },
    /// A section is absent.
    MissingSection {
        /// Tag byte of the section.
        tag: u8,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => f.write_str("input ended early"),
            Self::InvalidVarint => f.write_str("malformed varint"),
            Self::OutOfBounds => f.write_str("length or offset out of range"),
            Self::InvalidUtf8 => f.write_str("string is not UTF-8"),
            Self::UnsupportedVersion { major, minor } => {
                write!(f, "container version {major}.{minor} is not supported")
            }
            Self::BadMagic => f.write_str("not an abgolf container"),
            Self::UnknownSectionTag { tag } => write!(f, "section tag {tag} is unknown"),
            Self::DuplicateSection { tag } => write!(f, "section {tag} appears twice"),
            Self::MissingSection { tag } => write!(f, "section {tag} is missing"),
        }
    }
}

impl core::error::Error for DecodeError {}

/// Forward-only cursor over a byte slice.
///
/// Fixed-size reads that fail leave the cursor in place, so a caller can report how many bytes
/// were left.
#[derive(Clone, Debug)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Starts reading at the first byte of `bytes`.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Position of the next unread byte.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Number of bytes not yet read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    /// `true` when nothing is left to read.
    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.remaining() == 0
    }

    /// Succeeds only if the whole input was consumed; trailing bytes are
    /// [`DecodeError::OutOfBounds`].
    pub fn finish(&self) -> Result<(), DecodeError> {
        if self.is_at_end() {
            Ok(())
        } else {
            Err(DecodeError::OutOfBounds)
        }
    }

    fn advance(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let rest = self.bytes.get(self.pos..).unwrap_or_default();
        if rest.len() < n {
            return Err(DecodeError::UnexpectedEof);
        }
        self.pos += n;
        Ok(&rest[..n])
    }

    /// One byte.
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let [b] = self.read_array::<1>()?;
        Ok(b)
    }

    /// Two bytes, little-endian.
    pub fn read_u16_le(&mut self) -> Result<u16, DecodeError> {
        self.read_array().map(u16::from_le_bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0_u8; N];
        out.copy_from_slice(self.advance(N)?);
        Ok(out)
    }

    /// An unsigned varint.
    pub fn read_uleb128_u64(&mut self) -> Result<u64, DecodeError> {
        read_uleb128_u64(self.bytes, &mut self.pos)
    }

    /// An unsigned varint that must fit `usize` (counts, lengths and offsets).
    pub fn read_uleb128_usize(&mut self) -> Result<usize, DecodeError> {
        usize::try_from(self.read_uleb128_u64()?).map_err(|_| DecodeError::OutOfBounds)
    }

    /// A signed varint.
    pub fn read_sleb128_i64(&mut self) -> Result<i64, DecodeError> {
        read_sleb128_i64(self.bytes, &mut self.pos)
    }

    /// Exactly `len` bytes, borrowed from the input.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        self.advance(len)
    }

    /// A length-prefixed byte blob.
    pub fn read_prefixed_bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.read_uleb128_usize()?;
        self.advance(len)
    }

    /// A length-prefixed UTF-8 string.
    pub fn read_prefixed_str(&mut self) -> Result<&'a str, DecodeError> {
        let raw = self.read_prefixed_bytes()?;
        core::str::from_utf8(raw).map_err(|_| DecodeError::InvalidUtf8)
    }
}

/// Growable output buffer mirroring [`Reader`].
#[derive(Clone, Debug, Default)]
pub struct Writer {
    out: Vec<u8>,
}

impl Writer {
    /// An empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written so far.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.out
    }

    /// Takes the written bytes.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.out
    }

    /// One byte.
    pub fn write_u8(&mut self, v: u8) {
        self.out.push(v);
    }

    /// Two bytes, little-endian.
    pub fn write_u16_le(&mut self, v: u16) {
        self.out.extend_from_slice(&v.to_le_bytes());
    }

    /// An unsigned varint.
    pub fn write_uleb128_u64(&mut self, v: u64) {
        write_uleb128_u64(&mut self.out, v);
    }

    /// A count, length or offset as an unsigned varint.
    pub fn write_uleb128_usize(&mut self, v: usize) {
        self.write_uleb128_u64(v as u64);
    }

    /// A signed varint.
    pub fn write_sleb128_i64(&mut self, v: i64) {
        write_sleb128_i64(&mut self.out, v);
    }

    /// Raw bytes with no prefix.
    pub fn write_bytes(&mut self, b: &[u8]) {
        self.out.extend_from_slice(b);
    }

    /// A length-prefixed byte blob.
    pub fn write_prefixed_bytes(&mut self, b: &[u8]) {
        self.write_uleb128_usize(b.len());
        self.write_bytes(b);
    }

    /// A length-prefixed UTF-8 string.
    pub fn write_prefixed_str(&mut self, s: &str) {
        self.write_prefixed_bytes(s.as_bytes());
    }
}
