// Copyright 2026 the ABGolf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The result of a parse.

use crate::program::ValueType;
use crate::registry::FunctionDescriptor;

/// How a parse ended.
///
/// Exactly one variant describes a finished parse. The first error in a left-to-right scan wins:
/// decode errors (`InvalidFunction`, `OutOfBytes`) are reported before any invariant is checked,
/// and at a single step a dimension violation is reported before a type violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseOutcome<'r> {
    /// Every byte decoded and every step satisfied its function's constraints.
    Success,
    /// No function is registered for the byte at `pc`.
    InvalidFunction {
        /// Byte offset of the unknown opcode.
        pc: usize,
        /// The unknown opcode byte.
        opcode: u8,
    },
    /// The function at `pc` needs more parameter bytes than remain.
    OutOfBytes {
        /// Byte offset of the opcode.
        pc: usize,
        /// The function whose parameters are missing.
        function: &'r FunctionDescriptor,
        /// Number of bytes remaining after the opcode.
        bytes_given: usize,
    },
    /// A step received a dimension its function does not accept.
    InvalidDimension {
        /// Index of the offending step (the sentinel is step 0).
        step: usize,
        /// Byte offset of the step's opcode.
        pc: usize,
        /// The function that rejected the dimension.
        function: &'r FunctionDescriptor,
        /// The dimension produced by the previous step.
        actual: i64,
    },
    /// A step received a type its function does not accept.
    InvalidType {
        /// Index of the offending step (the sentinel is step 0).
        step: usize,
        /// Byte offset of the step's opcode.
        pc: usize,
        /// The function that rejected the type.
        function: &'r FunctionDescriptor,
        /// The type produced by the previous step.
        actual: ValueType,
    },
}

impl<'r> ParseOutcome<'r> {
    /// Returns `true` for [`ParseOutcome::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns `true` for the decode-phase failures.
    #[must_use]
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Self::InvalidFunction { .. } | Self::OutOfBytes { .. })
    }

    /// Returns the byte offset of the failure, if any.
    #[must_use]
    pub fn pc(&self) -> Option<usize> {
        match self {
            Self::Success => None,
            Self::InvalidFunction { pc, .. }
            | Self::OutOfBytes { pc, .. }
            | Self::InvalidDimension { pc, .. }
            | Self::InvalidType { pc, .. } => Some(*pc),
        }
    }

    /// Returns the opcode involved in the failure, if any.
    #[must_use]
    pub fn opcode(&self) -> Option<u8> {
        match self {
            Self::Success => None,
            Self::InvalidFunction { opcode, .. } => Some(*opcode),
            Self::OutOfBytes { function, .. }
            | Self::InvalidDimension { function, .. }
            | Self::InvalidType { function, .. } => Some(function.opcode),
        }
    }

    /// Returns the function involved in the failure, if it is registered.
    #[must_use]
    pub fn function(&self) -> Option<&'r FunctionDescriptor> {
        match self {
            Self::Success | Self::InvalidFunction { .. } => None,
            Self::OutOfBytes { function, .. }
            | Self::InvalidDimension { function, .. }
            | Self::InvalidType { function, .. } => Some(*function),
        }
    }
}
