// Copyright 2026 the ABGolf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Decoded programs and the value types threaded through them.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use crate::registry::FunctionDescriptor;

/// The coarse kind of value flowing between steps.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ValueType {
    /// A string.
    Text = 0,
    /// An integer.
    Integer = 1,
    /// A floating-point number.
    Real = 2,
}

impl ValueType {
    /// Every value type, in declaration order.
    pub const ALL: [Self; 3] = [Self::Text, Self::Integer, Self::Real];

    /// Returns the canonical name, as persisted.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Real => "real",
        }
    }

    /// Parses a canonical name.
    pub fn from_name(name: &str) -> Result<Self, UnknownTypeName> {
        match name {
            "text" => Ok(Self::Text),
            "integer" => Ok(Self::Integer),
            "real" => Ok(Self::Real),
            _ => Err(UnknownTypeName),
        }
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValueType {
    type Err = UnknownTypeName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// A type name did not match any [`ValueType`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UnknownTypeName;

impl fmt::Display for UnknownTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown type name")
    }
}

impl core::error::Error for UnknownTypeName {}

/// A set of [`ValueType`]s.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct TypeSet(u8);

impl TypeSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Every type.
    pub const ALL: Self = Self(0b111);

    /// A set holding only `ty`.
    #[must_use]
    pub const fn of(ty: ValueType) -> Self {
        Self(ty.bit())
    }

    /// Returns this set with `ty` added.
    #[must_use]
    pub const fn with(self, ty: ValueType) -> Self {
        Self(self.0 | ty.bit())
    }

    /// Returns `true` if `ty` is in the set.
    #[must_use]
    pub const fn contains(self, ty: ValueType) -> bool {
        self.0 & ty.bit() != 0
    }

    /// Returns the number of types in the set.
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns the only member, if the set has exactly one.
    #[must_use]
    pub fn single(self) -> Option<ValueType> {
        if self.len() == 1 {
            self.iter().next()
        } else {
            None
        }
    }

    /// Iterates members in declaration order.
    pub fn iter(self) -> impl Iterator<Item = ValueType> {
        ValueType::ALL.into_iter().filter(move |&t| self.contains(t))
    }
}

impl FromIterator<ValueType> for TypeSet {
    fn from_iter<I: IntoIterator<Item = ValueType>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl fmt::Debug for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, ty) in self.iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{ty}")?;
        }
        f.write_str("}")
    }
}

/// The dimension and type after a step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StepState {
    /// Threaded dimension.
    pub dimension: i64,
    /// Threaded value type.
    pub ty: ValueType,
}

impl StepState {
    /// The state of the program input, before any instruction runs.
    pub const INPUT: Self = Self {
        dimension: 0,
        ty: ValueType::Text,
    };
}

/// One decoded instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step<'r> {
    /// The function, or `None` for the input sentinel at index 0.
    pub function: Option<&'r FunctionDescriptor>,
    /// Byte offset of the opcode (0 for the sentinel).
    pub pc: usize,
    /// Immediate parameter bytes, exactly `function.param_count` of them.
    pub params: Vec<u8>,
    /// State after this step, once propagation has reached it.
    pub state: Option<StepState>,
}

impl<'r> Step<'r> {
    pub(crate) fn sentinel() -> Self {
        Self {
            function: None,
            pc: 0,
            params: Vec::new(),
            state: Some(StepState::INPUT),
        }
    }

    pub(crate) fn decoded(function: &'r FunctionDescriptor, pc: usize, params: &[u8]) -> Self {
        Self {
            function: Some(function),
            pc,
            params: params.to_vec(),
            state: None,
        }
    }

    /// Returns `true` for the input sentinel.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.function.is_none()
    }

    /// Returns the number of bytes this step occupies in the program (0 for the sentinel).
    #[must_use]
    pub fn byte_len(&self) -> usize {
        if self.is_sentinel() {
            0
        } else {
            1 + self.params.len()
        }
    }
}

/// A decoded program: the raw bytes plus the steps decoded from them, sentinel first.
///
/// A program produced by a failed parse holds only the steps before the failure, and states only
/// for the steps propagation reached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program<'r> {
    bytes: Vec<u8>,
    pub(crate) steps: Vec<Step<'r>>,
}

impl<'r> Program<'r> {
    pub(crate) fn new(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            steps: vec![Step::sentinel()],
        }
    }

    pub(crate) fn from_parts(bytes: Vec<u8>, steps: Vec<Step<'r>>) -> Self {
        Self { bytes, steps }
    }

    /// Returns the raw program bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns all steps, sentinel first.
    #[must_use]
    pub fn steps(&self) -> &[Step<'r>] {
        &self.steps
    }

    /// Iterates the decoded instructions, skipping the sentinel.
    pub fn instructions(&self) -> impl Iterator<Item = &Step<'r>> {
        self.steps.iter().skip(1)
    }

    /// Returns the number of decoded instructions (not counting the sentinel).
    #[must_use]
    pub fn instruction_count(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    /// Returns the states computed so far, in step order.
    pub fn states(&self) -> impl Iterator<Item = StepState> + '_ {
        self.steps.iter().map_while(|s| s.state)
    }

    /// Returns the dimension trace.
    #[must_use]
    pub fn dimensions(&self) -> Vec<i64> {
        self.states().map(|s| s.dimension).collect()
    }

    /// Returns the type trace.
    #[must_use]
    pub fn types(&self) -> Vec<ValueType> {
        self.states().map(|s| s.ty).collect()
    }

    /// Returns `true` if every step has a computed state.
    #[must_use]
    pub fn is_fully_propagated(&self) -> bool {
        self.steps.iter().all(|s| s.state.is_some())
    }
}
