// Copyright 2026 the ABGolf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Function registry: the table mapping opcode bytes to function descriptors.
//!
//! Descriptors are collected into a [`FunctionCatalog`] during start-up. Duplicate opcodes (and
//! duplicate names) are rejected as soon as they are registered, so a misconfigured table never
//! reaches a parse. [`FunctionCatalog::build`] then freezes the table into a [`FunctionRegistry`],
//! which has no mutating API and can be shared by reference across any number of parses.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::String;
use core::fmt;

use crate::program::{StepState, TypeSet, ValueType};

/// How a function constrains and transforms the threaded dimension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DimensionPolicy {
    /// Accepts any dimension and passes it through.
    Any,
    /// Accepts only the listed dimensions and passes the dimension through.
    Specific(BTreeSet<i64>),
    /// Accepts any dimension and increments it.
    Increase,
    /// Accepts any dimension and decrements it. There is no lower bound.
    Decrease,
}

impl DimensionPolicy {
    /// Builds a [`DimensionPolicy::Specific`] policy from a list of accepted dimensions.
    pub fn specific(dims: impl IntoIterator<Item = i64>) -> Self {
        Self::Specific(dims.into_iter().collect())
    }

    /// Returns the accepted input dimensions, or `None` when any dimension is accepted.
    #[must_use]
    pub fn accepted(&self) -> Option<&BTreeSet<i64>> {
        match self {
            Self::Specific(dims) => Some(dims),
            Self::Any | Self::Increase | Self::Decrease => None,
        }
    }

    /// Computes the output dimension for input dimension `prev`.
    ///
    /// Returns `None` if `prev` is not accepted.
    #[must_use]
    pub fn apply(&self, prev: i64) -> Option<i64> {
        match self {
            Self::Any => Some(prev),
            Self::Specific(dims) => dims.contains(&prev).then_some(prev),
            Self::Increase => Some(prev.saturating_add(1)),
            Self::Decrease => Some(prev.saturating_sub(1)),
        }
    }
}

/// What type a function produces.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum OutputTypes {
    /// No declared output: the previous type passes through.
    #[default]
    PassThrough,
    /// Always produces this type.
    Forced(ValueType),
    /// Declares several candidate types.
    ///
    /// No candidate is selected: the previous type passes through unchanged. The set must hold at
    /// least two types; [`FunctionCatalog::register`] rejects anything smaller.
    Candidates(TypeSet),
}

impl OutputTypes {
    /// Builds output types from an optional declared set.
    ///
    /// A single declared type is forced, two or more are a candidate list, and an empty set
    /// declares nothing.
    #[must_use]
    pub fn from_declared(declared: Option<TypeSet>) -> Self {
        match declared {
            None => Self::PassThrough,
            Some(set) if set.is_empty() => Self::PassThrough,
            Some(set) => match set.single() {
                Some(ty) => Self::Forced(ty),
                None => Self::Candidates(set),
            },
        }
    }

    /// Returns `false` for a candidate list of fewer than two types.
    #[must_use]
    pub fn is_well_formed(self) -> bool {
        match self {
            Self::PassThrough | Self::Forced(_) => true,
            Self::Candidates(set) => set.len() >= 2,
        }
    }

    /// Returns the declared set, or `None` for [`OutputTypes::PassThrough`].
    #[must_use]
    pub fn declared(self) -> Option<TypeSet> {
        match self {
            Self::PassThrough => None,
            Self::Forced(ty) => Some(TypeSet::of(ty)),
            Self::Candidates(set) => Some(set),
        }
    }

    /// Computes the output type for input type `prev`.
    #[must_use]
    pub fn apply(self, prev: ValueType) -> ValueType {
        match self {
            Self::Forced(ty) => ty,
            Self::PassThrough | Self::Candidates(_) => prev,
        }
    }
}

/// A rejected input state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    /// The incoming dimension is not accepted.
    Dimension(i64),
    /// The incoming type is not accepted.
    Type(ValueType),
}

/// A registered function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionDescriptor {
    /// Identifier used in listings and persisted programs.
    pub name: String,
    /// Opcode byte; unique within a registry.
    pub opcode: u8,
    /// Number of immediate parameter bytes following the opcode.
    pub param_count: usize,
    /// Dimension constraint and transform.
    pub dimension: DimensionPolicy,
    /// Accepted input types; `None` accepts any type.
    pub input_types: Option<TypeSet>,
    /// Output type behaviour.
    pub output_types: OutputTypes,
}

impl FunctionDescriptor {
    /// Creates a descriptor that accepts any input type and passes the type through.
    pub fn new(
        name: impl Into<String>,
        opcode: u8,
        param_count: usize,
        dimension: DimensionPolicy,
    ) -> Self {
        Self {
            name: name.into(),
            opcode,
            param_count,
            dimension,
            input_types: None,
            output_types: OutputTypes::PassThrough,
        }
    }

    /// Restricts the accepted input types.
    #[must_use]
    pub fn with_input_types(mut self, types: TypeSet) -> Self {
        self.input_types = Some(types);
        self
    }

    /// Sets the output type behaviour.
    #[must_use]
    pub fn with_output_types(mut self, output: OutputTypes) -> Self {
        self.output_types = output;
        self
    }

    /// Computes the state after this function, given the state before it.
    ///
    /// The dimension is checked before the type, so an input that violates both reports
    /// [`Violation::Dimension`].
    pub fn apply(&self, prev: StepState) -> Result<StepState, Violation> {
        let dimension = self
            .dimension
            .apply(prev.dimension)
            .ok_or(Violation::Dimension(prev.dimension))?;
        if self.input_types.is_some_and(|accepted| !accepted.contains(prev.ty)) {
            return Err(Violation::Type(prev.ty));
        }
        Ok(StepState {
            dimension,
            ty: self.output_types.apply(prev.ty),
        })
    }
}

/// Errors when registering functions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// The opcode is already taken.
    DuplicateOpcode {
        /// The contested opcode byte.
        opcode: u8,
        /// Name of the function already registered under `opcode`.
        existing: String,
        /// Name of the rejected function.
        rejected: String,
    },
    /// The name is already taken by a function with a different opcode.
    DuplicateName {
        /// The contested name.
        name: String,
    },
    /// The function lists fewer than two candidate output types.
    DegenerateCandidates {
        /// Name of the rejected function.
        name: String,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateOpcode {
                opcode,
                existing,
                rejected,
            } => write!(
                f,
                "duplicate opcode {opcode:#04x}: '{existing}' and '{rejected}'"
            ),
            Self::DuplicateName { name } => write!(f, "duplicate function name '{name}'"),
            Self::DegenerateCandidates { name } => write!(
                f,
                "function '{name}' needs at least two candidate output types"
            ),
        }
    }
}

impl core::error::Error for RegistryError {}

/// A collection of functions being assembled into a [`FunctionRegistry`].
///
/// # Example
/// ```
/// use abgolf::program::{TypeSet, ValueType};
/// use abgolf::registry::{DimensionPolicy, FunctionCatalog, FunctionDescriptor};
///
/// let mut cat = FunctionCatalog::new();
/// cat.register(FunctionDescriptor::new("pass", 0x50, 0, DimensionPolicy::Any))
///     .unwrap();
/// cat.register(
///     FunctionDescriptor::new("types", 0x53, 0, DimensionPolicy::Any)
///         .with_input_types(TypeSet::of(ValueType::Text)),
/// )
/// .unwrap();
///
/// // A second function on an occupied opcode is rejected up front.
/// assert!(cat
///     .register(FunctionDescriptor::new("again", 0x50, 0, DimensionPolicy::Any))
///     .is_err());
///
/// let registry = cat.build();
/// assert_eq!(registry.lookup(0x53).map(|f| f.name.as_str()), Some("types"));
/// assert!(registry.lookup(0xff).is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct FunctionCatalog {
    by_opcode: BTreeMap<u8, FunctionDescriptor>,
    by_name: BTreeMap<String, u8>,
}

impl FunctionCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog pre-populated with [`FunctionRegistry::builtin`]'s functions.
    #[must_use]
    pub fn with_builtins() -> Self {
        let by_opcode: BTreeMap<u8, FunctionDescriptor> = builtin_descriptors()
            .into_iter()
            .map(|d| (d.opcode, d))
            .collect();
        let by_name = by_opcode
            .values()
            .map(|d| (d.name.clone(), d.opcode))
            .collect();
        Self { by_opcode, by_name }
    }

    /// Register a function.
    pub fn register(&mut self, descriptor: FunctionDescriptor) -> Result<(), RegistryError> {
        if !descriptor.output_types.is_well_formed() {
            return Err(RegistryError::DegenerateCandidates {
                name: descriptor.name,
            });
        }
        if let Some(existing) = self.by_opcode.get(&descriptor.opcode) {
            return Err(RegistryError::DuplicateOpcode {
                opcode: descriptor.opcode,
                existing: existing.name.clone(),
                rejected: descriptor.name,
            });
        }
        if self.by_name.contains_key(&descriptor.name) {
            return Err(RegistryError::DuplicateName {
                name: descriptor.name,
            });
        }
        self.by_name
            .insert(descriptor.name.clone(), descriptor.opcode);
        self.by_opcode.insert(descriptor.opcode, descriptor);
        Ok(())
    }

    /// Register several functions, stopping at the first rejected one.
    pub fn register_all<I: IntoIterator<Item = FunctionDescriptor>>(
        &mut self,
        iter: I,
    ) -> Result<(), RegistryError> {
        for descriptor in iter {
            self.register(descriptor)?;
        }
        Ok(())
    }

    /// Returns the number of registered functions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_opcode.len()
    }

    /// Returns `true` if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_opcode.is_empty()
    }

    /// Freeze the catalog.
    #[must_use]
    pub fn build(self) -> FunctionRegistry {
        FunctionRegistry {
            by_opcode: self.by_opcode,
            by_name: self.by_name,
        }
    }
}

/// Read-only opcode table used by the parser.
#[derive(Clone, Debug, Default)]
pub struct FunctionRegistry {
    by_opcode: BTreeMap<u8, FunctionDescriptor>,
    by_name: BTreeMap<String, u8>,
}

impl FunctionRegistry {
    /// The registry of built-in functions.
    ///
    /// | name     | opcode | params | dimension       | input types |
    /// |----------|--------|--------|-----------------|-------------|
    /// | `pass`   | `0x50` | 0      | any             | any         |
    /// | `params` | `0x51` | 1      | any             | any         |
    /// | `dims`   | `0x52` | 0      | specific `{0}`  | any         |
    /// | `types`  | `0x53` | 0      | any             | text        |
    #[must_use]
    pub fn builtin() -> Self {
        FunctionCatalog::with_builtins().build()
    }

    /// Look up a function by opcode.
    #[must_use]
    pub fn lookup(&self, opcode: u8) -> Option<&FunctionDescriptor> {
        self.by_opcode.get(&opcode)
    }

    /// Look up a function by name.
    #[must_use]
    pub fn lookup_name(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.by_name
            .get(name)
            .and_then(|opcode| self.by_opcode.get(opcode))
    }

    /// Iterate over all functions in opcode order.
    pub fn iter(&self) -> impl Iterator<Item = &FunctionDescriptor> {
        self.by_opcode.values()
    }

    /// Returns the number of registered functions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_opcode.len()
    }

    /// Returns `true` if the registry has no functions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_opcode.is_empty()
    }
}

fn builtin_descriptors() -> [FunctionDescriptor; 4] {
    [
        FunctionDescriptor::new("pass", 0x50, 0, DimensionPolicy::Any),
        FunctionDescriptor::new("params", 0x51, 1, DimensionPolicy::Any),
        FunctionDescriptor::new("dims", 0x52, 0, DimensionPolicy::specific([0])),
        FunctionDescriptor::new("types", 0x53, 0, DimensionPolicy::Any)
            .with_input_types(TypeSet::of(ValueType::Text)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(dimension: i64, ty: ValueType) -> StepState {
        StepState { dimension, ty }
    }

    #[test]
    fn register_rejects_duplicate_opcode() {
        let mut cat = FunctionCatalog::new();
        cat.register(FunctionDescriptor::new("a", 0x60, 0, DimensionPolicy::Any))
            .unwrap();
        let err = cat
            .register(FunctionDescriptor::new("b", 0x60, 2, DimensionPolicy::Increase))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateOpcode {
                opcode: 0x60,
                existing: "a".into(),
                rejected: "b".into(),
            }
        );
        assert_eq!(cat.len(), 1);
    }

    #[test]
    fn register_rejects_duplicate_name() {
        let mut cat = FunctionCatalog::new();
        cat.register(FunctionDescriptor::new("a", 0x60, 0, DimensionPolicy::Any))
            .unwrap();
        assert_eq!(
            cat.register(FunctionDescriptor::new("a", 0x61, 0, DimensionPolicy::Any)),
            Err(RegistryError::DuplicateName { name: "a".into() })
        );
    }

    #[test]
    fn builtin_table() {
        let reg = FunctionRegistry::builtin();
        assert_eq!(reg.len(), 4);
        let names: alloc::vec::Vec<&str> = reg.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["pass", "params", "dims", "types"]);
        assert_eq!(reg.lookup(0x51).map(|f| f.param_count), Some(1));
        assert_eq!(reg.lookup_name("dims").map(|f| f.opcode), Some(0x52));
        assert!(reg.lookup_name("nope").is_none());
        assert!(reg.lookup(0xff).is_none());
    }

    #[test]
    fn builtin_table_registers_cleanly() {
        let mut cat = FunctionCatalog::new();
        assert_eq!(cat.register_all(builtin_descriptors()), Ok(()));
        let direct = FunctionCatalog::with_builtins();
        assert_eq!(cat.by_opcode, direct.by_opcode);
        assert_eq!(cat.by_name, direct.by_name);
    }

    #[test]
    fn register_rejects_degenerate_candidates() {
        let mut cat = FunctionCatalog::new();
        for set in [TypeSet::EMPTY, TypeSet::of(ValueType::Real)] {
            assert_eq!(
                cat.register(
                    FunctionDescriptor::new("odd", 0x60, 0, DimensionPolicy::Any)
                        .with_output_types(OutputTypes::Candidates(set)),
                ),
                Err(RegistryError::DegenerateCandidates { name: "odd".into() })
            );
        }
        assert!(cat.is_empty());
    }

    #[test]
    fn builtins_can_be_extended() {
        let mut cat = FunctionCatalog::with_builtins();
        cat.register(FunctionDescriptor::new("up", 0x60, 0, DimensionPolicy::Increase))
            .unwrap();
        assert!(
            cat.register(FunctionDescriptor::new("pass", 0x61, 0, DimensionPolicy::Any))
                .is_err()
        );
        assert_eq!(cat.build().len(), 5);
    }

    #[test]
    fn dimension_policies() {
        assert_eq!(DimensionPolicy::Any.apply(3), Some(3));
        assert_eq!(DimensionPolicy::Increase.apply(3), Some(4));
        assert_eq!(DimensionPolicy::Decrease.apply(0), Some(-1));
        let only_zero_one = DimensionPolicy::specific([0, 1]);
        assert_eq!(only_zero_one.apply(1), Some(1));
        assert_eq!(only_zero_one.apply(2), None);
        assert_eq!(only_zero_one.accepted().map(BTreeSet::len), Some(2));
        assert!(DimensionPolicy::Increase.accepted().is_none());
    }

    #[test]
    fn output_types_from_declared() {
        assert_eq!(OutputTypes::from_declared(None), OutputTypes::PassThrough);
        assert_eq!(
            OutputTypes::from_declared(Some(TypeSet::EMPTY)),
            OutputTypes::PassThrough
        );
        assert_eq!(
            OutputTypes::from_declared(Some(TypeSet::of(ValueType::Real))),
            OutputTypes::Forced(ValueType::Real)
        );
        let two = TypeSet::of(ValueType::Real).with(ValueType::Integer);
        assert_eq!(
            OutputTypes::from_declared(Some(two)),
            OutputTypes::Candidates(two)
        );
        assert_eq!(OutputTypes::Candidates(two).apply(ValueType::Text), ValueType::Text);
        assert!(OutputTypes::Candidates(two).is_well_formed());
        assert!(!OutputTypes::Candidates(TypeSet::of(ValueType::Real)).is_well_formed());
        assert_eq!(OutputTypes::Forced(ValueType::Real).apply(ValueType::Text), ValueType::Real);
    }

    #[test]
    fn apply_checks_dimension_before_type() {
        let f = FunctionDescriptor::new("strict", 0x60, 0, DimensionPolicy::specific([1]))
            .with_input_types(TypeSet::of(ValueType::Integer));
        assert_eq!(
            f.apply(state(0, ValueType::Text)),
            Err(Violation::Dimension(0))
        );
        assert_eq!(
            f.apply(state(1, ValueType::Text)),
            Err(Violation::Type(ValueType::Text))
        );
        assert_eq!(
            f.apply(state(1, ValueType::Integer)),
            Ok(state(1, ValueType::Integer))
        );
    }

    #[test]
    fn apply_forces_output_type() {
        let f = FunctionDescriptor::new("len", 0x60, 0, DimensionPolicy::Decrease)
            .with_output_types(OutputTypes::Forced(ValueType::Integer));
        assert_eq!(
            f.apply(state(0, ValueType::Text)),
            Ok(state(-1, ValueType::Integer))
        );
    }

    #[test]
    fn registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FunctionRegistry>();
    }
}
