// Copyright 2026 the ABGolf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared fixtures for the `abgolf` conformance suite.

use abgolf::program::{TypeSet, ValueType};
use abgolf::registry::{
    DimensionPolicy, FunctionCatalog, FunctionDescriptor, FunctionRegistry, OutputTypes,
};

/// Opcode of a function taking three parameter bytes.
pub const WIDE: u8 = 0x60;
/// Opcode of a function accepting only dimension 1.
pub const ONLY_ONE: u8 = 0x61;
/// Opcode of a function accepting only numeric input.
pub const NUMERIC: u8 = 0x62;
/// Opcode of a function that increments the dimension.
pub const UP: u8 = 0x63;
/// Opcode of a function that decrements the dimension and forces an integer result.
pub const COUNT: u8 = 0x64;

/// The builtins plus a handful of functions exercising every descriptor feature.
#[must_use]
pub fn extended_registry() -> FunctionRegistry {
    let mut cat = FunctionCatalog::with_builtins();
    let extra = [
        FunctionDescriptor::new("wide", WIDE, 3, DimensionPolicy::Any),
        FunctionDescriptor::new("only_one", ONLY_ONE, 0, DimensionPolicy::specific([1])),
        FunctionDescriptor::new("numeric", NUMERIC, 0, DimensionPolicy::Any)
            .with_input_types(TypeSet::of(ValueType::Integer).with(ValueType::Real)),
        FunctionDescriptor::new("up", UP, 0, DimensionPolicy::Increase).with_output_types(
            OutputTypes::Candidates(TypeSet::of(ValueType::Text).with(ValueType::Real)),
        ),
        FunctionDescriptor::new("count", COUNT, 0, DimensionPolicy::Decrease)
            .with_output_types(OutputTypes::Forced(ValueType::Integer)),
    ];
    for descriptor in extra {
        if let Err(e) = cat.register(descriptor) {
            panic!("fixture registry is inconsistent: {e}");
        }
    }
    cat.build()
}

/// A registry holding a single function, for isolating one constraint.
#[must_use]
pub fn single(descriptor: FunctionDescriptor) -> FunctionRegistry {
    let mut cat = FunctionCatalog::new();
    if let Err(e) = cat.register(descriptor) {
        panic!("single-function registry rejected its function: {e}");
    }
    cat.build()
}
