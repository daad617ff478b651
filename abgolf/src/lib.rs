// Copyright 2026 the ABGolf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `abgolf`: parser and static checker for ABGolf byte programs.
//!
//! An ABGolf program is a flat byte string. Each byte is either an opcode naming a registered
//! function or one of the immediate parameter bytes that follow it. Parsing runs in two phases:
//!
//! 1. [`bytecode::decode`] splits the bytes into steps using the [`registry::FunctionRegistry`].
//! 2. [`verifier::propagate`] threads a dimension and a value type through the steps, checking
//!    each function's declared constraints.
//!
//! [`parser::parse`] runs both and returns a [`parser::Parsed`] holding the (possibly partial)
//! program and a [`outcome::ParseOutcome`]. Parsed results can be persisted with
//! [`parser::Parsed::encode`] and loaded back with [`parser::Parsed::decode`].
//!
//! ## Example
//!
//! ```
//! use abgolf::outcome::ParseOutcome;
//! use abgolf::parser::parse;
//! use abgolf::program::{TypeSet, ValueType};
//! use abgolf::registry::{DimensionPolicy, FunctionCatalog, FunctionDescriptor};
//!
//! let mut catalog = FunctionCatalog::with_builtins();
//! catalog.register(
//!     FunctionDescriptor::new("sum", 0xe4, 0, DimensionPolicy::Decrease)
//!         .with_input_types(TypeSet::of(ValueType::Integer).with(ValueType::Real)),
//! )?;
//! let registry = catalog.build();
//!
//! // `sum` cannot take the text input.
//! let parsed = parse(&[0x50, 0xe4], &registry);
//! assert!(matches!(
//!     parsed.outcome,
//!     ParseOutcome::InvalidType { step: 2, pc: 1, actual: ValueType::Text, .. }
//! ));
//! assert_eq!(
//!     parsed.outcome.to_string(),
//!     "invalid type text for function 0xe4 'sum' (Σ) at byte 1 (step 2)\n\
//!      accepted types: {integer, real}"
//! );
//! # Ok::<(), abgolf::registry::RegistryError>(())
//! ```

#![no_std]

extern crate alloc;

pub mod bytecode;
pub mod container;
pub mod cp437;
pub mod diagnostics;
pub mod format;
pub mod outcome;
pub mod parser;
pub mod program;
pub mod registry;
pub mod trace;
pub mod verifier;
