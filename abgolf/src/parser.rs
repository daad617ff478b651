// Copyright 2026 the ABGolf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The two-phase parser entry points.

use crate::bytecode::decode_traced;
use crate::outcome::ParseOutcome;
use crate::program::Program;
use crate::registry::FunctionRegistry;
use crate::trace::{ParseSink, Tracer};
use crate::verifier::propagate_traced;

/// A finished parse: the (possibly partial) program and how the parse ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parsed<'r> {
    /// The decoded steps and whatever states were computed.
    pub program: Program<'r>,
    /// How the parse ended.
    pub outcome: ParseOutcome<'r>,
}

impl Parsed<'_> {
    /// Returns `true` if the parse succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Parses `bytes` against `registry`.
///
/// Decodes first; propagation runs only if decoding consumed every byte. The result depends on
/// nothing but the inputs, so parsing the same bytes twice gives equal results.
///
/// # Example
/// ```
/// use abgolf::outcome::ParseOutcome;
/// use abgolf::parser::parse;
/// use abgolf::registry::FunctionRegistry;
///
/// let registry = FunctionRegistry::builtin();
/// let parsed = parse(b"PQxS", &registry);
/// assert_eq!(parsed.outcome, ParseOutcome::Success);
/// assert_eq!(parsed.program.dimensions(), [0, 0, 0, 0]);
/// ```
#[must_use]
pub fn parse<'r>(bytes: &[u8], registry: &'r FunctionRegistry) -> Parsed<'r> {
    run(bytes, registry, Tracer::none())
}

/// Like [`parse`], but reports decode, propagation and outcome events to `sink`.
pub fn parse_traced<'r>(
    bytes: &[u8],
    registry: &'r FunctionRegistry,
    sink: &mut dyn ParseSink,
) -> Parsed<'r> {
    run(bytes, registry, Tracer::new(sink))
}

fn run<'r>(bytes: &[u8], registry: &'r FunctionRegistry, mut tracer: Tracer<'_>) -> Parsed<'r> {
    let (mut program, decode_error) = decode_traced(bytes, registry, &mut tracer);
    let outcome = match decode_error {
        Some(err) => err,
        None => propagate_traced(&mut program, &mut tracer),
    };
    tracer.outcome(&outcome);
    Parsed { program, outcome }
}
