// Copyright 2026 the ABGolf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(missing_docs, reason = "integration test crate")]

use abgolf::bytecode::decode;
use abgolf::container::LoadError;
use abgolf::diagnostics::render_outcome;
use abgolf::outcome::ParseOutcome;
use abgolf::parser::{Parsed, parse};
use abgolf::program::{TypeSet, ValueType};
use abgolf::registry::{DimensionPolicy, FunctionDescriptor, FunctionRegistry};
use abgolf::verifier::propagate;
use abgolf_conformance::{COUNT, NUMERIC, ONLY_ONE, UP, WIDE, extended_registry, single};
use proptest::prelude::*;

#[test]
fn golden_single_pass_container_v0_1() {
    let reg = FunctionRegistry::builtin();
    let bytes = parse(&[0x50], &reg).encode();

    // Locks in the container encoding as a regression signal for format changes.
    let expected: &[u8] = &[
        // magic "ABGOLF\0\0"
        0x41, 0x42, 0x47, 0x4f, 0x4c, 0x46, 0x00, 0x00, //
        // version 0.1
        0x00, 0x00, 0x01, 0x00, //
        // bytes: tag=1, len=1
        0x01, 0x01, 0x50, //
        // steps: tag=2, len=13, count=1, pc=0, "pass", opcode, params=0, any, no input, passthrough,
        // no param bytes
        0x02, 0x0d, 0x01, 0x00, 0x04, b'p', b'a', b's', b's', 0x50, 0x00, 0x00, 0x00, 0x00, 0x00,
        // trace: tag=3, len=13, count=2, (0, "text") twice
        0x03, 0x0d, 0x02, 0x00, 0x04, b't', b'e', b'x', b't', 0x00, 0x04, b't', b'e', b'x', b't',
        // outcome: tag=4, len=1, success
        0x04, 0x01, 0x00,
    ];
    assert_eq!(bytes, expected);
    assert_eq!(Parsed::decode(expected, &reg), Ok(parse(&[0x50], &reg)));
}

#[test]
fn scenario_pass() {
    let reg = FunctionRegistry::builtin();
    let parsed = parse(&[0x50], &reg);
    assert_eq!(parsed.outcome, ParseOutcome::Success);
    assert_eq!(parsed.program.steps().len(), 2);
    assert_eq!(parsed.program.dimensions(), [0, 0]);
    assert_eq!(parsed.program.types(), [ValueType::Text, ValueType::Text]);
}

#[test]
fn scenario_params_without_bytes() {
    let reg = FunctionRegistry::builtin();
    let parsed = parse(&[0x51], &reg);
    match parsed.outcome {
        ParseOutcome::OutOfBytes {
            pc,
            function,
            bytes_given,
        } => {
            assert_eq!(pc, 0);
            assert_eq!(function.name, "params");
            assert_eq!(bytes_given, 0);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(parsed.program.steps().len(), 1);
}

#[test]
fn scenario_dims() {
    let reg = FunctionRegistry::builtin();
    let parsed = parse(&[0x52], &reg);
    assert!(parsed.is_success());
    assert_eq!(parsed.program.dimensions(), [0, 0]);
}

#[test]
fn scenario_unregistered_byte() {
    let reg = FunctionRegistry::builtin();
    let parsed = parse(&[0xff], &reg);
    assert_eq!(
        parsed.outcome,
        ParseOutcome::InvalidFunction { pc: 0, opcode: 0xff }
    );
    assert_eq!(parsed.program.steps().len(), 1);
}

#[test]
fn specific_without_zero_rejects_first_step() {
    let reg = single(FunctionDescriptor::new(
        "nonzero",
        0x70,
        0,
        DimensionPolicy::specific([1, 2]),
    ));
    let parsed = parse(&[0x70, 0x70], &reg);
    assert!(matches!(
        parsed.outcome,
        ParseOutcome::InvalidDimension {
            step: 1,
            pc: 0,
            actual: 0,
            ..
        }
    ));
    assert_eq!(parsed.program.dimensions(), [0]);
}

#[test]
fn input_types_without_text_reject_first_step() {
    let reg = single(
        FunctionDescriptor::new("real_only", 0x70, 1, DimensionPolicy::Any)
            .with_input_types(TypeSet::of(ValueType::Real)),
    );
    let parsed = parse(&[0x70, 0x00], &reg);
    assert!(matches!(
        parsed.outcome,
        ParseOutcome::InvalidType {
            step: 1,
            pc: 0,
            actual: ValueType::Text,
            ..
        }
    ));
}

#[test]
fn wide_parameters_count_remaining_bytes() {
    let reg = extended_registry();
    for given in 0..3 {
        let mut bytes = vec![0x50, WIDE];
        bytes.extend(core::iter::repeat_n(0xaa, given));
        let parsed = parse(&bytes, &reg);
        assert_eq!(parsed.outcome.pc(), Some(1));
        assert!(
            matches!(parsed.outcome, ParseOutcome::OutOfBytes { bytes_given, .. } if bytes_given == given)
        );
        assert_eq!(parsed.program.instruction_count(), 1);
    }
    assert!(parse(&[WIDE, 1, 2, 3], &reg).is_success());
}

#[test]
fn dimension_and_type_threading() {
    let reg = extended_registry();
    let parsed = parse(&[UP, ONLY_ONE, COUNT, NUMERIC, COUNT, 0x50], &reg);
    assert!(parsed.is_success(), "{}", parsed.outcome);
    assert_eq!(parsed.program.dimensions(), [0, 1, 1, 0, 0, -1, -1]);
    assert_eq!(
        parsed.program.types(),
        [
            ValueType::Text,
            ValueType::Text,
            ValueType::Text,
            ValueType::Integer,
            ValueType::Integer,
            ValueType::Integer,
            ValueType::Integer,
        ]
    );
}

#[test]
fn failing_step_and_successors_have_no_state() {
    let reg = extended_registry();
    let parsed = parse(&[0x50, NUMERIC, 0x50], &reg);
    assert!(matches!(
        parsed.outcome,
        ParseOutcome::InvalidType { step: 2, pc: 1, .. }
    ));
    let states: Vec<bool> = parsed
        .program
        .steps()
        .iter()
        .map(|s| s.state.is_some())
        .collect();
    assert_eq!(states, [true, true, false, false]);
}

#[test]
fn phases_compose_into_parse() {
    let reg = extended_registry();
    let bytes = [0x51, 0x00, UP, ONLY_ONE, 0x52];
    let (mut program, err) = decode(&bytes, &reg);
    assert_eq!(err, None);
    let outcome = propagate(&mut program);
    assert_eq!(Parsed { program, outcome }, parse(&bytes, &reg));
}

#[test]
fn rendered_diagnostics() {
    let reg = extended_registry();
    assert_eq!(
        render_outcome(&parse(&[0x52, UP, 0x52], &reg).outcome),
        "invalid dimension 1 for function 0x52 'dims' (R) at byte 2 (step 3)\n\
         accepted dimensions: {0}"
    );
    assert_eq!(
        render_outcome(&parse(&[NUMERIC], &reg).outcome),
        "invalid type text for function 0x62 'numeric' (b) at byte 0 (step 1)\n\
         accepted types: {integer, real}"
    );
    assert_eq!(
        render_outcome(&parse(&[0x50, 0xe3], &reg).outcome),
        "invalid function 0xe3 (π) at byte 1"
    );
}

#[test]
fn loading_against_a_smaller_registry_fails() {
    let extended = extended_registry();
    let saved = parse(&[UP, 0x50], &extended).encode();
    assert_eq!(
        Parsed::decode(&saved, &FunctionRegistry::builtin()),
        Err(LoadError::UnknownFunction { name: "up".into() })
    );
    assert!(Parsed::decode(&saved, &extended).is_ok());
}

#[test]
fn concurrent_parses_share_one_registry() {
    let reg = extended_registry();
    let programs: Vec<Vec<u8>> = (0..8_u8)
        .map(|i| vec![0x50, 0x51, i, UP, COUNT, 0x50 + (i % 4)])
        .collect();
    let expected: Vec<Parsed<'_>> = programs.iter().map(|p| parse(p, &reg)).collect();
    let shared = &reg;
    let got: Vec<Parsed<'_>> = std::thread::scope(|s| {
        let handles: Vec<_> = programs
            .iter()
            .map(|p| s.spawn(move || parse(p, shared)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect()
    });
    assert_eq!(got, expected);
}

fn builtin_step() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        Just(vec![0x50]),
        any::<u8>().prop_map(|b| vec![0x51, b]),
        Just(vec![0x52]),
        Just(vec![0x53]),
    ]
}

/// A well-formed builtin program and its step count.
fn builtin_program() -> impl Strategy<Value = (Vec<u8>, usize)> {
    prop::collection::vec(builtin_step(), 0..48).prop_map(|steps| {
        let n = steps.len();
        (steps.concat(), n)
    })
}

fn unregistered_byte() -> impl Strategy<Value = u8> {
    any::<u8>().prop_filter("registered opcode", |b| !(0x50..=0x53).contains(b))
}

proptest! {
    #[test]
    fn builtin_programs_parse((bytes, n) in builtin_program()) {
        let reg = FunctionRegistry::builtin();
        let parsed = parse(&bytes, &reg);
        prop_assert!(parsed.is_success());
        prop_assert_eq!(parsed.program.instruction_count(), n);
        prop_assert!(parsed.program.dimensions().iter().all(|&d| d == 0));
        prop_assert!(parsed.program.types().iter().all(|&t| t == ValueType::Text));
    }

    #[test]
    fn first_unregistered_byte_is_reported(
        (prefix, n) in builtin_program(),
        bad in unregistered_byte(),
        tail in prop::collection::vec(any::<u8>(), 0..16),
    ) {
        let reg = FunctionRegistry::builtin();
        let mut bytes = prefix.clone();
        bytes.push(bad);
        bytes.extend_from_slice(&tail);
        let parsed = parse(&bytes, &reg);
        prop_assert_eq!(
            parsed.outcome,
            ParseOutcome::InvalidFunction { pc: prefix.len(), opcode: bad }
        );
        prop_assert_eq!(parsed.program.instruction_count(), n);
    }

    #[test]
    fn trailing_params_opcode_runs_out_of_bytes((prefix, n) in builtin_program()) {
        let reg = FunctionRegistry::builtin();
        let mut bytes = prefix.clone();
        bytes.push(0x51);
        let parsed = parse(&bytes, &reg);
        prop_assert!(matches!(
            parsed.outcome,
            ParseOutcome::OutOfBytes { pc, bytes_given: 0, .. } if pc == prefix.len()
        ), "unexpected outcome: {:?}", parsed.outcome);
        prop_assert_eq!(parsed.program.instruction_count(), n);
    }

    #[test]
    fn parse_is_idempotent(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let reg = extended_registry();
        prop_assert_eq!(parse(&bytes, &reg), parse(&bytes, &reg));
    }

    #[test]
    fn container_roundtrip(bytes in prop::collection::vec(
        prop_oneof![
            3 => prop::sample::select(vec![0x50_u8, 0x51, 0x52, 0x53, WIDE, ONLY_ONE, NUMERIC, UP, COUNT]),
            1 => any::<u8>(),
        ],
        0..48,
    )) {
        let reg = extended_registry();
        let parsed = parse(&bytes, &reg);
        prop_assert_eq!(Parsed::decode(&parsed.encode(), &reg), Ok(parsed));
    }
}
