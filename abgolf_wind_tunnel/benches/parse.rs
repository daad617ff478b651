// Copyright 2026 the ABGolf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(missing_docs, reason = "benchmark harness")]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use abgolf::outcome::ParseOutcome;
use abgolf::parser::{Parsed, parse, parse_traced};
use abgolf::program::{Step, StepState};
use abgolf::registry::FunctionRegistry;
use abgolf::trace::{ParseMask, ParseSink};
use abgolf_wind_tunnel::{builtin_program, program_with_invalid_tail};

fn bench_parse(c: &mut Criterion) {
    bench_parse_success(c);
    bench_parse_traced(c);
    bench_parse_invalid_tail(c);
    bench_container(c);
}

fn bench_parse_success(c: &mut Criterion) {
    let reg = FunctionRegistry::builtin();
    let mut group = c.benchmark_group("parse_success");
    for &steps in &[16_usize, 256, 4096] {
        let bytes = builtin_program(steps);
        group.bench_with_input(BenchmarkId::from_parameter(steps), &bytes, |b, bytes| {
            b.iter(|| {
                let parsed = parse(black_box(bytes), &reg);
                assert!(parsed.is_success());
                black_box(parsed);
            });
        });
    }
    group.finish();
}

#[derive(Default)]
struct Counting {
    steps: u64,
    states: u64,
}

impl ParseSink for Counting {
    fn mask(&self) -> ParseMask {
        ParseMask::ALL
    }

    fn step(&mut self, _index: usize, _step: &Step<'_>) {
        self.steps += 1;
    }

    fn state(&mut self, _index: usize, _pc: usize, _state: StepState) {
        self.states += 1;
    }

    fn outcome(&mut self, outcome: &ParseOutcome<'_>) {
        black_box(outcome);
    }
}

fn bench_parse_traced(c: &mut Criterion) {
    let reg = FunctionRegistry::builtin();
    let mut group = c.benchmark_group("parse_traced");
    for &steps in &[16_usize, 256, 4096] {
        let bytes = builtin_program(steps);
        let mut sink = Counting::default();
        group.bench_with_input(BenchmarkId::from_parameter(steps), &bytes, |b, bytes| {
            b.iter(|| {
                let parsed = parse_traced(black_box(bytes), &reg, &mut sink);
                black_box(parsed);
            });
        });
        black_box((sink.steps, sink.states));
    }
    group.finish();
}

fn bench_parse_invalid_tail(c: &mut Criterion) {
    let reg = FunctionRegistry::builtin();
    let mut group = c.benchmark_group("parse_invalid_tail");
    for &steps in &[16_usize, 4096] {
        let bytes = program_with_invalid_tail(steps);
        group.bench_with_input(BenchmarkId::from_parameter(steps), &bytes, |b, bytes| {
            b.iter(|| {
                let parsed = parse(black_box(bytes), &reg);
                assert!(parsed.outcome.is_decode_error());
                black_box(parsed);
            });
        });
    }
    group.finish();
}

fn bench_container(c: &mut Criterion) {
    let reg = FunctionRegistry::builtin();
    let parsed = parse(&builtin_program(1024), &reg);
    let encoded = parsed.encode();

    c.bench_function("container_encode_1024", |b| {
        b.iter(|| black_box(black_box(&parsed).encode()));
    });
    c.bench_function("container_decode_1024", |b| {
        b.iter(|| {
            let loaded = Parsed::decode(black_box(&encoded), &reg);
            assert!(loaded.is_ok());
            black_box(loaded)
        });
    });
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
