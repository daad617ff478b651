// Copyright 2026 the ABGolf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Persisted parse results.
//!
//! A [`Parsed`] value can be written to a small sectioned binary container and loaded back
//! against a registry. Loading is strict: every referenced function must be registered under the
//! same name with an identical descriptor, every step must agree with the raw program bytes, every
//! saved state must be what the step's function computes, and the outcome must be the one a parse
//! of those bytes ends with.
//!
//! Layout:
//!
//! ```text
//! header:   magic "ABGOLF\0\0", major u16le, minor u16le
//! sections: u8 tag, uleb len, payload[len]
//!   1 = bytes    raw program bytes
//!   2 = steps    uleb count, then per step: uleb pc, descriptor, uleb-prefixed params
//!   3 = trace    uleb count, then per state (input first): sleb dimension, type name
//!   4 = outcome  u8 kind, then the kind's fields
//! ```
//!
//! Each section must appear exactly once, in any order.

use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::format::{DecodeError, Reader, Writer};
use crate::outcome::ParseOutcome;
use crate::parser::Parsed;
use crate::program::{Program, Step, StepState, TypeSet, ValueType};
use crate::registry::{
    DimensionPolicy, FunctionDescriptor, FunctionRegistry, OutputTypes, Violation,
};

const MAGIC: &[u8; 8] = b"ABGOLF\0\0";
const VERSION_MAJOR: u16 = 0;
const VERSION_MINOR: u16 = 1;

/// An error loading a persisted parse result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadError {
    /// The container bytes were malformed at the byte level.
    Format(DecodeError),
    /// A type name is not one of the canonical [`ValueType`] names.
    UnknownTypeName {
        /// The unrecognized name.
        name: String,
    },
    /// A function name is not registered.
    UnknownFunction {
        /// The unrecognized name.
        name: String,
    },
    /// A persisted descriptor differs from the registered function of the same name.
    DescriptorMismatch {
        /// The function name.
        name: String,
    },
    /// The contents are well-formed bytes but inconsistent with each other.
    Malformed {
        /// What was inconsistent.
        what: &'static str,
    },
}

impl From<DecodeError> for LoadError {
    fn from(e: DecodeError) -> Self {
        Self::Format(e)
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format(e) => write!(f, "container decode failed: {e}"),
            Self::UnknownTypeName { name } => write!(f, "unknown type name '{name}'"),
            Self::UnknownFunction { name } => write!(f, "unknown function '{name}'"),
            Self::DescriptorMismatch { name } => {
                write!(f, "function '{name}' differs from the registered function")
            }
            Self::Malformed { what } => write!(f, "malformed container: {what}"),
        }
    }
}

impl core::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Format(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum SectionTag {
    Bytes = 1,
    Steps = 2,
    Trace = 3,
    Outcome = 4,
}

impl SectionTag {
    fn from_u8_opt(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Bytes),
            2 => Some(Self::Steps),
            3 => Some(Self::Trace),
            4 => Some(Self::Outcome),
            _ => None,
        }
    }

    fn slot(self) -> usize {
        self as usize - 1
    }
}

fn write_section(w: &mut Writer, tag: SectionTag, payload: &[u8]) {
    w.write_u8(tag as u8);
    w.write_prefixed_bytes(payload);
}

fn malformed(what: &'static str) -> LoadError {
    LoadError::Malformed { what }
}

impl Parsed<'_> {
    /// Encodes this result into the persisted container format.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.write_bytes(MAGIC);
        w.write_u16_le(VERSION_MAJOR);
        w.write_u16_le(VERSION_MINOR);

        write_section(&mut w, SectionTag::Bytes, self.program.bytes());

        {
            let decoded: Vec<(&Step<'_>, &FunctionDescriptor)> = self
                .program
                .instructions()
                .filter_map(|s| s.function.map(|f| (s, f)))
                .collect();
            let mut payload = Writer::new();
            payload.write_uleb128_usize(decoded.len());
            for (step, function) in decoded {
                payload.write_uleb128_usize(step.pc);
                write_descriptor(&mut payload, function);
                payload.write_prefixed_bytes(&step.params);
            }
            write_section(&mut w, SectionTag::Steps, payload.as_slice());
        }

        {
            let states: Vec<StepState> = self.program.states().collect();
            let mut payload = Writer::new();
            payload.write_uleb128_usize(states.len());
            for s in states {
                payload.write_sleb128_i64(s.dimension);
                write_type(&mut payload, s.ty);
            }
            write_section(&mut w, SectionTag::Trace, payload.as_slice());
        }

        {
            let mut payload = Writer::new();
            write_outcome(&mut payload, &self.outcome);
            write_section(&mut w, SectionTag::Outcome, payload.as_slice());
        }

        w.into_vec()
    }
}

impl<'r> Parsed<'r> {
    /// Loads a result written by [`Parsed::encode`], resolving functions in `registry`.
    pub fn decode(bytes: &[u8], registry: &'r FunctionRegistry) -> Result<Self, LoadError> {
        let mut r = Reader::new(bytes);
        let magic = r.read_bytes(MAGIC.len())?;
        if magic != MAGIC {
            return Err(DecodeError::BadMagic.into());
        }
        let major = r.read_u16_le()?;
        let minor = r.read_u16_le()?;
        if major != VERSION_MAJOR || minor != VERSION_MINOR {
            return Err(DecodeError::UnsupportedVersion { major, minor }.into());
        }

        let mut sections: [Option<&[u8]>; 4] = [None; 4];
        while !r.is_at_end() {
            let raw = r.read_u8()?;
            let tag =
                SectionTag::from_u8_opt(raw).ok_or(DecodeError::UnknownSectionTag { tag: raw })?;
            let payload = r.read_prefixed_bytes()?;
            let slot = &mut sections[tag.slot()];
            if slot.is_some() {
                return Err(DecodeError::DuplicateSection { tag: raw }.into());
            }
            *slot = Some(payload);
        }
        let section = |tag: SectionTag| {
            sections[tag.slot()].ok_or(DecodeError::MissingSection { tag: tag as u8 })
        };

        let program_bytes = section(SectionTag::Bytes)?;
        let (mut steps, decoded_len) =
            decode_steps(section(SectionTag::Steps)?, program_bytes, registry)?;
        let traced = decode_trace(section(SectionTag::Trace)?, &mut steps)?;
        let outcome = decode_outcome(section(SectionTag::Outcome)?, registry)?;
        let ends = ParseEnd {
            program_bytes,
            decoded_len,
            steps: &steps,
            traced,
        };
        ends.check(&outcome, registry)?;
        Ok(Parsed {
            program: Program::from_parts(program_bytes.to_vec(), steps),
            outcome,
        })
    }
}

fn write_type(w: &mut Writer, ty: ValueType) {
    w.write_prefixed_str(ty.name());
}

fn write_type_set(w: &mut Writer, set: TypeSet) {
    w.write_uleb128_usize(set.len());
    for ty in set.iter() {
        write_type(w, ty);
    }
}

fn write_descriptor(w: &mut Writer, func: &FunctionDescriptor) {
    w.write_prefixed_str(&func.name);
    w.write_u8(func.opcode);
    w.write_uleb128_usize(func.param_count);
    match &func.dimension {
        DimensionPolicy::Any => w.write_u8(0),
        DimensionPolicy::Specific(dims) => {
            w.write_u8(1);
            w.write_uleb128_usize(dims.len());
            for &d in dims {
                w.write_sleb128_i64(d);
            }
        }
        DimensionPolicy::Increase => w.write_u8(2),
        DimensionPolicy::Decrease => w.write_u8(3),
    }
    match func.input_types {
        None => w.write_u8(0),
        Some(set) => {
            w.write_u8(1);
            write_type_set(w, set);
        }
    }
    match func.output_types {
        OutputTypes::PassThrough => w.write_u8(0),
        OutputTypes::Forced(ty) => {
            w.write_u8(1);
            write_type(w, ty);
        }
        OutputTypes::Candidates(set) => {
            w.write_u8(2);
            write_type_set(w, set);
        }
    }
}

fn write_outcome(w: &mut Writer, outcome: &ParseOutcome<'_>) {
    match outcome {
        ParseOutcome::Success => w.write_u8(0),
        ParseOutcome::InvalidFunction { pc, opcode } => {
            w.write_u8(1);
            w.write_uleb128_usize(*pc);
            w.write_u8(*opcode);
        }
        ParseOutcome::OutOfBytes {
            pc,
            function,
            bytes_given,
        } => {
            w.write_u8(2);
            w.write_uleb128_usize(*pc);
            w.write_prefixed_str(&function.name);
            w.write_uleb128_usize(*bytes_given);
        }
        ParseOutcome::InvalidDimension {
            step,
            pc,
            function,
            actual,
        } => {
            w.write_u8(3);
            w.write_uleb128_usize(*step);
            w.write_uleb128_usize(*pc);
            w.write_prefixed_str(&function.name);
            w.write_sleb128_i64(*actual);
        }
        ParseOutcome::InvalidType {
            step,
            pc,
            function,
            actual,
        } => {
            w.write_u8(4);
            w.write_uleb128_usize(*step);
            w.write_uleb128_usize(*pc);
            w.write_prefixed_str(&function.name);
            write_type(w, *actual);
        }
    }
}

fn read_type(r: &mut Reader<'_>) -> Result<ValueType, LoadError> {
    let name = r.read_prefixed_str()?;
    ValueType::from_name(name).map_err(|_| LoadError::UnknownTypeName { name: name.into() })
}

fn read_type_set(r: &mut Reader<'_>) -> Result<TypeSet, LoadError> {
    let n = r.read_uleb128_usize()?;
    let mut set = TypeSet::EMPTY;
    for _ in 0..n {
        set = set.with(read_type(r)?);
    }
    Ok(set)
}

fn read_descriptor(r: &mut Reader<'_>) -> Result<FunctionDescriptor, LoadError> {
    let name = r.read_prefixed_str()?;
    let opcode = r.read_u8()?;
    let param_count = r.read_uleb128_usize()?;
    let dimension = match r.read_u8()? {
        0 => DimensionPolicy::Any,
        1 => {
            let n = r.read_uleb128_usize()?;
            let mut dims = BTreeSet::new();
            for _ in 0..n {
                dims.insert(r.read_sleb128_i64()?);
            }
            DimensionPolicy::Specific(dims)
        }
        2 => DimensionPolicy::Increase,
        3 => DimensionPolicy::Decrease,
        _ => return Err(malformed("unknown dimension policy")),
    };
    let input_types = match r.read_u8()? {
        0 => None,
        1 => Some(read_type_set(r)?),
        _ => return Err(malformed("unknown input types kind")),
    };
    let output_types = match r.read_u8()? {
        0 => OutputTypes::PassThrough,
        1 => OutputTypes::Forced(read_type(r)?),
        2 => {
            let output = OutputTypes::Candidates(read_type_set(r)?);
            if !output.is_well_formed() {
                return Err(malformed("fewer than two candidate output types"));
            }
            output
        }
        _ => return Err(malformed("unknown output types kind")),
    };
    Ok(FunctionDescriptor {
        name: name.into(),
        opcode,
        param_count,
        dimension,
        input_types,
        output_types,
    })
}

fn resolve<'r>(
    registry: &'r FunctionRegistry,
    name: &str,
) -> Result<&'r FunctionDescriptor, LoadError> {
    registry
        .lookup_name(name)
        .ok_or_else(|| LoadError::UnknownFunction { name: name.into() })
}

fn decode_steps<'r>(
    payload: &[u8],
    program_bytes: &[u8],
    registry: &'r FunctionRegistry,
) -> Result<(Vec<Step<'r>>, usize), LoadError> {
    let mut r = Reader::new(payload);
    let count = r.read_uleb128_usize()?;
    if count > program_bytes.len() {
        return Err(malformed("more steps than program bytes"));
    }
    let mut steps = Vec::with_capacity(count + 1);
    steps.push(Step::sentinel());
    let mut next_pc = 0_usize;
    for _ in 0..count {
        let pc = r.read_uleb128_usize()?;
        let persisted = read_descriptor(&mut r)?;
        let params = r.read_prefixed_bytes()?;

        let function = resolve(registry, &persisted.name)?;
        if *function != persisted {
            return Err(LoadError::DescriptorMismatch {
                name: persisted.name,
            });
        }
        if pc != next_pc {
            return Err(malformed("step offsets are not contiguous"));
        }
        if params.len() != function.param_count {
            return Err(malformed("parameter count disagrees with the function"));
        }
        let end = pc + 1 + params.len();
        if program_bytes.get(pc) != Some(&function.opcode)
            || program_bytes.get(pc + 1..end) != Some(params)
        {
            return Err(malformed("step disagrees with the program bytes"));
        }
        steps.push(Step::decoded(function, pc, params));
        next_pc = end;
    }
    r.finish()?;
    Ok((steps, next_pc))
}

/// Fills in the saved states and returns how many there were.
fn decode_trace(payload: &[u8], steps: &mut [Step<'_>]) -> Result<usize, LoadError> {
    let mut r = Reader::new(payload);
    let count = r.read_uleb128_usize()?;
    if count == 0 || count > steps.len() {
        return Err(malformed("trace length does not fit the steps"));
    }
    for step in &mut steps[..count] {
        let dimension = r.read_sleb128_i64()?;
        let ty = read_type(&mut r)?;
        step.state = Some(StepState { dimension, ty });
    }
    r.finish()?;
    if steps[0].state != Some(StepState::INPUT) {
        return Err(malformed("trace does not start from the input state"));
    }
    for pair in steps[..count].windows(2) {
        let computed = match (pair[0].state, pair[1].function) {
            (Some(prev), Some(function)) => function.apply(prev).ok(),
            _ => None,
        };
        if computed != pair[1].state {
            return Err(malformed("trace disagrees with the functions"));
        }
    }
    Ok(count)
}

fn decode_outcome<'r>(
    payload: &[u8],
    registry: &'r FunctionRegistry,
) -> Result<ParseOutcome<'r>, LoadError> {
    let mut r = Reader::new(payload);
    let outcome = match r.read_u8()? {
        0 => ParseOutcome::Success,
        1 => {
            let pc = r.read_uleb128_usize()?;
            let opcode = r.read_u8()?;
            ParseOutcome::InvalidFunction { pc, opcode }
        }
        2 => {
            let pc = r.read_uleb128_usize()?;
            let function = resolve(registry, r.read_prefixed_str()?)?;
            let bytes_given = r.read_uleb128_usize()?;
            ParseOutcome::OutOfBytes {
                pc,
                function,
                bytes_given,
            }
        }
        3 => {
            let step = r.read_uleb128_usize()?;
            let pc = r.read_uleb128_usize()?;
            let function = resolve(registry, r.read_prefixed_str()?)?;
            let actual = r.read_sleb128_i64()?;
            ParseOutcome::InvalidDimension {
                step,
                pc,
                function,
                actual,
            }
        }
        4 => {
            let step = r.read_uleb128_usize()?;
            let pc = r.read_uleb128_usize()?;
            let function = resolve(registry, r.read_prefixed_str()?)?;
            let actual = read_type(&mut r)?;
            ParseOutcome::InvalidType {
                step,
                pc,
                function,
                actual,
            }
        }
        _ => return Err(malformed("unknown outcome kind")),
    };
    r.finish()?;
    Ok(outcome)
}

/// How far a loaded record got: decoded bytes and saved states.
struct ParseEnd<'a, 'r> {
    program_bytes: &'a [u8],
    decoded_len: usize,
    steps: &'a [Step<'r>],
    traced: usize,
}

impl ParseEnd<'_, '_> {
    /// Checks that `outcome` is where a parse of the saved bytes would stop.
    fn check(
        &self,
        outcome: &ParseOutcome<'_>,
        registry: &FunctionRegistry,
    ) -> Result<(), LoadError> {
        match *outcome {
            ParseOutcome::Success => {
                if !self.fully_decoded() {
                    return Err(malformed("success with undecoded bytes"));
                }
                if self.traced != self.steps.len() {
                    return Err(malformed("success without a state for every step"));
                }
            }
            ParseOutcome::InvalidFunction { pc, opcode } => {
                self.check_decode_stop(pc)?;
                if self.program_bytes.get(pc) != Some(&opcode) || registry.lookup(opcode).is_some()
                {
                    return Err(malformed("invalid function disagrees with the program bytes"));
                }
            }
            ParseOutcome::OutOfBytes {
                pc,
                function,
                bytes_given,
            } => {
                self.check_decode_stop(pc)?;
                if self.program_bytes.get(pc) != Some(&function.opcode)
                    || bytes_given != self.program_bytes.len() - pc - 1
                    || bytes_given >= function.param_count
                {
                    return Err(malformed("missing parameters disagree with the program bytes"));
                }
            }
            ParseOutcome::InvalidDimension {
                step,
                pc,
                function,
                actual,
            } => self.check_violation(step, pc, function, Violation::Dimension(actual))?,
            ParseOutcome::InvalidType {
                step,
                pc,
                function,
                actual,
            } => self.check_violation(step, pc, function, Violation::Type(actual))?,
        }
        Ok(())
    }

    fn fully_decoded(&self) -> bool {
        self.decoded_len == self.program_bytes.len()
    }

    fn check_decode_stop(&self, pc: usize) -> Result<(), LoadError> {
        if pc != self.decoded_len {
            return Err(malformed("decode error is not at the first undecoded byte"));
        }
        if self.traced != 1 {
            return Err(malformed("decode error with propagated states"));
        }
        Ok(())
    }

    fn check_violation(
        &self,
        step: usize,
        pc: usize,
        function: &FunctionDescriptor,
        violation: Violation,
    ) -> Result<(), LoadError> {
        if step == 0 {
            return Err(malformed("outcome points at the input sentinel"));
        }
        if !self.fully_decoded() {
            return Err(malformed("propagation error with undecoded bytes"));
        }
        let failing = self
            .steps
            .get(step)
            .filter(|s| s.pc == pc)
            .ok_or_else(|| malformed("outcome does not point at a step"))?;
        if failing.function != Some(function) {
            return Err(malformed("outcome names a different function"));
        }
        if self.traced != step {
            return Err(malformed("trace does not stop at the failing step"));
        }
        let prev = self.steps[step - 1].state;
        if prev.map(|prev| function.apply(prev)) != Some(Err(violation)) {
            return Err(malformed("outcome disagrees with the failing step"));
        }
        Ok(())
    }
}
