// Copyright 2026 the ABGolf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON function tables.
//!
//! ```json
//! {
//!   "functions": [
//!     {
//!       "name": "sum",
//!       "opcode": "0xE4",
//!       "param_count": 0,
//!       "dimension": "decrease",
//!       "input_types": ["int", "float"],
//!       "output_types": null
//!     }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use abgolf::program::{TypeSet, ValueType};
use abgolf::registry::{DimensionPolicy, FunctionCatalog, FunctionDescriptor, OutputTypes};
use anyhow::{Context, Result, bail};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct RegistryFile {
    functions: Vec<FunctionSpec>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct FunctionSpec {
    name: String,
    opcode: String,
    #[serde(default)]
    param_count: usize,
    #[serde(default = "default_dimension")]
    dimension: String,
    #[serde(default)]
    input_dimensions: Vec<i64>,
    #[serde(default)]
    input_types: Option<Vec<String>>,
    #[serde(default)]
    output_types: Option<Vec<String>>,
}

fn default_dimension() -> String {
    "any".into()
}

fn parse_u8_hex(s: &str) -> Result<u8> {
    let s = s.trim();
    let raw = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u8::from_str_radix(raw, 16).with_context(|| format!("invalid opcode byte '{s}'"))
}

/// Canonical names plus the short aliases used by hand-written tables.
fn parse_type_name(name: &str) -> Result<ValueType> {
    match name {
        "str" => Ok(ValueType::Text),
        "int" => Ok(ValueType::Integer),
        "float" => Ok(ValueType::Real),
        other => match ValueType::from_name(other) {
            Ok(ty) => Ok(ty),
            Err(_) => bail!("unknown type name '{other}'"),
        },
    }
}

fn parse_type_list(names: &[String], field: &str) -> Result<TypeSet> {
    if names.is_empty() {
        bail!("'{field}' must not be empty; use null to leave it unrestricted");
    }
    names.iter().map(|n| parse_type_name(n)).collect()
}

impl FunctionSpec {
    fn into_descriptor(self) -> Result<FunctionDescriptor> {
        let opcode = parse_u8_hex(&self.opcode)?;
        let dimension = match self.dimension.as_str() {
            "specific" => {
                if self.input_dimensions.is_empty() {
                    bail!("'specific' dimension policy needs at least one input dimension");
                }
                DimensionPolicy::specific(self.input_dimensions.iter().copied())
            }
            other => {
                if !self.input_dimensions.is_empty() {
                    bail!("input_dimensions only apply to the 'specific' dimension policy");
                }
                match other {
                    "any" => DimensionPolicy::Any,
                    "increase" => DimensionPolicy::Increase,
                    "decrease" => DimensionPolicy::Decrease,
                    _ => bail!("unknown dimension policy '{other}'"),
                }
            }
        };
        let input_types = self
            .input_types
            .as_deref()
            .map(|names| parse_type_list(names, "input_types"))
            .transpose()?;
        let output_types = self
            .output_types
            .as_deref()
            .map(|names| parse_type_list(names, "output_types"))
            .transpose()?;

        let mut descriptor =
            FunctionDescriptor::new(self.name, opcode, self.param_count, dimension)
                .with_output_types(OutputTypes::from_declared(output_types));
        descriptor.input_types = input_types;
        Ok(descriptor)
    }
}

/// Parses a JSON function table and registers it on top of the builtins.
pub(crate) fn parse_catalog(json: &str) -> Result<FunctionCatalog> {
    let file: RegistryFile = serde_json::from_str(json).context("failed to parse function table")?;
    let mut catalog = FunctionCatalog::with_builtins();
    for spec in file.functions {
        let name = spec.name.clone();
        let descriptor = spec
            .into_descriptor()
            .with_context(|| format!("invalid function '{name}'"))?;
        catalog
            .register(descriptor)
            .with_context(|| format!("cannot register function '{name}'"))?;
    }
    Ok(catalog)
}

/// Reads and parses the function table at `path`.
pub(crate) fn load_catalog(path: &Path) -> Result<FunctionCatalog> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read function table '{}'", path.display()))?;
    parse_catalog(&json).with_context(|| format!("in '{}'", path.display()))
}
