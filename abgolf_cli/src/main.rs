// Copyright 2026 the ABGolf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![doc = "Command-line front end for `abgolf`.\n\n\
          Parses a program file, prints diagnostics and optionally persists the result.\n"]

mod registry_file;
mod trace_log;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use abgolf::cp437;
use abgolf::parser::{Parsed, parse_traced};
use abgolf::registry::{FunctionCatalog, FunctionRegistry};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::trace_log::TraceLog;

#[derive(Parser, Debug)]
#[command(name = "abgolf")]
#[command(about = "Parse and check ABGolf byte programs")]
struct Args {
    /// Path of the program file
    #[arg(short, long, value_name = "PATH")]
    source: PathBuf,

    /// Print the program as code page 437 text and exit
    #[arg(short, long)]
    print: bool,

    /// Only check the program; exit 0 if it parses, 1 otherwise
    #[arg(short, long)]
    check: bool,

    /// Print the decoded steps with their dimensions and types
    #[arg(short, long)]
    listing: bool,

    /// Report how long parsing took
    #[arg(short, long)]
    measured: bool,

    /// Write the parsed program to this file (overwrites)
    #[arg(long, value_name = "PATH")]
    save: Option<PathBuf>,

    /// Load a previously saved parse instead of parsing the source
    #[arg(long, value_name = "PATH")]
    load: Option<PathBuf>,

    /// JSON function table registered on top of the builtins
    #[arg(long, value_name = "PATH")]
    functions: Option<PathBuf>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,abgolf=info,abgolf_cli=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_parsed<'r>(
    path: &Path,
    registry: &'r FunctionRegistry,
    source: &[u8],
) -> Result<Parsed<'r>> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read saved parse '{}'", path.display()))?;
    let parsed = Parsed::decode(&bytes, registry)
        .with_context(|| format!("failed to load saved parse '{}'", path.display()))?;
    info!(path = %path.display(), steps = parsed.program.instruction_count(), "loaded saved parse");
    if parsed.program.bytes() != source {
        warn!(path = %path.display(), "saved parse was made from a different source");
    }
    Ok(parsed)
}

fn run(args: &Args) -> Result<ExitCode> {
    let source = fs::read(&args.source)
        .with_context(|| format!("failed to read source '{}'", args.source.display()))?;

    if args.print {
        println!("Program as code page 437 text:");
        println!("{}", cp437::decode(&source));
        return Ok(ExitCode::SUCCESS);
    }

    let catalog = match &args.functions {
        Some(path) => registry_file::load_catalog(path)?,
        None => FunctionCatalog::with_builtins(),
    };
    let registry = catalog.build();
    info!(functions = registry.len(), "registry ready");

    let start = Instant::now();
    let parsed = match &args.load {
        Some(path) => load_parsed(path, &registry, &source)?,
        None => parse_traced(&source, &registry, &mut TraceLog),
    };
    let elapsed = start.elapsed();
    info!(?elapsed, success = parsed.is_success(), "parse done");
    if args.measured {
        println!("parse time: {elapsed:?}");
    }

    if args.listing {
        println!("{}", parsed.program);
    }

    println!("{}", parsed.outcome);
    if !parsed.is_success() {
        return Ok(ExitCode::FAILURE);
    }
    if args.check {
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(path) = &args.save {
        fs::write(path, parsed.encode())
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        info!(path = %path.display(), "saved parse");
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    init_logging();

    let args = Args::parse();
    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
