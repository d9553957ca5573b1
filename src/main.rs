// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! cwf - self-hosting module loader
//!
//! ## Commands
//!
//! - `run` - load the entry module of a module directory or bundle
//! - `pack` / `unpack` - convert between module text and packed payloads
//! - `inspect` - show the program synthesized for a module
//! - `repl` - interactive session, optionally with modules loaded

mod repl;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use cwf_loader::{
    Bootstrap, ErrorSink, LoaderConfig, ModuleLoader, Outcome, SinkError, decode, pack,
};
use cwf_script::{TraceEntry, Value};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "cwf",
    about = "Self-hosting module loader",
    version,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// Enable verbose logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Load the entry module of a module directory or bundle
    Run {
        /// Module directory or `.json` bundle (defaults to cwf.toml's root)
        source: Option<PathBuf>,

        /// Entry module (defaults to cwf.toml's or the bundle's entry)
        #[arg(short, long)]
        entry: Option<String>,

        /// Function of the entry module to call once it is loaded
        #[arg(short, long)]
        call: Option<String>,
    },

    /// Pack module text into a payload
    Pack {
        /// Module text file
        file: PathBuf,
    },

    /// Decode a packed payload into module text
    Unpack {
        /// Payload file
        file: PathBuf,
    },

    /// Show the program synthesized for a module
    Inspect {
        /// Module directory or `.json` bundle
        source: PathBuf,

        /// Module name
        module: String,
    },

    /// Start an interactive session
    Repl {
        /// Module directory or `.json` bundle to load modules from
        source: Option<PathBuf>,
    },
}

/// Prints reports to stderr.
struct ConsoleSink;

impl ErrorSink for ConsoleSink {
    fn report(&self, message: &str, trace_text: &str, _trace: &[TraceEntry]) -> Result<(), SinkError> {
        eprintln!("{}: {}", "Error".red().bold(), message);
        for line in trace_text.lines() {
            eprintln!("    {} {}", "at".dimmed(), line.cyan());
        }
        Ok(())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "cwf=debug,cwf_loader=debug,cwf_script=debug" } else { "cwf=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Some(Command::Run { source, entry, call }) => run(source, entry, call),
        Some(Command::Pack { file }) => pack_file(&file),
        Some(Command::Unpack { file }) => unpack_file(&file),
        Some(Command::Inspect { source, module }) => inspect(&source, &module),
        Some(Command::Repl { source }) => run_repl(source),
        None => run_repl(None),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Configuration for `source`: its cwf.toml (for directories) plus the
/// environment, with `source` as the root.
fn config_for(source: Option<&Path>) -> anyhow::Result<LoaderConfig> {
    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    match source {
        Some(path) if path.is_dir() => LoaderConfig::load(path).map_err(Into::into),
        Some(path) => {
            let mut config = LoaderConfig::load(&cwd)?;
            config.root = path.to_path_buf();
            Ok(config)
        }
        None => LoaderConfig::load(&cwd).map_err(Into::into),
    }
}

fn run(source: Option<PathBuf>, entry: Option<String>, call: Option<String>) -> anyhow::Result<ExitCode> {
    let mut config = config_for(source.as_deref())?;
    if entry.is_some() {
        config.entry = entry;
    }

    let (mut loader, outcome) = Bootstrap::new(config).with_sink(ConsoleSink).start()?;
    let handle = match outcome {
        Outcome::Success(handle) => handle,
        Outcome::Failure(_) => return Ok(ExitCode::FAILURE),
    };
    println!("{} {}", "loaded".green().bold(), handle.name().cyan());

    if let Some(function) = call {
        match loader.invoke(&handle, &function, Vec::new())? {
            Ok(value) => {
                if !value.is_undefined() {
                    println!("{}", repl::format_value(&value));
                }
            }
            Err(_) => return Ok(ExitCode::FAILURE),
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn pack_file(file: &Path) -> anyhow::Result<ExitCode> {
    let text = std::fs::read_to_string(file).with_context(|| format!("cannot read {}", file.display()))?;
    println!("{}", pack(&text));
    Ok(ExitCode::SUCCESS)
}

fn unpack_file(file: &Path) -> anyhow::Result<ExitCode> {
    let payload = std::fs::read_to_string(file).with_context(|| format!("cannot read {}", file.display()))?;
    let text = decode(payload.trim_end_matches(['\r', '\n']))?;
    println!("{}", text);
    Ok(ExitCode::SUCCESS)
}

fn inspect(source: &Path, module: &str) -> anyhow::Result<ExitCode> {
    let config = config_for(Some(source))?;
    let (mut loader, _) = Bootstrap::new(config).with_sink(ConsoleSink).build()?;
    let outcome = loader.require(module)?;

    let Some(compiled) = loader.compiled(module) else {
        bail!("module '{}' could not be compiled", module);
    };
    println!("{}", compiled.synthesized(&loader.config().private_prefix));
    if let Some(timestamp) = loader.timestamp(module) {
        println!("{} {}", "timestamp".dimmed(), timestamp.yellow());
    }
    print_members(&loader, &outcome);
    Ok(if outcome.is_success() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn print_members(loader: &ModuleLoader, outcome: &Outcome) {
    let Some(handle) = outcome.handle() else {
        return;
    };
    let object = handle.object().borrow();
    for key in object.keys() {
        let value = object.get(key).cloned().unwrap_or(Value::Undefined);
        println!("  {:16} {}", key.cyan(), repl::format_value(&value));
    }
    if let Some(privates) = loader.privates(handle.name()) {
        for key in privates.borrow().keys() {
            println!("  {:16} {}", key.magenta(), "(private)".dimmed());
        }
    }
}

fn run_repl(source: Option<PathBuf>) -> anyhow::Result<ExitCode> {
    let loader = match source {
        Some(path) => {
            let config = config_for(Some(&path))?;
            let (loader, _) = Bootstrap::new(config).with_sink(ConsoleSink).build()?;
            loader
        }
        None => ModuleLoader::new(config_for(None)?).with_sink(ConsoleSink),
    };

    let mut repl = repl::Repl::new(loader).context("failed to initialize REPL")?;
    repl.run().context("REPL error")?;
    Ok(ExitCode::SUCCESS)
}
