// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! FSTR-Mesh command-line converter.
//!
//! Usage:
//!   fstr-mesh <refine|subdivide|adv|count> [-v] [-h] [SOURCE [DEST]]
//!
//! SOURCE defaults to standard input and DEST to standard output.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use fstr_mesh_core::count_records;
use fstr_mesh_refine::{linearize, subdivide, to_adventure, ConvertOptions};
use tracing_subscriber::EnvFilter;

mod config;

use config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// 341 to 342
    Refine,
    /// 342 to 341
    Subdivide,
    /// Adventure `.msh` export
    Adv,
    Count,
}

impl Command {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "refine" => Some(Command::Refine),
            "subdivide" => Some(Command::Subdivide),
            "adv" => Some(Command::Adv),
            "count" => Some(Command::Count),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    command: Command,
    verbosity: u8,
    source: Option<PathBuf>,
    dest: Option<PathBuf>,
}

/// Parse the command line; `Ok(None)` means help was requested.
fn parse_args<I: IntoIterator<Item = String>>(args: I) -> std::result::Result<Option<Args>, String> {
    let mut args = args.into_iter();

    let command = match args.next() {
        None => return Ok(None),
        Some(arg) if arg == "-h" || arg == "--help" => return Ok(None),
        Some(arg) => Command::from_name(&arg).ok_or_else(|| format!("unknown command: {}", arg))?,
    };

    let mut verbosity = 0u8;
    let mut paths = Vec::new();
    for arg in args {
        // options only before the first path
        if paths.is_empty() && arg.len() > 1 && arg.starts_with('-') {
            match arg.as_str() {
                "-h" | "--help" => return Ok(None),
                "-v" | "--verbose" => verbosity = verbosity.saturating_add(1),
                "-vv" => verbosity = verbosity.saturating_add(2),
                other => return Err(format!("unknown option: {}", other)),
            }
            continue;
        }
        paths.push(PathBuf::from(arg));
    }

    if paths.len() > 2 {
        return Err("too many arguments".to_string());
    }
    let mut paths = paths.into_iter();
    Ok(Some(Args {
        command,
        verbosity,
        source: paths.next(),
        dest: paths.next(),
    }))
}

fn print_usage() {
    eprintln!(
        r#"FSTR-Mesh {}

Convert FrontSTR tetrahedral meshes between 341 (4-node) and 342 (10-node)
elements.

Usage:
  fstr-mesh <COMMAND> [OPTIONS] [SOURCE [DEST]]

Commands:
  refine      Refine a 341 mesh into a 342 mesh (adds edge midpoints)
  subdivide   Subdivide a 342 mesh into a 341 mesh with 8x the elements
  adv         Export a 341 or 342 mesh in Adventure .msh format
  count       Count node and element records

Options:
  -v          Verbose: progress, statistics and timing on stderr
  -vv         Trace logging
  -h          Display this help

SOURCE defaults to standard input (or "-"), DEST to standard output.

Environment:
  FSTR_MESH_DUMP_DIR           Directory for e<id>.inp dumps of flagged
                               elements (default: current dir, "off" to disable)
  FSTR_MESH_ASPECT_LIMIT       Aspect ratio warning limit (default: 500)
  FSTR_MESH_VOLUME_RATIO_MIN   Volume ratio lower bound (default: 0.5)
  FSTR_MESH_VOLUME_RATIO_MAX   Volume ratio upper bound (default: 2.0)
  RUST_LOG                     Log filter, overrides -v"#,
        env!("CARGO_PKG_VERSION")
    );
}

fn init_logging(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "warn,fstr_mesh=debug,fstr_mesh_core=debug,fstr_mesh_refine=debug",
        _ => "info,fstr_mesh=trace,fstr_mesh_core=trace,fstr_mesh_refine=trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn open_source(source: &Option<PathBuf>) -> Result<Box<dyn BufRead>> {
    match source {
        Some(path) if path.as_os_str() != "-" => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => Ok(Box::new(io::stdin().lock())),
    }
}

fn open_dest(dest: &Option<PathBuf>) -> Result<Box<dyn Write>> {
    match dest {
        Some(path) if path.as_os_str() != "-" => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        _ => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

fn run(args: &Args, config: &Config) -> Result<()> {
    let source_name = args
        .source
        .as_ref()
        .map_or_else(|| "stdin".to_string(), |path| path.display().to_string());
    let options = ConvertOptions::default()
        .with_source_name(source_name.clone())
        .with_quality(config.quality());

    let input = open_source(&args.source)?;
    let mut output = open_dest(&args.dest)?;

    tracing::debug!(command = ?args.command, source = %source_name, "Starting conversion");

    match args.command {
        Command::Refine => {
            let summary = linearize(input, &mut output, &options)
                .with_context(|| format!("Refinement of {} failed", source_name))?;
            if let Some(stats) = &summary.edge_stats {
                tracing::info!("Edge statistics:\n{}", stats);
            }
        }
        Command::Subdivide => {
            let summary = subdivide(input, &mut output, &options)
                .with_context(|| format!("Subdivision of {} failed", source_name))?;
            if !summary.quality.is_clean() {
                tracing::warn!(
                    problems = summary.quality.errors,
                    elements = summary.quality.flagged_elements,
                    "Subdivided mesh has quality problems"
                );
            }
        }
        Command::Adv => {
            to_adventure(input, &mut output)
                .with_context(|| format!("Adventure export of {} failed", source_name))?;
        }
        Command::Count => {
            let counts = count_records(input)
                .with_context(|| format!("Counting records of {} failed", source_name))?;
            writeln!(output, "{} nodes, {} elements", counts.nodes(), counts.elements())?;
        }
    }

    output.flush().context("Failed to flush output")?;
    Ok(())
}

fn main() -> ExitCode {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("Error: {}", message);
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    init_logging(args.verbosity);
    let config = Config::from_env();
    tracing::debug!(?config, "Loaded configuration");

    let start = Instant::now();
    let result = run(&args, &config);

    if args.verbosity > 0 {
        tracing::info!(elapsed_ms = start.elapsed().as_millis() as u64, "Total time");
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
