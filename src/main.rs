//! JSON command-line tool.
//!
//! Validates and reformats JSON documents read from a file or stdin.
//!
//! Exit codes: 0 on success, 1 for invalid JSON or an unrepresentable value,
//! 2 when the input cannot be read.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, error};

use json::{Format, Limits, ParseError, SerializeOptions};

mod logging;

const EXIT_INVALID: u8 = 1;
const EXIT_IO: u8 = 2;

#[derive(Parser)]
#[command(name = "json")]
#[command(about = "Validate and reformat JSON documents", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a document and print it back out
    Format {
        /// Input file; stdin when omitted
        file: Option<PathBuf>,

        /// Pretty-print with this many spaces per level, at most 255 (compact when omitted)
        #[arg(long)]
        indent: Option<u8>,

        /// Escape all non-ASCII characters
        #[arg(long)]
        ascii: bool,

        /// Maximum nesting depth
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Check that a document is valid JSON
    Check {
        /// Input file; stdin when omitted
        file: Option<PathBuf>,

        /// Maximum nesting depth
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Show version information
    Version,
}

fn main() -> ExitCode {
    logging::setup_logging();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Format {
            file,
            indent,
            ascii,
            max_depth,
        }) => {
            let format = match indent {
                Some(indent) => Format::Pretty {
                    indent: usize::from(indent),
                },
                None => Format::Compact,
            };
            let options = SerializeOptions {
                format,
                escape_non_ascii: ascii,
            };
            run_format(file.as_deref(), limits(max_depth), options)
        }
        Some(Commands::Check { file, max_depth }) => run_check(file.as_deref(), limits(max_depth)),
        Some(Commands::Version) => {
            println!("json v{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        None => {
            println!("json v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for usage information");
            ExitCode::SUCCESS
        }
    }
}

fn limits(max_depth: Option<usize>) -> Limits {
    match max_depth {
        Some(depth) => Limits::default().with_max_depth(depth),
        None => Limits::default(),
    }
}

fn run_format(file: Option<&Path>, limits: Limits, options: SerializeOptions) -> ExitCode {
    let value = match load(file, limits) {
        Ok(value) => value,
        Err(code) => return code,
    };

    let mut stdout = io::stdout().lock();
    let written = json::to_writer_with_options(&mut stdout, &value, options)
        .and_then(|()| Ok(stdout.write_all(b"\n")?));
    match written {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ json::Error::Io { .. }) => {
            io_failure(&anyhow::Error::new(e).context("failed to write stdout"))
        }
        Err(e) => {
            eprintln!("error[{}]: {e}", e.code());
            ExitCode::from(EXIT_INVALID)
        }
    }
}

fn run_check(file: Option<&Path>, limits: Limits) -> ExitCode {
    match load(file, limits) {
        Ok(_) => {
            println!("ok");
            ExitCode::SUCCESS
        }
        Err(code) => code,
    }
}

/// Read and parse the input, reporting failures on stderr.
fn load(file: Option<&Path>, limits: Limits) -> Result<json::Value, ExitCode> {
    let (source, result) = match file {
        Some(path) => {
            let source = format!("file `{}`", path.display());
            let file = File::open(path)
                .with_context(|| format!("failed to read {source}"))
                .map_err(|e| io_failure(&e))?;
            let result = json::from_reader_with_limits(BufReader::new(file), limits);
            (source, result)
        }
        None => {
            let result = json::from_reader_with_limits(io::stdin().lock(), limits);
            ("stdin".to_string(), result)
        }
    };
    debug!(%source, ok = result.is_ok(), "loaded input");

    match result {
        Ok(value) => Ok(value),
        Err(json::Error::Parse(e)) => {
            report(&e);
            Err(ExitCode::from(EXIT_INVALID))
        }
        Err(e @ json::Error::Io { .. }) => Err(io_failure(
            &anyhow::Error::new(e).context(format!("failed to read {source}")),
        )),
        Err(e) => {
            eprintln!("error[{}]: {e}", e.code());
            Err(ExitCode::from(EXIT_INVALID))
        }
    }
}

fn io_failure(err: &anyhow::Error) -> ExitCode {
    error!("input/output failure");
    eprintln!("error: {err:#}");
    ExitCode::from(EXIT_IO)
}

fn report(err: &ParseError) {
    eprintln!(
        "error[{}]: {} at line {}, column {}",
        err.code(),
        err.message(),
        err.line(),
        err.column()
    );
    if !err.snippet().is_empty() {
        eprintln!("  --> {}", err.snippet());
    }
}
