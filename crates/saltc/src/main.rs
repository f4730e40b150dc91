//! The Salt compiler driver (spec §4.H, §6), grounded in `snowc/src/
//! main.rs`'s `clap::Parser` + fallible `build()` + `process::exit`
//! shape, but over spec §6's flat positional `compiler [FILE.sl...]
//! [flags] [-o OUT]` surface rather than `snowc`'s project-directory
//! subcommand.

mod compile;
mod error;
mod link;
mod prelude;
mod report;

use std::path::PathBuf;
use std::process;

use clap::Parser;

use salt_common::CompilerOptions;
use error::DriverError;

#[derive(Parser)]
#[command(name = "saltc", version, about = "The Salt compiler")]
struct Cli {
    /// Source files to compile; every path must end in `.sl`.
    files: Vec<PathBuf>,

    /// Enable debug logging on the two debug streams.
    #[arg(long = "dbo")]
    dbo: bool,

    /// Enable verbose debug logging (implies `--dbo`).
    #[arg(long = "dbv")]
    dbv: bool,

    /// Skip prelude injection and platform-library linking.
    #[arg(long = "nostd")]
    nostd: bool,

    /// Output name (default `a`).
    #[arg(short = 'o')]
    output: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.dbo, cli.dbv);

    let options = CompilerOptions {
        verbose: cli.dbo || cli.dbv,
        verbose_verbose: cli.dbv,
        no_std: cli.nostd,
        output: cli.output.clone().unwrap_or_else(|| "a".to_string()),
    };

    match run(&cli.files, &options) {
        Ok(()) => process::exit(0),
        Err(DriverError::User(msg)) => {
            eprintln!("error: {msg}");
            process::exit(1);
        }
        Err(DriverError::Backend(msg)) => {
            eprintln!("error: {msg}");
            process::exit(2);
        }
    }
}

fn init_tracing(dbo: bool, dbv: bool) {
    let level = if dbv {
        tracing::Level::TRACE
    } else if dbo {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt().with_max_level(level).with_target(false).without_time().init();
}

/// The whole compile-then-link pipeline (spec §4.H, §5 "single-threaded,
/// each source file processed end-to-end before the next begins").
fn run(files: &[PathBuf], options: &CompilerOptions) -> Result<(), DriverError> {
    if files.is_empty() {
        return Err(DriverError::User("no input files".to_string()));
    }
    for file in files {
        if file.extension().and_then(|e| e.to_str()) != Some("sl") {
            return Err(DriverError::User(format!("input file '{}' does not end in .sl", file.display())));
        }
    }

    let mut object_files = Vec::new();
    let mut any_error = false;
    let mut entry_point_seen = false;

    for (i, file) in files.iter().enumerate() {
        let outcome = compile::compile_file((i + 1) as u32, file, options)?;
        if outcome.entry_point_seen {
            entry_point_seen = true;
        }
        if outcome.had_error {
            any_error = true;
        }
        if let Some(path) = outcome.object_path {
            object_files.push(path);
        }
    }

    let summary = if any_error {
        format!("compilation failed: {} of {} file(s) had errors", files.len() - object_files.len(), files.len())
    } else {
        format!("compilation succeeded: {} file(s) compiled", files.len())
    };
    eprintln!("{summary}");

    if any_error {
        cleanup(&object_files);
        return Err(DriverError::User("compilation failed due to errors above".to_string()));
    }
    if !entry_point_seen {
        cleanup(&object_files);
        return Err(DriverError::User("no main function found".to_string()));
    }

    let extension = options.output_extension();
    let output_path = if extension.is_empty() {
        PathBuf::from(&options.output)
    } else {
        PathBuf::from(format!("{}.{extension}", options.output))
    };

    link::link(&object_files, &output_path, options.no_std).map_err(DriverError::User)?;
    eprintln!("linked: {}", output_path.display());
    Ok(())
}

fn cleanup(objects: &[PathBuf]) {
    for object in objects {
        let _ = std::fs::remove_file(object);
    }
}
