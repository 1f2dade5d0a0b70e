//! CLI entry point: parses arguments, configures logging and the rayon
//! thread pool, and dispatches to the `pq`/`crt`/`demo`/`bench` subcommands.
//!
//! Exit codes: 0 on a found solution, 1 on `NoSolution`, 2 on malformed
//! input or any other failure.

mod cli;

use clap::Parser;
use std::process::ExitCode;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> ExitCode {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt().json().with_target(false).init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let parsed = cli::Cli::parse();
    cli::configure_rayon(parsed.threads);

    match cli::run(parsed) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            match err.downcast_ref::<cli::CliError>() {
                Some(cli::CliError::NoSolution) => ExitCode::from(1),
                _ => ExitCode::from(2),
            }
        }
    }
}
