#![deny(missing_docs)]

//! # CDD Validate
//!
//! Command Line Interface for the OpenAPI interaction validator.
//!
//! Supported Commands:
//! - `validate`: Validates a request/response fixture against a contract.
//! - `resolve`: Shows which operation a request path and method resolve to.
//!
//! Exit codes: `0` no errors, `1` validation errors (or no operation
//! resolved), `2` the contract, fixture or configuration could not be used.

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::error::CliResult;

mod error;
mod fixture;
mod logging;
mod resolve;
mod validate;

#[derive(Parser, Debug)]
#[clap(author, version, about = "OpenAPI interaction validator")]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv). `RUST_LOG` overrides it.
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate an interaction fixture against a contract.
    Validate(validate::ValidateArgs),
    /// Resolve a request path and method to a declared operation.
    Resolve(resolve::ResolveArgs),
}

/// Runs the command; `Ok(false)` means the interaction did not pass.
fn run(cli: &Cli) -> CliResult<bool> {
    match &cli.command {
        Commands::Validate(args) => {
            let report = validate::execute(args)?;
            println!("{}", validate::render(&report, args.format)?);
            Ok(!report.has_errors())
        }
        Commands::Resolve(args) => {
            let (rendered, found) = resolve::execute(args)?;
            println!("{}", rendered);
            Ok(found)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}", e);
    }

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::from(2)
        }
    }
}
