// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! palantir - bounded resource pool simulator CLI

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use commands::{run, strategies};
use error::CliError;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "palantir",
    version,
    about = "Palantiri - beings sharing a bounded pool of seeing-stones"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation
    Run(run::RunArgs),
    /// List palantiri and being strategies
    Strategies(strategies::StrategiesArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => run::handle(args).await,
        Commands::Strategies(args) => strategies::handle(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<CliError>() {
                Some(err) => eprint!("{}", err),
                None => eprintln!("error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout carries only reports and snapshots
fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
