//! Blindaje CLI
//!
//! # Usage
//!
//! ```bash
//! # Train with the default hyperparameters
//! blindaje train --dataset cifar10_validation_split.safetensors
//!
//! # Train from config with overrides
//! blindaje train --config mart.yaml --epochs 10 --layer-wise false
//!
//! # Validate config
//! blindaje validate mart.yaml
//!
//! # Show the resolved config
//! blindaje info mart.yaml --format yaml
//! ```

use blindaje::cli::{init_tracing, run_command, Cli, LogLevel};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(LogLevel::from_flags(cli.verbose, cli.quiet));

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
