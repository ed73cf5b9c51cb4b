//! CLI argument parsing
//!
//! # Usage
//!
//! ```bash
//! blindaje train --config run.yaml
//! blindaje train --dataset split.safetensors --epochs 10 --no-adapt
//! blindaje validate run.yaml
//! blindaje info run.yaml --format yaml
//! ```

mod core;
mod types;


pub use core::{apply_overrides, parse_args, Cli, Command, InfoArgs, TrainArgs, ValidateArgs};
pub use types::OutputFormat;
