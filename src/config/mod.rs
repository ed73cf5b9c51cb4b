//! Run configuration
//!
//! A [`MartConfig`] is read from YAML, adjusted by CLI overrides, then checked by
//! [`validate_config`] before any dataset is opened. [`train_from_config`] turns a
//! configuration into a finished run.

mod builder;
pub mod cli;
mod loader;
mod schema;
mod train;
mod validate;

pub use builder::{build_hook, build_model, build_optimizer, DynHook};
pub use cli::{
    apply_overrides, parse_args, Cli, Command, InfoArgs, OutputFormat, TrainArgs, ValidateArgs,
};
pub use loader::{load_config, parse_config, to_yaml};
pub(crate) use schema::deserialize_bool_lenient;
pub use schema::{DataSpec, EvalSpec, MartConfig, ModelSpec, OptimSpec, OutputSpec, TrainingSpec};
pub use train::{train_from_config, train_from_yaml};
pub use validate::{validate_config, ValidationError};
