//! Error types for adversarial training runs
//!
//! Every failure is fatal at a boundary: dataset problems abort before the first
//! epoch, a non-finite loss or a stale optimizer binding abort the step that saw it.

use crate::config::ValidationError;
use crate::nn::ParamSetId;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for blindaje operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring, training or evaluating
#[derive(Debug, Error)]
pub enum Error {
    /// Dataset artifact is missing.
    #[error("Dataset not found: {path}\n  → Generate the validation split file or pass --dataset")]
    DatasetNotFound { path: PathBuf },

    /// Dataset artifact exists but cannot be decoded.
    #[error("Invalid dataset {path}: {message}")]
    Dataset { path: PathBuf, message: String },

    /// Configuration failed validation.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ValidationError),

    /// Configuration file could not be read or parsed.
    #[error("Config error: {0}")]
    ConfigFile(String),

    /// Loss became NaN or infinite.
    #[error("Non-finite loss {value} at epoch {epoch}, step {step}")]
    NonFiniteLoss { epoch: usize, step: usize, value: f32 },

    /// Optimizer is bound to a parameter set other than the model's.
    #[error(
        "Optimizer bound to parameter set {optimizer:?} but model owns {model}\n  → An adaptation hook returned a model without rebinding its optimizer"
    )]
    StaleOptimizer {
        optimizer: Option<ParamSetId>,
        model: ParamSetId,
    },

    /// Array shapes disagree.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Reflect padding reaches past the opposite edge of the image.
    #[error("Reflect padding {pad} must be smaller than the {height}x{width} image\n  → Lower data.pad")]
    Padding {
        pad: usize,
        height: usize,
        width: usize,
    },

    /// Serialization / deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
