//! Adversarial training
//!
//! - Loss functions: cross entropy, KL toward a frozen reference, and the MART
//!   objective
//! - [`MartTrainer`]: the epoch loop with per-step adaptation hooks
//!
//! # Example
//!
//! ```
//! use blindaje::train::{CrossEntropyLoss, LossFn};
//! use ndarray::arr2;
//!
//! let logits = arr2(&[[2.0, 0.5, -1.0]]);
//! let out = CrossEntropyLoss.forward(&logits, &[0]);
//! assert!(out.value > 0.0);
//! ```

mod loss;
mod trainer;

pub use loss::{
    cross_entropy_rows, kl_rows, log_softmax_rows, softmax_rows, CrossEntropyLoss, KlToReference,
    LossFn, LossOutput, MartLoss, MartOutput,
};
pub use trainer::{EpochReport, MartTrainer, RunSummary, StepLoss, TrainProviders};
