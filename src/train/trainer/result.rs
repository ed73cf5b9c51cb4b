//! Training result types

use crate::adapt::AdaptStats;
use crate::io::EpochHistory;
use serde::{Deserialize, Serialize};

/// Loss terms of one optimizer step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepLoss {
    /// Full objective
    pub loss: f32,
    /// Adversarial cross entropy plus margin
    pub adversarial: f32,
    /// Unweighted robust (KL) term
    pub robust: f32,
}

/// Summary of one training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochReport {
    /// Epoch index, counting from 0
    pub epoch: usize,
    /// Optimizer steps taken
    pub steps: usize,
    pub mean_loss: f32,
    pub mean_adversarial: f32,
    pub mean_robust: f32,
    /// Learning rate in effect
    pub lr: f32,
    pub seconds: f64,
}

/// Outcome of a full training run
#[derive(Debug, Clone)]
pub struct RunSummary<M, O> {
    /// Model training ended with
    pub model: M,
    /// Optimizer bound to `model`
    pub optimizer: O,
    pub history: EpochHistory,
    /// Hook counters at the end of the run
    pub adapt: AdaptStats,
    /// Gaps that ended with a replaced model
    pub interventions: usize,
    /// Total training time in seconds
    pub elapsed_secs: f64,
}
