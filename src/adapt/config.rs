//! GAdaptor configuration

use crate::config::deserialize_bool_lenient;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Objective used to score candidate models on validation batches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum MetaLoss {
    /// Cross entropy on adversarial validation examples
    #[default]
    #[serde(rename = "CE", alias = "ce")]
    #[value(name = "ce")]
    CrossEntropy,
    /// KL between natural and adversarial predictions
    #[serde(rename = "kl", alias = "KL")]
    #[value(name = "kl")]
    Kl,
}

/// Fill value for momentum buffers of restored parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MomentumInit {
    #[default]
    Zero,
    One,
    /// Uniform in [-1, 1]
    Random,
}

/// Schedule and policy of the adaptation hook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptorConfig {
    /// Run the adaptor at all; `false` trains with the pass-through hook
    #[serde(deserialize_with = "deserialize_bool_lenient")]
    pub enabled: bool,
    /// Optimizer steps per gap
    pub gap: usize,
    /// Gaps per epoch, counted from the epoch's first step
    pub num_gaps: usize,
    /// First epoch at which gaps open
    pub meta_start_epoch: usize,
    /// Epoch from which the adaptor stays dormant
    #[serde(alias = "train_mode_epoch")]
    pub stop_epoch: usize,
    /// Restore layer by layer instead of the whole model
    #[serde(deserialize_with = "deserialize_bool_lenient")]
    pub layer_wise: bool,
    /// Refill momentum of restored parameters instead of copying the snapshot's
    #[serde(deserialize_with = "deserialize_bool_lenient")]
    pub reinitialize: bool,
    pub initialize_type: MomentumInit,
    /// Validation batches scored per comparison
    pub times: usize,
    pub meta_loss: MetaLoss,
}

impl Default for AdaptorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            gap: 100,
            num_gaps: 4,
            meta_start_epoch: 50,
            stop_epoch: 150,
            layer_wise: true,
            reinitialize: false,
            initialize_type: MomentumInit::Zero,
            times: 2,
            meta_loss: MetaLoss::CrossEntropy,
        }
    }
}

impl AdaptorConfig {
    pub fn with_gap(mut self, gap: usize, num_gaps: usize) -> Self {
        self.gap = gap;
        self.num_gaps = num_gaps;
        self
    }

    /// Active window `[meta_start_epoch, stop_epoch)`
    pub fn with_window(mut self, meta_start_epoch: usize, stop_epoch: usize) -> Self {
        self.meta_start_epoch = meta_start_epoch;
        self.stop_epoch = stop_epoch;
        self
    }

    pub fn with_layer_wise(mut self, layer_wise: bool) -> Self {
        self.layer_wise = layer_wise;
        self
    }

    pub fn with_reinitialize(mut self, init: MomentumInit) -> Self {
        self.reinitialize = true;
        self.initialize_type = init;
        self
    }

    pub fn with_times(mut self, times: usize) -> Self {
        self.times = times;
        self
    }

    pub fn with_meta_loss(mut self, meta_loss: MetaLoss) -> Self {
        self.meta_loss = meta_loss;
        self
    }

    /// Steps covered by one epoch's gaps
    pub fn steps_per_epoch(&self) -> usize {
        self.gap * self.num_gaps
    }
}
