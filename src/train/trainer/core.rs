//! Core trainer struct and provider wiring

use crate::adapt::AdaptProviders;
use crate::config::MartConfig;
use crate::data::{BatchProvider, SplitProviders};
use crate::io::MetricsSink;
use crate::optim::MilestoneLR;
use crate::train::MartLoss;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

/// Providers for one run
///
/// Only the training provider is mutable: it reshuffles at every epoch.
pub struct TrainProviders<'a> {
    pub train: &'a mut dyn BatchProvider,
    pub val: &'a dyn BatchProvider,
    pub test: &'a dyn BatchProvider,
}

impl TrainProviders<'_> {
    /// Read-only view handed to the adaptation hook
    pub fn adapt(&self) -> AdaptProviders<'_> {
        AdaptProviders {
            train: &*self.train,
            val: self.val,
            test: self.test,
        }
    }
}

impl<'a> From<&'a mut SplitProviders> for TrainProviders<'a> {
    fn from(splits: &'a mut SplitProviders) -> Self {
        Self {
            train: &mut splits.train,
            val: &splits.val,
            test: &splits.test,
        }
    }
}

impl std::fmt::Debug for TrainProviders<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainProviders")
            .field("train", &self.train.len())
            .field("val", &self.val.len())
            .field("test", &self.test.len())
            .finish()
    }
}

/// Adversarial trainer minimizing the MART objective
///
/// The trainer owns the randomness of a run. Attack noise, shuffling and
/// augmentation draw from one generator seeded with `training.seed`.
pub struct MartTrainer<H> {
    pub(crate) config: MartConfig,
    pub(crate) hook: H,
    pub(crate) loss: MartLoss,
    pub(crate) scheduler: MilestoneLR,
    pub(crate) rng: StdRng,
    pub(crate) sink: Option<MetricsSink>,
    pub(crate) checkpoints: Option<(PathBuf, usize)>,
    /// Optimizer steps taken since construction
    pub(crate) global_step: usize,
}

impl<H> MartTrainer<H> {
    /// Create a trainer calling `hook` after every optimizer step
    pub fn new(config: MartConfig, hook: H) -> Self {
        let loss = MartLoss::new(config.training.beta);
        let scheduler = MilestoneLR::mart(config.optimizer.lr);
        let rng = StdRng::seed_from_u64(config.training.seed);
        Self {
            config,
            hook,
            loss,
            scheduler,
            rng,
            sink: None,
            checkpoints: None,
            global_step: 0,
        }
    }

    /// Rewrite the epoch history through `sink` after every epoch
    pub fn with_metrics_sink(mut self, sink: MetricsSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Save model parameters into `dir` every `every` epochs (0 disables)
    pub fn with_checkpoints(mut self, dir: impl Into<PathBuf>, every: usize) -> Self {
        self.checkpoints = Some((dir.into(), every));
        self
    }

    pub fn config(&self) -> &MartConfig {
        &self.config
    }

    pub fn hook(&self) -> &H {
        &self.hook
    }

    pub fn global_step(&self) -> usize {
        self.global_step
    }

    /// Learning rate used during `epoch`
    pub fn lr_at(&self, epoch: usize) -> f32 {
        self.scheduler.lr_at(epoch)
    }
}

impl<H> std::fmt::Debug for MartTrainer<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MartTrainer")
            .field("beta", &self.loss.beta())
            .field("epochs", &self.config.training.epochs)
            .field("global_step", &self.global_step)
            .field("checkpoints", &self.checkpoints)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapt::NoAdaptation;
    use crate::data::{InMemoryProvider, LabeledImages};
    use ndarray::Array4;

    fn provider(n: usize) -> InMemoryProvider {
        let data = LabeledImages::new(Array4::zeros((n, 1, 2, 2)), vec![0; n]).unwrap();
        InMemoryProvider::sequential(data, 2)
    }

    #[test]
    fn test_lr_follows_milestones() {
        let config = MartConfig::default().with_lr(0.01);
        let trainer = MartTrainer::new(config, NoAdaptation);
        approx::assert_relative_eq!(trainer.lr_at(1), 0.01, max_relative = 1e-5);
        approx::assert_relative_eq!(trainer.lr_at(74), 0.01, max_relative = 1e-5);
        approx::assert_relative_eq!(trainer.lr_at(80), 0.001, max_relative = 1e-5);
        approx::assert_relative_eq!(trainer.lr_at(95), 1e-4, max_relative = 1e-5);
        approx::assert_relative_eq!(trainer.lr_at(120), 1e-5, max_relative = 1e-5);
    }

    #[test]
    fn test_adapt_view_shares_providers() {
        let mut train = provider(4);
        let val = provider(3);
        let test = provider(1);
        let providers = TrainProviders {
            train: &mut train,
            val: &val,
            test: &test,
        };
        let view = providers.adapt();
        assert_eq!(view.train.len(), 4);
        assert_eq!(view.val.len(), 3);
        assert_eq!(view.test.len(), 1);
    }

    #[test]
    fn test_builders() {
        let trainer = MartTrainer::new(MartConfig::default(), NoAdaptation)
            .with_checkpoints("ckpt", 5)
            .with_metrics_sink(MetricsSink::in_dir("log"));
        assert_eq!(trainer.checkpoints, Some((PathBuf::from("ckpt"), 5)));
        assert!(trainer.sink.is_some());
        assert_eq!(trainer.global_step(), 0);
    }
}
