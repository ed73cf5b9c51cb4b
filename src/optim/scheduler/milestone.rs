//! Piecewise-constant learning rate schedule

use super::LRScheduler;
use crate::optim::Optimizer;

/// Piecewise-constant schedule keyed by epoch
///
/// Formula: lr_t = lr_base * factor(m), where m is the last milestone with epoch <= t
/// (factor 1 before the first milestone).
#[derive(Debug, Clone)]
pub struct MilestoneLR {
    lr_base: f32,
    milestones: Vec<(usize, f32)>,
    current_epoch: usize,
}

impl MilestoneLR {
    /// Create a schedule from `(epoch, factor)` milestones
    ///
    /// Milestones are sorted by epoch; a later entry for the same epoch wins.
    pub fn new(lr_base: f32, mut milestones: Vec<(usize, f32)>) -> Self {
        milestones.sort_by_key(|&(epoch, _)| epoch);
        Self {
            lr_base,
            milestones,
            current_epoch: 0,
        }
    }

    /// The MART step schedule: ×0.1 from 75, ×0.01 from 90, ×0.001 from 100
    pub fn mart(lr_base: f32) -> Self {
        Self::new(lr_base, vec![(75, 0.1), (90, 0.01), (100, 0.001)])
    }

    pub fn base_lr(&self) -> f32 {
        self.lr_base
    }

    /// Learning rate for an arbitrary epoch
    pub fn lr_at(&self, epoch: usize) -> f32 {
        self.milestones
            .iter()
            .take_while(|&&(start, _)| start <= epoch)
            .last()
            .map_or(self.lr_base, |&(_, factor)| self.lr_base * factor)
    }

    /// Jump to `epoch`
    pub fn set_epoch(&mut self, epoch: usize) {
        self.current_epoch = epoch;
    }

    pub fn epoch(&self) -> usize {
        self.current_epoch
    }

    /// Apply the current learning rate to an optimizer
    pub fn apply<O: Optimizer + ?Sized>(&self, optimizer: &mut O) {
        optimizer.set_lr(self.get_lr());
    }
}

impl LRScheduler for MilestoneLR {
    fn get_lr(&self) -> f32 {
        self.lr_at(self.current_epoch)
    }

    fn step(&mut self) {
        self.current_epoch += 1;
    }
}
