//! The adaptation hook contract

use crate::data::BatchProvider;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Shared read access to the run's batch providers
#[derive(Clone, Copy)]
pub struct AdaptProviders<'a> {
    pub train: &'a dyn BatchProvider,
    pub val: &'a dyn BatchProvider,
    pub test: &'a dyn BatchProvider,
}

impl std::fmt::Debug for AdaptProviders<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptProviders")
            .field("train", &self.train.len())
            .field("val", &self.val.len())
            .field("test", &self.test.len())
            .finish()
    }
}

/// Where the hook sits in its schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdaptPhase {
    /// Before `meta_start_epoch`
    PreStart,
    /// Gap `gap` is open and `step` optimizer steps have run since it opened
    ActiveGap { gap: usize, step: usize },
    /// This epoch's gaps are used up
    BetweenGaps,
    /// At or past `stop_epoch`
    Dormant,
}

/// Counters reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptStats {
    pub gaps_opened: usize,
    pub gaps_closed: usize,
    /// Gaps that ended with a replaced model
    pub interventions: usize,
    /// Individual layers restored in layer-wise mode
    pub layers_restored: usize,
}

/// Hook invoked after every optimizer step
///
/// The hook owns the model and optimizer for the duration of the call and hands
/// back whichever pair training should continue with. The returned optimizer must
/// be bound to the returned model's parameter set.
pub trait AdaptationHook<M, O> {
    fn take_step(
        &mut self,
        epoch: usize,
        model: M,
        optimizer: O,
        providers: &AdaptProviders<'_>,
    ) -> Result<(M, O)>;

    fn stats(&self) -> AdaptStats {
        AdaptStats::default()
    }
}

impl<M, O, H> AdaptationHook<M, O> for Box<H>
where
    H: AdaptationHook<M, O> + ?Sized,
{
    fn take_step(
        &mut self,
        epoch: usize,
        model: M,
        optimizer: O,
        providers: &AdaptProviders<'_>,
    ) -> Result<(M, O)> {
        (**self).take_step(epoch, model, optimizer, providers)
    }

    fn stats(&self) -> AdaptStats {
        (**self).stats()
    }
}

/// Pass-through hook
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAdaptation;

impl<M, O> AdaptationHook<M, O> for NoAdaptation {
    fn take_step(
        &mut self,
        _epoch: usize,
        model: M,
        optimizer: O,
        _providers: &AdaptProviders<'_>,
    ) -> Result<(M, O)> {
        Ok((model, optimizer))
    }
}
