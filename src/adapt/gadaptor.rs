//! Validation-guided state restoration
//!
//! The adaptor splits the first `gap * num_gaps` optimizer steps of every active
//! epoch into gaps. Each gap opens with a snapshot of the model and optimizer;
//! when it closes, the snapshot and the current state are scored on validation
//! batches and training continues from whichever is better (per layer, in
//! layer-wise mode).

use super::config::AdaptorConfig;
use super::hook::{AdaptPhase, AdaptProviders, AdaptStats, AdaptationHook};
use super::meta::{refill_slots, score};
use crate::attack::MartPerturbation;
use crate::nn::Classifier;
use crate::optim::Optimizer;
use crate::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

/// Snapshot taken when a gap opens
struct OpenGap<M, O> {
    index: usize,
    opened_at: usize,
    model: M,
    optimizer: O,
}

/// Adaptation hook restoring earlier model state when validation prefers it
pub struct GAdaptor<M, O> {
    config: AdaptorConfig,
    attack: MartPerturbation,
    seed: u64,
    rng: StdRng,
    epoch: Option<usize>,
    steps_in_epoch: usize,
    open: Option<OpenGap<M, O>>,
    phase: AdaptPhase,
    stats: AdaptStats,
}

impl<M, O> GAdaptor<M, O>
where
    M: Classifier + Clone,
    O: Optimizer + Clone,
{
    /// `attack` crafts the adversarial validation inputs used by the meta loss
    pub fn new(config: AdaptorConfig, attack: MartPerturbation, seed: u64) -> Self {
        assert!(config.gap > 0, "Adaptor gap must be positive");
        Self {
            config,
            attack,
            seed,
            rng: StdRng::seed_from_u64(seed),
            epoch: None,
            steps_in_epoch: 0,
            open: None,
            phase: AdaptPhase::PreStart,
            stats: AdaptStats::default(),
        }
    }

    pub fn config(&self) -> &AdaptorConfig {
        &self.config
    }

    /// Phase after the most recent call
    pub fn phase(&self) -> AdaptPhase {
        self.phase
    }

    /// Meta loss of `model`; every candidate of one comparison sees the same noise
    fn score_with(&self, model: &M, providers: &AdaptProviders<'_>, seed: u64) -> Option<f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        score(
            model,
            providers.val,
            self.config.times,
            self.config.meta_loss,
            &self.attack,
            &mut rng,
        )
    }

    fn close_gap(
        &mut self,
        gap: OpenGap<M, O>,
        model: M,
        optimizer: O,
        providers: &AdaptProviders<'_>,
    ) -> (M, O) {
        self.stats.gaps_closed += 1;
        let seed = self.seed.wrapping_add(self.stats.gaps_closed as u64);

        let Some(current) = self.score_with(&model, providers, seed) else {
            warn!("Validation provider yielded no batches; keeping current model");
            return (model, optimizer);
        };

        if self.config.layer_wise {
            self.restore_layers(gap, model, optimizer, providers, seed, current)
        } else {
            self.restore_whole(gap, model, optimizer, providers, seed, current)
        }
    }

    fn restore_whole(
        &mut self,
        gap: OpenGap<M, O>,
        model: M,
        optimizer: O,
        providers: &AdaptProviders<'_>,
        seed: u64,
        current: f32,
    ) -> (M, O) {
        let snapshot = self.score_with(&gap.model, providers, seed);
        debug!(gap = gap.index, current, ?snapshot, "Closing gap");
        match snapshot {
            Some(s) if s < current => {
                let OpenGap {
                    model: restored,
                    optimizer: mut restored_opt,
                    ..
                } = gap;
                restored_opt.bind(restored.param_set());
                restored_opt.set_lr(optimizer.lr());
                if self.config.reinitialize {
                    let all: Vec<usize> = (0..restored.params().len()).collect();
                    refill_slots(
                        &restored,
                        &mut restored_opt,
                        &all,
                        self.config.initialize_type,
                        &mut self.rng,
                    );
                }
                self.stats.interventions += 1;
                info!(
                    epoch = self.epoch,
                    from = current,
                    to = s,
                    "Restored model from gap start"
                );
                (restored, restored_opt)
            }
            _ => (model, optimizer),
        }
    }

    fn restore_layers(
        &mut self,
        gap: OpenGap<M, O>,
        model: M,
        mut optimizer: O,
        providers: &AdaptProviders<'_>,
        seed: u64,
        current: f32,
    ) -> (M, O) {
        let mut candidate = model.clone();
        let mut best = current;
        let mut swapped = Vec::new();
        let mut layers = 0;

        for layer in 0..candidate.num_layers() {
            let indices: Vec<usize> = candidate
                .params()
                .iter()
                .enumerate()
                .filter(|(_, p)| p.layer() == layer)
                .map(|(i, _)| i)
                .collect();
            if indices.is_empty() {
                continue;
            }

            let saved: Vec<_> = {
                let snapshot = gap.model.params();
                let mut params = candidate.params_mut();
                indices
                    .iter()
                    .map(|&i| {
                        let restored = snapshot[i].value().clone();
                        std::mem::replace(params[i].value_mut(), restored)
                    })
                    .collect()
            };

            match self.score_with(&candidate, providers, seed) {
                Some(s) if s < best => {
                    debug!(gap = gap.index, layer, from = best, to = s, "Restored layer");
                    best = s;
                    swapped.extend_from_slice(&indices);
                    layers += 1;
                }
                _ => {
                    let mut params = candidate.params_mut();
                    for (&i, value) in indices.iter().zip(saved) {
                        *params[i].value_mut() = value;
                    }
                }
            }
        }

        if swapped.is_empty() {
            debug!(gap = gap.index, current, "No layer improved; keeping current model");
            return (model, optimizer);
        }

        optimizer.bind(candidate.param_set());
        if self.config.reinitialize {
            refill_slots(
                &candidate,
                &mut optimizer,
                &swapped,
                self.config.initialize_type,
                &mut self.rng,
            );
        } else {
            let param_count = candidate.params().len();
            let snapshot_slots = gap.optimizer.slots();
            let slots = optimizer.slots_mut();
            if slots.len() < param_count {
                slots.resize(param_count, None);
            }
            for &i in &swapped {
                slots[i] = snapshot_slots.get(i).cloned().flatten();
            }
        }

        self.stats.interventions += 1;
        self.stats.layers_restored += layers;
        info!(
            epoch = self.epoch,
            layers,
            from = current,
            to = best,
            "Restored layers from gap start"
        );
        (candidate, optimizer)
    }
}

impl<M, O> AdaptationHook<M, O> for GAdaptor<M, O>
where
    M: Classifier + Clone,
    O: Optimizer + Clone,
{
    fn take_step(
        &mut self,
        epoch: usize,
        model: M,
        optimizer: O,
        providers: &AdaptProviders<'_>,
    ) -> Result<(M, O)> {
        if epoch >= self.config.stop_epoch {
            if self.phase != AdaptPhase::Dormant {
                debug!(epoch, "Adaptor dormant");
                self.open = None;
                self.phase = AdaptPhase::Dormant;
            }
            return Ok((model, optimizer));
        }
        if epoch < self.config.meta_start_epoch {
            self.phase = AdaptPhase::PreStart;
            return Ok((model, optimizer));
        }

        if self.epoch != Some(epoch) {
            if let Some(gap) = self.open.take() {
                debug!(gap = gap.index, "Epoch ended inside a gap; snapshot discarded");
            }
            self.epoch = Some(epoch);
            self.steps_in_epoch = 0;
        }
        let step = self.steps_in_epoch;
        self.steps_in_epoch += 1;

        let gap_len = self.config.gap;
        let (mut model, mut optimizer) = (model, optimizer);

        if let Some(gap) = self.open.take() {
            if step == gap.opened_at + gap_len {
                (model, optimizer) = self.close_gap(gap, model, optimizer, providers);
            } else {
                self.open = Some(gap);
            }
        }

        if self.open.is_none() && step % gap_len == 0 && step / gap_len < self.config.num_gaps {
            self.open = Some(OpenGap {
                index: step / gap_len,
                opened_at: step,
                model: model.clone(),
                optimizer: optimizer.clone(),
            });
            self.stats.gaps_opened += 1;
        }

        self.phase = match &self.open {
            Some(gap) => AdaptPhase::ActiveGap {
                gap: gap.index,
                step: step - gap.opened_at,
            },
            None => AdaptPhase::BetweenGaps,
        };
        Ok((model, optimizer))
    }

    fn stats(&self) -> AdaptStats {
        self.stats
    }
}

impl<M, O> std::fmt::Debug for GAdaptor<M, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GAdaptor")
            .field("config", &self.config)
            .field("epoch", &self.epoch)
            .field("steps_in_epoch", &self.steps_in_epoch)
            .field("phase", &self.phase)
            .field("stats", &self.stats)
            .finish()
    }
}
