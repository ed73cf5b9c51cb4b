//! Epoch-level training

use super::core::{MartTrainer, TrainProviders};
use super::result::EpochReport;
use crate::adapt::AdaptationHook;
use crate::nn::Classifier;
use crate::optim::Optimizer;
use crate::Result;
use std::time::Instant;
use tracing::{info, warn};

impl<H> MartTrainer<H> {
    /// Train for one epoch, `epoch` counting from 0
    ///
    /// Sets the scheduled learning rate, reshuffles the training provider and runs
    /// [`MartTrainer::train_step`] on every batch. Returns the pair training ended
    /// the epoch with.
    pub fn train_epoch<M, O>(
        &mut self,
        epoch: usize,
        model: M,
        mut optimizer: O,
        providers: &mut TrainProviders<'_>,
    ) -> Result<(M, O, EpochReport)>
    where
        M: Classifier,
        O: Optimizer,
        H: AdaptationHook<M, O>,
    {
        let start = Instant::now();
        self.scheduler.set_epoch(epoch);
        self.scheduler.apply(&mut optimizer);
        let lr = optimizer.lr();

        providers.train.new_epoch(&mut self.rng);
        let view = providers.adapt();
        let num_batches = view.train.num_batches();
        let log_interval = self.config.training.log_interval;

        let mut model = model;
        let mut steps = 0;
        let mut seen = 0;
        let mut total_loss = 0.0;
        let mut total_adversarial = 0.0;
        let mut total_robust = 0.0;

        for (i, batch) in view.train.batches().enumerate() {
            if batch.is_empty() {
                warn!(epoch, batch = i, "Skipping empty training batch");
                continue;
            }
            let (m, o, loss) = self.train_step(epoch, &batch, model, optimizer, &view)?;
            model = m;
            optimizer = o;

            steps += 1;
            seen += batch.size();
            total_loss += loss.loss;
            total_adversarial += loss.adversarial;
            total_robust += loss.robust;

            if log_interval > 0 && (i + 1) % log_interval == 0 {
                info!(
                    "Train Epoch: {} [{}/{} ({:.0}%)] loss={:.6}",
                    epoch,
                    seen,
                    view.train.len(),
                    100.0 * (i + 1) as f32 / num_batches.max(1) as f32,
                    total_loss / steps as f32
                );
            }
        }

        if steps == 0 {
            warn!(epoch, "Training provider yielded no batches");
        }
        let mean = |total: f32| if steps > 0 { total / steps as f32 } else { 0.0 };
        let report = EpochReport {
            epoch,
            steps,
            mean_loss: mean(total_loss),
            mean_adversarial: mean(total_adversarial),
            mean_robust: mean(total_robust),
            lr,
            seconds: start.elapsed().as_secs_f64(),
        };
        Ok((model, optimizer, report))
    }
}
