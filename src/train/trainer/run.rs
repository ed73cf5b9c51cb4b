//! Multi-epoch training with evaluation, metrics and checkpoints

use super::core::{MartTrainer, TrainProviders};
use super::result::RunSummary;
use crate::adapt::AdaptationHook;
use crate::eval::evaluate_whitebox;
use crate::io::{checkpoint_path, save_checkpoint, EpochHistory, EpochRecord};
use crate::nn::Classifier;
use crate::optim::Optimizer;
use crate::Result;
use std::time::Instant;
use tracing::info;

impl<H> MartTrainer<H> {
    /// Train for `training.epochs` epochs
    ///
    /// Epochs are indexed from 0 for the learning-rate schedule and the hook, so
    /// the default milestones leave the first 75 epochs at the base rate. Logs and
    /// checkpoint names use the 1-based epoch number.
    ///
    /// After every epoch the model is attacked on the test provider with the
    /// evaluation PGD, the history is rewritten through the metrics sink (if any)
    /// and a checkpoint is saved when the epoch number is a multiple of the save
    /// frequency.
    pub fn run<M, O>(
        &mut self,
        model: M,
        optimizer: O,
        providers: &mut TrainProviders<'_>,
    ) -> Result<RunSummary<M, O>>
    where
        M: Classifier,
        O: Optimizer,
        H: AdaptationHook<M, O>,
    {
        let start = Instant::now();
        let pgd = self.config.pgd();
        let epochs = self.config.training.epochs;
        let seed = self.config.training.seed;
        let mut history = EpochHistory::new();
        let mut model = model;
        let mut optimizer = optimizer;

        info!(
            epochs,
            train = providers.train.len(),
            val = providers.val.len(),
            test = providers.test.len(),
            "Starting MART training"
        );

        for epoch in 0..epochs {
            let number = epoch + 1;
            let (m, o, report) = self.train_epoch(epoch, model, optimizer, providers)?;
            model = m;
            optimizer = o;

            let eval = evaluate_whitebox(&model, providers.test, &pgd, seed);
            info!(
                epoch = number,
                loss = report.mean_loss,
                lr = report.lr,
                natural_acc = eval.natural_acc(),
                robust_acc = eval.robust_acc(),
                secs = report.seconds,
                "Epoch finished"
            );
            history.push(EpochRecord {
                natural_acc: eval.natural_acc(),
                robust_acc: eval.robust_acc(),
                train_loss: report.mean_loss,
                lr: report.lr,
                seconds: report.seconds,
            });

            if let Some(sink) = &self.sink {
                sink.write(&history)?;
            }
            if let Some((dir, every)) = &self.checkpoints {
                if *every > 0 && number % every == 0 {
                    let path = checkpoint_path(dir, number);
                    save_checkpoint(&model, &path, number)?;
                    info!(path = %path.display(), "Saved checkpoint");
                }
            }
        }

        let adapt = self.hook.stats();
        if let Some((epoch, acc)) = history.best_robust() {
            info!(
                epoch,
                robust_acc = acc,
                interventions = adapt.interventions,
                "Training complete"
            );
        }
        Ok(RunSummary {
            model,
            optimizer,
            history,
            adapt,
            interventions: adapt.interventions,
            elapsed_secs: start.elapsed().as_secs_f64(),
        })
    }
}
