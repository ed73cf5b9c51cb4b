//! Training step operations

use super::core::MartTrainer;
use super::result::StepLoss;
use crate::adapt::{AdaptProviders, AdaptationHook};
use crate::data::Batch;
use crate::nn::Classifier;
use crate::optim::{ensure_bound, Optimizer};
use crate::{Error, Result};

impl<H> MartTrainer<H> {
    /// Perform a single MART step and hand the result to the hook
    ///
    /// Crafts adversarial inputs against the current model, backpropagates the
    /// MART loss through both the natural and adversarial logits, steps the
    /// optimizer, then lets the hook decide which model and optimizer continue.
    ///
    /// # Errors
    ///
    /// [`Error::NonFiniteLoss`] when the objective is NaN or infinite, and
    /// [`Error::StaleOptimizer`] when the optimizer is not bound to the model
    /// either before the step or after the hook returns.
    pub fn train_step<M, O>(
        &mut self,
        epoch: usize,
        batch: &Batch,
        mut model: M,
        mut optimizer: O,
        providers: &AdaptProviders<'_>,
    ) -> Result<(M, O, StepLoss)>
    where
        M: Classifier,
        O: Optimizer,
        H: AdaptationHook<M, O>,
    {
        ensure_bound(&model, &optimizer)?;

        let adversarial =
            self.config
                .attack
                .perturb(&model, &batch.inputs, &batch.targets, &mut self.rng);

        let out = self.loss.forward(
            &model.forward(&batch.inputs),
            &model.forward(&adversarial),
            &batch.targets,
        );
        if !out.loss.is_finite() {
            return Err(Error::NonFiniteLoss {
                epoch,
                step: self.global_step,
                value: out.loss,
            });
        }

        optimizer.zero_grad(&mut model.params_mut());
        let natural = model.backward(&batch.inputs, &out.grad_natural);
        let robust = model.backward(&adversarial, &out.grad_adversarial);
        model.accumulate(natural.params);
        model.accumulate(robust.params);
        optimizer.step(&mut model.params_mut());
        self.global_step += 1;

        let (model, optimizer) = self.hook.take_step(epoch, model, optimizer, providers)?;
        ensure_bound(&model, &optimizer)?;

        Ok((
            model,
            optimizer,
            StepLoss {
                loss: out.loss,
                adversarial: out.adversarial,
                robust: out.robust,
            },
        ))
    }
}
