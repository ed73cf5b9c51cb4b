//! Natural and robust accuracy under white-box PGD

use crate::attack::{BatchErrors, PgdWhitebox};
use crate::data::BatchProvider;
use crate::nn::Classifier;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Accumulated error counts over a full pass of a provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RobustnessReport {
    pub errors: BatchErrors,
}

impl RobustnessReport {
    /// Total samples evaluated
    pub fn total(&self) -> usize {
        self.errors.count
    }

    /// `1 − natural_errors / total`; 0 when nothing was evaluated
    pub fn natural_acc(&self) -> f32 {
        accuracy(self.errors.natural, self.errors.count)
    }

    /// `1 − robust_errors / total`; 0 when nothing was evaluated
    pub fn robust_acc(&self) -> f32 {
        accuracy(self.errors.robust, self.errors.count)
    }
}

fn accuracy(errors: usize, total: usize) -> f32 {
    if total == 0 {
        return 0.0;
    }
    1.0 - errors as f32 / total as f32
}

/// Attack every batch of `provider` in order and sum the error counts
///
/// The attack noise is drawn from a generator seeded with `seed`, so the same
/// model and data always give the same report.
pub fn evaluate_whitebox<M>(
    model: &M,
    provider: &dyn BatchProvider,
    pgd: &PgdWhitebox,
    seed: u64,
) -> RobustnessReport
where
    M: Classifier + ?Sized,
{
    let mut rng = StdRng::seed_from_u64(seed);
    let mut errors = BatchErrors::default();
    for batch in provider.batches() {
        errors += pgd.evaluate_batch(model, &batch.inputs, &batch.targets, &mut rng);
    }
    if errors.count == 0 {
        warn!("Evaluation provider yielded no samples");
    }
    debug!(
        natural = errors.natural,
        robust = errors.robust,
        total = errors.count,
        "White-box evaluation finished"
    );
    RobustnessReport { errors }
}
