//! White-box PGD evaluation attack

use super::norm::{batch_len, Norm};
use super::perturb::projected_ascent;
use crate::nn::Classifier;
use crate::train::CrossEntropyLoss;
use ndarray::Array4;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Error counts for one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchErrors {
    /// Misclassified natural inputs
    pub natural: usize,
    /// Misclassified adversarial inputs
    pub robust: usize,
    /// Samples evaluated
    pub count: usize,
}

impl AddAssign for BatchErrors {
    fn add_assign(&mut self, other: Self) {
        self.natural += other.natural;
        self.robust += other.robust;
        self.count += other.count;
    }
}

/// Cross-entropy PGD with a uniform random start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PgdWhitebox {
    pub epsilon: f32,
    pub step_size: f32,
    pub num_steps: usize,
    pub norm: Norm,
}

impl Default for PgdWhitebox {
    fn default() -> Self {
        Self {
            epsilon: 0.031,
            step_size: 0.003,
            num_steps: 20,
            norm: Norm::LInf,
        }
    }
}

impl PgdWhitebox {
    pub fn new(epsilon: f32, step_size: f32, num_steps: usize, norm: Norm) -> Self {
        Self {
            epsilon,
            step_size,
            num_steps,
            norm,
        }
    }

    /// Adversarial version of `x` maximizing cross entropy
    pub fn attack<M, R>(
        &self,
        model: &M,
        x: &Array4<f32>,
        y: &[usize],
        rng: &mut R,
    ) -> Array4<f32>
    where
        M: Classifier + ?Sized,
        R: Rng + ?Sized,
    {
        projected_ascent(
            model,
            x,
            y,
            &CrossEntropyLoss,
            self.epsilon,
            self.step_size,
            self.num_steps,
            self.norm,
            rng,
        )
    }

    /// Count natural and adversarial errors on one batch
    pub fn evaluate_batch<M, R>(
        &self,
        model: &M,
        x: &Array4<f32>,
        y: &[usize],
        rng: &mut R,
    ) -> BatchErrors
    where
        M: Classifier + ?Sized,
        R: Rng + ?Sized,
    {
        assert_eq!(
            batch_len(x),
            y.len(),
            "Inputs and labels must have same batch size"
        );
        let natural = count_errors(&model.predict(x), y);
        let adversarial = self.attack(model, x, y, rng);
        let robust = count_errors(&model.predict(&adversarial), y);
        BatchErrors {
            natural,
            robust,
            count: y.len(),
        }
    }
}

fn count_errors(predictions: &[usize], targets: &[usize]) -> usize {
    predictions
        .iter()
        .zip(targets)
        .filter(|(p, t)| p != t)
        .count()
}
