//! KL divergence toward a fixed reference distribution

use super::cross_entropy::{entropy_terms, log_softmax_rows, softmax_rows};
use super::{LossFn, LossOutput};
use ndarray::{Array2, Axis};

/// Mean KL(p_ref ‖ softmax(z)) with a frozen reference
///
/// Used as the inner-maximization surrogate: the reference is the model's
/// prediction on the clean batch, and only the adversarial logits `z` move.
#[derive(Debug, Clone)]
pub struct KlToReference {
    reference: Array2<f32>,
    reference_entropy: Array2<f32>,
}

impl KlToReference {
    /// Reference distribution from clean logits
    pub fn from_logits(logits: &Array2<f32>) -> Self {
        let reference = softmax_rows(logits);
        let reference_entropy = entropy_terms(&reference, &log_softmax_rows(logits));
        Self {
            reference,
            reference_entropy,
        }
    }

    pub fn reference(&self) -> &Array2<f32> {
        &self.reference
    }
}

impl LossFn for KlToReference {
    /// `targets` are ignored; the reference carries the label information
    fn forward(&self, logits: &Array2<f32>, _targets: &[usize]) -> LossOutput {
        assert_eq!(
            logits.dim(),
            self.reference.dim(),
            "Logits must match the reference distribution shape"
        );
        let n = logits.nrows().max(1) as f32;
        let log_probs = log_softmax_rows(logits);

        let cross = (&self.reference * &log_probs).sum();
        let value = (self.reference_entropy.sum() - cross) / n;

        // d KL / dz = (softmax(z) - p_ref) / N
        let grad = (log_probs.mapv(f32::exp) - &self.reference) / n;
        LossOutput { value, grad }
    }

    fn name(&self) -> &str {
        "KLDivergence"
    }
}

/// Row-wise KL(p ‖ q) between two logit matrices, guarded with `+1e-12` on q
pub fn kl_rows(p_logits: &Array2<f32>, q_logits: &Array2<f32>) -> Vec<f32> {
    let p = softmax_rows(p_logits);
    let log_p = log_softmax_rows(p_logits);
    let q = softmax_rows(q_logits);
    let mut out = Vec::with_capacity(p.nrows());
    for ((p_row, lp_row), q_row) in p
        .axis_iter(Axis(0))
        .zip(log_p.axis_iter(Axis(0)))
        .zip(q.axis_iter(Axis(0)))
    {
        let kl = p_row
            .iter()
            .zip(lp_row.iter())
            .zip(q_row.iter())
            .map(|((&pj, &lpj), &qj)| {
                if pj > 0.0 {
                    pj * (lpj - (qj + 1e-12).ln())
                } else {
                    0.0
                }
            })
            .sum();
        out.push(kl);
    }
    out
}
