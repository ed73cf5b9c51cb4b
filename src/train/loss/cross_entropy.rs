//! Cross Entropy Loss for classification

use super::{LossFn, LossOutput};
use ndarray::{Array2, Axis, Zip};

/// Row-wise softmax with max subtraction
pub fn softmax_rows(logits: &Array2<f32>) -> Array2<f32> {
    let mut out = logits.to_owned();
    for mut row in out.axis_iter_mut(Axis(0)) {
        let max = row.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|v| v / sum);
    }
    out
}

/// Row-wise log-softmax; finite for any finite logits
pub fn log_softmax_rows(logits: &Array2<f32>) -> Array2<f32> {
    let mut out = logits.to_owned();
    for mut row in out.axis_iter_mut(Axis(0)) {
        let max = row.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        let log_sum = row.iter().map(|&v| (v - max).exp()).sum::<f32>().ln();
        row.mapv_inplace(|v| v - max - log_sum);
    }
    out
}

/// Cross Entropy Loss (mean over the batch)
///
/// L = -1/N · Σ_i log softmax(z_i)[y_i]
///
/// # Example
///
/// ```
/// use blindaje::train::{CrossEntropyLoss, LossFn};
/// use ndarray::arr2;
///
/// let logits = arr2(&[[2.0, 1.0, 0.5]]);
/// let out = CrossEntropyLoss.forward(&logits, &[0]);
/// assert!(out.value > 0.0);
/// assert!(out.grad[[0, 0]] < 0.0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossEntropyLoss;

impl LossFn for CrossEntropyLoss {
    fn forward(&self, logits: &Array2<f32>, targets: &[usize]) -> LossOutput {
        assert_eq!(
            logits.nrows(),
            targets.len(),
            "Logits and targets must have same batch size"
        );
        let n = targets.len().max(1) as f32;
        let log_probs = log_softmax_rows(logits);

        let value = -targets
            .iter()
            .enumerate()
            .map(|(i, &y)| log_probs[[i, y]])
            .sum::<f32>()
            / n;

        // d(CE)/d(logits) = (probs - onehot) / N
        let mut grad = log_probs.mapv(f32::exp);
        for (i, &y) in targets.iter().enumerate() {
            grad[[i, y]] -= 1.0;
        }
        grad /= n;

        LossOutput { value, grad }
    }

    fn name(&self) -> &str {
        "CrossEntropy"
    }
}

/// Per-row cross entropy without reduction
pub fn cross_entropy_rows(logits: &Array2<f32>, targets: &[usize]) -> Vec<f32> {
    let log_probs = log_softmax_rows(logits);
    targets
        .iter()
        .enumerate()
        .map(|(i, &y)| -log_probs[[i, y]])
        .collect()
}

/// Elementwise `p * log p` with the 0·log 0 = 0 convention
pub(crate) fn entropy_terms(probs: &Array2<f32>, log_probs: &Array2<f32>) -> Array2<f32> {
    let mut out = Array2::zeros(probs.dim());
    Zip::from(&mut out)
        .and(probs)
        .and(log_probs)
        .for_each(|o, &p, &lp| *o = if p > 0.0 { p * lp } else { 0.0 });
    out
}
