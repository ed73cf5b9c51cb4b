//! MART objective: misclassification-aware adversarial loss

use super::cross_entropy::{log_softmax_rows, softmax_rows};
use ndarray::Array2;

/// Guard added inside every logarithm of a probability
const LOG_EPS: f32 = 1e-12;
/// Offset in the margin term `-log(1.0001 - p_wrong)`
const MARGIN_OFFSET: f32 = 1.0001;
/// Offset in the confidence weight `1.0000001 - p_true`
const WEIGHT_OFFSET: f32 = 1.000_000_1;

/// Loss value, its two components and gradients for both logit matrices
#[derive(Debug, Clone)]
pub struct MartOutput {
    /// `adversarial + beta * robust`
    pub loss: f32,
    /// Adversarial CE plus the wrong-class margin term
    pub adversarial: f32,
    /// Confidence-weighted KL regularizer (before multiplying by beta)
    pub robust: f32,
    /// dL/d(natural logits)
    pub grad_natural: Array2<f32>,
    /// dL/d(adversarial logits)
    pub grad_adversarial: Array2<f32>,
}

/// Misclassification-aware adversarial training loss
///
/// With `p_a = softmax(f(x_adv))`, `p_n = softmax(f(x))`:
///
/// ```text
/// adv    = mean_i [ -log p_a[i, y_i]  -  log(1.0001 - p_a[i, k_i] + 1e-12) ]
/// robust = mean_i [ KL(p_n,i ‖ p_a,i) · (1.0000001 - p_n[i, y_i]) ]
/// loss   = adv + beta · robust
/// ```
///
/// `k_i` is the most probable wrong class under `p_a` and is held constant when
/// differentiating.
#[derive(Debug, Clone, Copy)]
pub struct MartLoss {
    beta: f32,
}

impl MartLoss {
    pub fn new(beta: f32) -> Self {
        Self { beta }
    }

    pub fn beta(&self) -> f32 {
        self.beta
    }

    /// Evaluate the loss and its gradients
    ///
    /// # Panics
    ///
    /// If the logit shapes differ or the batch size disagrees with `targets`.
    pub fn forward(
        &self,
        natural_logits: &Array2<f32>,
        adversarial_logits: &Array2<f32>,
        targets: &[usize],
    ) -> MartOutput {
        assert_eq!(
            natural_logits.dim(),
            adversarial_logits.dim(),
            "Natural and adversarial logits must have the same shape"
        );
        assert_eq!(
            natural_logits.nrows(),
            targets.len(),
            "Logits and targets must have same batch size"
        );

        let (n, k) = natural_logits.dim();
        let inv_n = 1.0 / n.max(1) as f32;
        let coeff = self.beta * inv_n;

        let p_adv = softmax_rows(adversarial_logits);
        let lp_adv = log_softmax_rows(adversarial_logits);
        let p_nat = softmax_rows(natural_logits);
        let lp_nat = log_softmax_rows(natural_logits);

        let mut grad_adv = Array2::zeros((n, k));
        let mut grad_nat = Array2::zeros((n, k));
        let mut adversarial = 0.0;
        let mut robust = 0.0;

        for (i, &y) in targets.iter().enumerate() {
            let pa = p_adv.row(i);
            let pn = p_nat.row(i);

            // Adversarial cross entropy
            adversarial -= lp_adv[[i, y]];
            for j in 0..k {
                let onehot = if j == y { 1.0 } else { 0.0 };
                grad_adv[[i, j]] += inv_n * (pa[j] - onehot);
            }

            // Margin term on the most probable wrong class
            let wrong = top_wrong_class(pa.iter().copied(), y);
            let q = pa[wrong];
            let denom = MARGIN_OFFSET - q + LOG_EPS;
            adversarial -= denom.ln();
            let scale = inv_n * q / denom;
            for j in 0..k {
                let delta = if j == wrong { 1.0 } else { 0.0 };
                grad_adv[[i, j]] += scale * (delta - pa[j]);
            }

            // Confidence-weighted KL(p_nat ‖ p_adv)
            let log_q: Vec<f32> = pa.iter().map(|&p| (p + LOG_EPS).ln()).collect();
            let diff: Vec<f32> = (0..k).map(|j| lp_nat[[i, j]] - log_q[j]).collect();
            let kl: f32 = (0..k)
                .filter(|&j| pn[j] > 0.0)
                .map(|j| pn[j] * diff[j])
                .sum();
            let weight = WEIGHT_OFFSET - pn[y];
            robust += weight * kl;

            // d KL / d z_adv[m] = -r_m + p_a[m] Σ_j r_j
            let r: Vec<f32> = (0..k).map(|j| pn[j] * pa[j] / (pa[j] + LOG_EPS)).collect();
            let r_sum: f32 = r.iter().sum();
            // d KL / d z_nat[m] = p_n[m] (g_m - Σ_j p_n[j] g_j)
            let mean_diff: f32 = (0..k).map(|j| pn[j] * diff[j]).sum();
            for m in 0..k {
                grad_adv[[i, m]] += coeff * weight * (pa[m] * r_sum - r[m]);

                let d_kl = pn[m] * (diff[m] - mean_diff);
                let onehot = if m == y { 1.0 } else { 0.0 };
                let d_weight = -pn[y] * (onehot - pn[m]);
                grad_nat[[i, m]] += coeff * (weight * d_kl + kl * d_weight);
            }
        }

        adversarial *= inv_n;
        robust *= inv_n;

        MartOutput {
            loss: adversarial + self.beta * robust,
            adversarial,
            robust,
            grad_natural: grad_nat,
            grad_adversarial: grad_adv,
        }
    }
}

/// Most probable class other than `target`; ties go to the lowest index
fn top_wrong_class(probs: impl Iterator<Item = f32>, target: usize) -> usize {
    let mut best: Option<(usize, f32)> = None;
    for (j, p) in probs.enumerate() {
        if j == target {
            continue;
        }
        if best.map_or(true, |(_, b)| p > b) {
            best = Some((j, p));
        }
    }
    best.map_or(target, |(j, _)| j)
}
