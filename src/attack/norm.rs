//! Norm balls: ascent steps and projections for batched images

use clap::ValueEnum;
use ndarray::{Array4, Axis, Zip};
use serde::{Deserialize, Serialize};

/// Threat-model norm bounding the perturbation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum Norm {
    /// Per-coordinate bound
    #[default]
    #[serde(rename = "l_inf")]
    #[value(name = "l_inf")]
    LInf,
    /// Euclidean bound per sample
    #[serde(rename = "l_2")]
    #[value(name = "l_2")]
    L2,
}

/// Sign with sign(0) = 0, so zero-gradient coordinates stay put
fn sign(g: f32) -> f32 {
    if g > 0.0 {
        1.0
    } else if g < 0.0 {
        -1.0
    } else {
        0.0
    }
}

impl Norm {
    /// Ascend along `grad`: `α·sign(g)` for L∞, `α·g/‖g‖₂` per sample for L2
    pub fn ascend(self, x_adv: &Array4<f32>, grad: &Array4<f32>, step_size: f32) -> Array4<f32> {
        assert_eq!(x_adv.dim(), grad.dim(), "Gradient must match the input shape");
        let mut next = x_adv.clone();
        match self {
            Norm::LInf => {
                Zip::from(&mut next)
                    .and(grad)
                    .for_each(|x, &g| *x += step_size * sign(g));
            }
            Norm::L2 => {
                for (mut sample, g) in next.outer_iter_mut().zip(grad.outer_iter()) {
                    let norm = g.iter().map(|v| v * v).sum::<f32>().sqrt();
                    if norm > 0.0 {
                        sample.scaled_add(step_size / norm, &g);
                    }
                }
            }
        }
        next
    }

    /// Pull `x_adv` back into the ε-ball around `x`, in place
    pub fn project(self, x_adv: &mut Array4<f32>, x: &Array4<f32>, epsilon: f32) {
        assert_eq!(x_adv.dim(), x.dim(), "Adversarial and natural inputs must match");
        match self {
            Norm::LInf => {
                Zip::from(x_adv)
                    .and(x)
                    .for_each(|a, &o| *a = o + (*a - o).clamp(-epsilon, epsilon));
            }
            Norm::L2 => {
                for (mut sample, origin) in x_adv.outer_iter_mut().zip(x.outer_iter()) {
                    let mut delta = &sample - &origin;
                    let norm = delta.iter().map(|v| v * v).sum::<f32>().sqrt();
                    if norm > epsilon {
                        let factor = if norm > 0.0 { epsilon / norm } else { 0.0 };
                        delta *= factor;
                        sample.assign(&(&origin + &delta));
                    }
                }
            }
        }
    }

    /// Per-sample distance `‖a_i − b_i‖` in this norm
    pub fn distances(self, a: &Array4<f32>, b: &Array4<f32>) -> Vec<f32> {
        assert_eq!(a.dim(), b.dim(), "Inputs must match");
        a.outer_iter()
            .zip(b.outer_iter())
            .map(|(sa, sb)| {
                let diffs = sa.iter().zip(sb.iter()).map(|(&u, &v)| u - v);
                match self {
                    Norm::LInf => diffs.fold(0.0_f32, |m, d| m.max(d.abs())),
                    Norm::L2 => diffs.map(|d| d * d).sum::<f32>().sqrt(),
                }
            })
            .collect()
    }
}

/// Clamp every coordinate into the valid pixel range [0, 1]
pub fn clip_unit(x: &mut Array4<f32>) {
    x.mapv_inplace(|v| v.clamp(0.0, 1.0));
}

/// Number of samples in a batch
pub(crate) fn batch_len(x: &Array4<f32>) -> usize {
    x.len_of(Axis(0))
}
