//! Training-time perturbation: projected ascent from a random start

use super::norm::{clip_unit, Norm};
use crate::nn::Classifier;
use crate::train::{CrossEntropyLoss, KlToReference, LossFn};
use clap::ValueEnum;
use ndarray::Array4;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Objective maximized by the inner loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum InnerLoss {
    /// Cross entropy against the true labels
    #[default]
    #[serde(rename = "ce")]
    #[value(name = "ce")]
    CrossEntropy,
    /// KL toward the model's own clean prediction
    Kl,
}

/// Perturbation budget for the inner maximization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MartPerturbation {
    /// Radius of the norm ball
    pub epsilon: f32,
    /// Ascent step length
    pub step_size: f32,
    /// Number of ascent steps; zero returns the natural input
    pub num_steps: usize,
    pub norm: Norm,
    pub inner_loss: InnerLoss,
}

impl Default for MartPerturbation {
    fn default() -> Self {
        Self {
            epsilon: 0.031,
            step_size: 0.007,
            num_steps: 10,
            norm: Norm::LInf,
            inner_loss: InnerLoss::CrossEntropy,
        }
    }
}

impl MartPerturbation {
    pub fn new(epsilon: f32, step_size: f32, num_steps: usize) -> Self {
        Self {
            epsilon,
            step_size,
            num_steps,
            ..Self::default()
        }
    }

    pub fn with_norm(mut self, norm: Norm) -> Self {
        self.norm = norm;
        self
    }

    pub fn with_inner_loss(mut self, inner_loss: InnerLoss) -> Self {
        self.inner_loss = inner_loss;
        self
    }

    /// Craft adversarial inputs for `(x, y)` against the frozen `model`
    ///
    /// The result lies in the ε-ball around `x` and in `[0, 1]`. Model
    /// parameters and their accumulated gradients are left untouched.
    pub fn perturb<M, R>(
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
        match self.inner_loss {
            InnerLoss::CrossEntropy => projected_ascent(
                model,
                x,
                y,
                &CrossEntropyLoss,
                self.epsilon,
                self.step_size,
                self.num_steps,
                self.norm,
                rng,
            ),
            InnerLoss::Kl => {
                let reference = KlToReference::from_logits(&model.forward(x));
                projected_ascent(
                    model,
                    x,
                    y,
                    &reference,
                    self.epsilon,
                    self.step_size,
                    self.num_steps,
                    self.norm,
                    rng,
                )
            }
        }
    }
}

/// Uniform noise in `[-ε, ε]` with the shape of `x`
pub(crate) fn uniform_start<R: Rng + ?Sized>(
    x: &Array4<f32>,
    epsilon: f32,
    rng: &mut R,
) -> Array4<f32> {
    let noise = Array4::from_shape_fn(x.dim(), |_| rng.random_range(-epsilon..=epsilon));
    x + &noise
}

/// Shared PGD core used by training and evaluation
#[allow(clippy::too_many_arguments)]
pub(crate) fn projected_ascent<M, L, R>(
    model: &M,
    x: &Array4<f32>,
    y: &[usize],
    loss: &L,
    epsilon: f32,
    step_size: f32,
    steps: usize,
    norm: Norm,
    rng: &mut R,
) -> Array4<f32>
where
    M: Classifier + ?Sized,
    L: LossFn + ?Sized,
    R: Rng + ?Sized,
{
    if steps == 0 || epsilon <= 0.0 {
        return x.clone();
    }

    let mut x_adv = uniform_start(x, epsilon, rng);
    norm.project(&mut x_adv, x, epsilon);
    clip_unit(&mut x_adv);

    for _ in 0..steps {
        let logits = model.forward(&x_adv);
        let out = loss.forward(&logits, y);
        let grad = model.input_gradient(&x_adv, &out.grad);

        let mut next = norm.ascend(&x_adv, &grad, step_size);
        norm.project(&mut next, x, epsilon);
        clip_unit(&mut next);
        x_adv = next;
    }
    x_adv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::Mlp;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn model(seed: u64) -> Mlp {
        let mut rng = StdRng::seed_from_u64(seed);
        Mlp::new((1, 3, 3), &[8], 3, &mut rng)
    }

    fn inputs(seed: u64, n: usize) -> Array4<f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        Array4::from_shape_fn((n, 1, 3, 3), |_| rng.random_range(0.0..=1.0))
    }

    #[test]
    fn test_zero_steps_returns_natural_input() {
        let m = model(0);
        let x = inputs(1, 4);
        let attack = MartPerturbation::new(0.031, 0.007, 0);
        let adv = attack.perturb(&m, &x, &[0, 1, 2, 0], &mut StdRng::seed_from_u64(2));
        assert_eq!(adv, x);
    }

    #[test]
    fn test_zero_epsilon_returns_natural_input() {
        let m = model(0);
        let x = inputs(1, 4);
        let attack = MartPerturbation::new(0.0, 0.007, 10);
        let adv = attack.perturb(&m, &x, &[0, 1, 2, 0], &mut StdRng::seed_from_u64(2));
        assert_eq!(adv, x);
    }

    #[test]
    fn test_perturb_is_deterministic_for_a_seed() {
        let m = model(3);
        let x = inputs(4, 5);
        let y = [0, 1, 2, 1, 0];
        let attack = MartPerturbation::default();
        let a = attack.perturb(&m, &x, &y, &mut StdRng::seed_from_u64(9));
        let b = attack.perturb(&m, &x, &y, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_perturb_leaves_model_untouched() {
        let m = model(3);
        let before: Vec<_> = m.params().iter().map(|p| p.value().clone()).collect();
        let x = inputs(4, 5);
        let mut rng = StdRng::seed_from_u64(1);
        let _ = MartPerturbation::default().perturb(&m, &x, &[0, 1, 2, 1, 0], &mut rng);
        for (p, b) in m.params().iter().zip(&before) {
            assert_eq!(p.value(), b);
            assert!(p.grad().is_none());
        }
    }

    #[test]
    fn test_attack_increases_loss() {
        let m = model(11);
        let x = inputs(12, 16);
        let y: Vec<usize> = (0..16).map(|i| i % 3).collect();
        let attack = MartPerturbation::new(0.3, 0.05, 20);
        let adv = attack.perturb(&m, &x, &y, &mut StdRng::seed_from_u64(5));
        let clean = CrossEntropyLoss.forward(&m.forward(&x), &y).value;
        let robust = CrossEntropyLoss.forward(&m.forward(&adv), &y).value;
        assert!(robust >= clean, "adversarial loss {robust} below clean {clean}");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_linf_result_in_ball_and_unit_range(seed in 0u64..1000, epsilon in 0.0f32..0.5) {
            let m = model(seed);
            let x = inputs(seed + 1, 3);
            let attack = MartPerturbation::new(epsilon, 0.05, 5);
            let adv = attack.perturb(&m, &x, &[0, 1, 2], &mut StdRng::seed_from_u64(seed));
            for d in Norm::LInf.distances(&adv, &x) {
                prop_assert!(d <= epsilon + 1e-6);
            }
            prop_assert!(adv.iter().all(|&v| (0.0..=1.0).contains(&v)));
        }

        #[test]
        fn prop_l2_result_in_ball_and_unit_range(seed in 0u64..1000, epsilon in 0.0f32..2.0) {
            let m = model(seed);
            let x = inputs(seed + 7, 3);
            let attack = MartPerturbation::new(epsilon, 0.2, 5)
                .with_norm(Norm::L2)
                .with_inner_loss(InnerLoss::Kl);
            let adv = attack.perturb(&m, &x, &[2, 1, 0], &mut StdRng::seed_from_u64(seed));
            for d in Norm::L2.distances(&adv, &x) {
                prop_assert!(d <= epsilon + 1e-5);
            }
            prop_assert!(adv.iter().all(|&v| (0.0..=1.0).contains(&v)));
        }
    }
}
