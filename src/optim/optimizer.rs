//! Optimizer trait

use crate::nn::{Classifier, Param, ParamSetId};
use crate::{Error, Result};
use ndarray::Array2;

/// Trait for first-order optimizers bound to one model's parameter set
///
/// Per-parameter state lives in slots indexed like [`Classifier::params`]. The
/// binding records which parameter set those slots describe.
pub trait Optimizer {
    /// Apply one update using each param's accumulated gradient
    fn step(&mut self, params: &mut [&mut Param]);

    /// Zero out all gradients
    fn zero_grad(&mut self, params: &mut [&mut Param]) {
        for param in params.iter_mut() {
            param.zero_grad();
        }
    }

    /// Get learning rate
    fn lr(&self) -> f32;

    /// Set learning rate
    fn set_lr(&mut self, lr: f32);

    /// Parameter set this optimizer updates, if bound
    fn param_set(&self) -> Option<ParamSetId>;

    /// Rebind to another parameter set, keeping slot state
    fn bind(&mut self, set: ParamSetId);

    /// Per-parameter state slots (momentum buffers)
    fn slots(&self) -> &[Option<Array2<f32>>];

    /// Mutable per-parameter state slots
    fn slots_mut(&mut self) -> &mut Vec<Option<Array2<f32>>>;
}

/// Fail unless `optimizer` is bound to `model`'s current parameter set
pub fn ensure_bound<M, O>(model: &M, optimizer: &O) -> Result<()>
where
    M: Classifier + ?Sized,
    O: Optimizer + ?Sized,
{
    let model_set = model.param_set();
    match optimizer.param_set() {
        Some(set) if set == model_set => Ok(()),
        other => Err(Error::StaleOptimizer {
            optimizer: other,
            model: model_set,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::Mlp;
    use crate::optim::SGD;
    use ndarray::arr2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Minimal optimizer implementation for testing default trait methods
    struct TestOptimizer {
        learning_rate: f32,
        bound: Option<ParamSetId>,
        slots: Vec<Option<Array2<f32>>>,
    }

    impl Optimizer for TestOptimizer {
        fn step(&mut self, params: &mut [&mut Param]) {
            for param in params.iter_mut() {
                if let Some(grad) = param.grad().cloned() {
                    param.value_mut().scaled_add(-self.learning_rate, &grad);
                }
            }
        }

        fn lr(&self) -> f32 {
            self.learning_rate
        }

        fn set_lr(&mut self, lr: f32) {
            self.learning_rate = lr;
        }

        fn param_set(&self) -> Option<ParamSetId> {
            self.bound
        }

        fn bind(&mut self, set: ParamSetId) {
            self.bound = Some(set);
        }

        fn slots(&self) -> &[Option<Array2<f32>>] {
            &self.slots
        }

        fn slots_mut(&mut self) -> &mut Vec<Option<Array2<f32>>> {
            &mut self.slots
        }
    }

    fn test_optimizer(lr: f32) -> TestOptimizer {
        TestOptimizer {
            learning_rate: lr,
            bound: None,
            slots: Vec::new(),
        }
    }

    #[test]
    fn test_optimizer_zero_grad() {
        let mut opt = test_optimizer(0.1);
        let mut param = Param::new("w", 0, arr2(&[[1.0, 2.0, 3.0]]));
        param.accumulate_grad(arr2(&[[0.5, 1.0, 1.5]]));

        opt.zero_grad(&mut [&mut param]);
        assert!(param.grad().is_none());
    }

    #[test]
    fn test_optimizer_step_multiple_params() {
        let mut opt = test_optimizer(0.1);
        let mut p1 = Param::new("a", 0, arr2(&[[1.0, 2.0]]));
        let mut p2 = Param::new("b", 1, arr2(&[[3.0, 4.0]]));
        p1.accumulate_grad(arr2(&[[0.5, 1.0]]));
        p2.accumulate_grad(arr2(&[[1.5, 2.0]]));

        opt.step(&mut [&mut p1, &mut p2]);

        assert!((p1.value()[[0, 0]] - 0.95).abs() < 1e-6);
        assert!((p1.value()[[0, 1]] - 1.9).abs() < 1e-6);
        assert!((p2.value()[[0, 0]] - 2.85).abs() < 1e-6);
        assert!((p2.value()[[0, 1]] - 3.8).abs() < 1e-6);
    }

    #[test]
    fn test_optimizer_set_lr() {
        let mut opt = test_optimizer(0.1);
        assert_eq!(opt.lr(), 0.1);
        opt.set_lr(0.01);
        assert_eq!(opt.lr(), 0.01);
    }

    #[test]
    fn test_ensure_bound() {
        let mut rng = StdRng::seed_from_u64(0);
        let model = Mlp::new((1, 2, 2), &[], 2, &mut rng);
        let opt = SGD::new(0.1, 0.9).bound_to(&model);
        assert!(ensure_bound(&model, &opt).is_ok());

        let replacement = model.clone();
        let err = ensure_bound(&replacement, &opt).unwrap_err();
        assert!(matches!(err, Error::StaleOptimizer { .. }));
    }

    #[test]
    fn test_ensure_bound_unbound_optimizer() {
        let mut rng = StdRng::seed_from_u64(0);
        let model = Mlp::new((1, 2, 2), &[], 2, &mut rng);
        let opt = SGD::new(0.1, 0.0);
        let err = ensure_bound(&model, &opt).unwrap_err();
        assert!(matches!(err, Error::StaleOptimizer { optimizer: None, .. }));
    }
}
