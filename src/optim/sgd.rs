//! Stochastic Gradient Descent optimizer

use super::Optimizer;
use crate::nn::{Classifier, Param, ParamSetId};
use ndarray::Array2;

/// SGD optimizer with optional momentum and L2 weight decay
///
/// Update rule per parameter with gradient `g`:
///
/// ```text
/// d = g + weight_decay * p
/// v = momentum * v + d        (v = d on the first step)
/// p = p - lr * v
/// ```
#[derive(Debug, Clone)]
pub struct SGD {
    lr: f32,
    momentum: f32,
    weight_decay: f32,
    velocities: Vec<Option<Array2<f32>>>,
    bound: Option<ParamSetId>,
}

impl SGD {
    /// Create a new SGD optimizer
    pub fn new(lr: f32, momentum: f32) -> Self {
        Self {
            lr,
            momentum,
            weight_decay: 0.0,
            velocities: Vec::new(),
            bound: None,
        }
    }

    /// Set L2 weight decay
    pub fn with_weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    /// Bind to `model`'s parameter set
    pub fn bound_to<M: Classifier + ?Sized>(mut self, model: &M) -> Self {
        self.bind(model.param_set());
        self
    }

    pub fn momentum(&self) -> f32 {
        self.momentum
    }

    pub fn weight_decay(&self) -> f32 {
        self.weight_decay
    }

    fn ensure_velocities(&mut self, count: usize) {
        if self.velocities.len() != count {
            self.velocities.resize(count, None);
        }
    }
}

impl Optimizer for SGD {
    fn step(&mut self, params: &mut [&mut Param]) {
        self.ensure_velocities(params.len());

        for (i, param) in params.iter_mut().enumerate() {
            let Some(grad) = param.grad() else {
                continue;
            };
            let mut direction = grad.clone();
            if self.weight_decay != 0.0 {
                direction.scaled_add(self.weight_decay, param.value());
            }

            if self.momentum != 0.0 {
                let velocity = match self.velocities[i].take() {
                    Some(mut v) => {
                        v *= self.momentum;
                        v += &direction;
                        v
                    }
                    None => direction,
                };
                param.value_mut().scaled_add(-self.lr, &velocity);
                self.velocities[i] = Some(velocity);
            } else {
                param.value_mut().scaled_add(-self.lr, &direction);
            }
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }

    fn param_set(&self) -> Option<ParamSetId> {
        self.bound
    }

    fn bind(&mut self, set: ParamSetId) {
        self.bound = Some(set);
    }

    fn slots(&self) -> &[Option<Array2<f32>>] {
        &self.velocities
    }

    fn slots_mut(&mut self) -> &mut Vec<Option<Array2<f32>>> {
        &mut self.velocities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::arr2;

    fn param_with_grad(value: [f32; 2], grad: [f32; 2]) -> Param {
        let mut p = Param::new("w", 0, arr2(&[value]));
        p.accumulate_grad(arr2(&[grad]));
        p
    }

    #[test]
    fn test_plain_sgd_step() {
        let mut opt = SGD::new(0.1, 0.0);
        let mut p = param_with_grad([1.0, -1.0], [0.5, -0.5]);
        opt.step(&mut [&mut p]);
        assert_relative_eq!(p.value()[[0, 0]], 0.95);
        assert_relative_eq!(p.value()[[0, 1]], -0.95);
        assert!(opt.slots().iter().all(Option::is_none));
    }

    #[test]
    fn test_momentum_accumulates() {
        let mut opt = SGD::new(0.1, 0.9);
        let mut p = param_with_grad([1.0, 1.0], [1.0, 1.0]);

        opt.step(&mut [&mut p]);
        // First step: v = g
        assert_relative_eq!(p.value()[[0, 0]], 0.9);

        opt.step(&mut [&mut p]);
        // Second step: v = 0.9 * 1 + 1 = 1.9
        assert_relative_eq!(p.value()[[0, 0]], 0.9 - 0.19, epsilon = 1e-6);
        let v = opt.slots()[0].as_ref().unwrap();
        assert_relative_eq!(v[[0, 0]], 1.9, epsilon = 1e-6);
    }

    #[test]
    fn test_weight_decay_pulls_toward_zero() {
        let mut opt = SGD::new(0.1, 0.0).with_weight_decay(0.5);
        let mut p = param_with_grad([2.0, -2.0], [0.0, 0.0]);
        opt.step(&mut [&mut p]);
        // d = 0 + 0.5 * p
        assert_relative_eq!(p.value()[[0, 0]], 1.9);
        assert_relative_eq!(p.value()[[0, 1]], -1.9);
    }

    #[test]
    fn test_params_without_grad_are_skipped() {
        let mut opt = SGD::new(0.1, 0.9);
        let mut p = Param::new("w", 0, arr2(&[[1.0, 2.0]]));
        opt.step(&mut [&mut p]);
        assert_eq!(p.value(), &arr2(&[[1.0, 2.0]]));
        assert_eq!(opt.slots().len(), 1);
    }

    #[test]
    fn test_set_lr() {
        let mut opt = SGD::new(0.01, 0.9);
        opt.set_lr(0.001);
        assert_eq!(opt.lr(), 0.001);
    }
}
