//! Fully connected layer with analytic backward

use super::Param;
use ndarray::{Array2, Axis};
use rand::Rng;

/// Affine map `y = x·W + b`
///
/// `W` is stored as `[in, out]` and `b` as `[1, out]` so both are plain 2-D params.
#[derive(Debug, Clone)]
pub struct Linear {
    pub(crate) weight: Param,
    pub(crate) bias: Param,
}

impl Linear {
    /// Kaiming-uniform initialised layer
    pub fn new<R: Rng + ?Sized>(
        in_features: usize,
        out_features: usize,
        layer: usize,
        rng: &mut R,
    ) -> Self {
        let bound = (3.0 / in_features.max(1) as f32).sqrt();
        let weight = Array2::from_shape_fn((in_features, out_features), |_| {
            rng.random_range(-bound..=bound)
        });
        let bias = Array2::zeros((1, out_features));
        Self {
            weight: Param::new(format!("layer{layer}.weight"), layer, weight),
            bias: Param::new(format!("layer{layer}.bias"), layer, bias),
        }
    }

    /// Build from explicit weights (`[in, out]`) and bias (`[1, out]`)
    pub fn from_arrays(weight: Array2<f32>, bias: Array2<f32>, layer: usize) -> Self {
        assert_eq!(
            weight.ncols(),
            bias.ncols(),
            "Bias width must equal weight output features"
        );
        assert_eq!(bias.nrows(), 1, "Bias must be a single row");
        Self {
            weight: Param::new(format!("layer{layer}.weight"), layer, weight),
            bias: Param::new(format!("layer{layer}.bias"), layer, bias),
        }
    }

    pub fn in_features(&self) -> usize {
        self.weight.value().nrows()
    }

    pub fn out_features(&self) -> usize {
        self.weight.value().ncols()
    }

    pub fn forward(&self, x: &Array2<f32>) -> Array2<f32> {
        x.dot(self.weight.value()) + self.bias.value()
    }

    /// Returns `(dW, db, dx)` for upstream gradient `grad` at input `x`
    pub fn backward(
        &self,
        x: &Array2<f32>,
        grad: &Array2<f32>,
    ) -> (Array2<f32>, Array2<f32>, Array2<f32>) {
        let grad_w = x.t().dot(grad);
        let grad_b = grad.sum_axis(Axis(0)).insert_axis(Axis(0));
        let grad_x = grad.dot(&self.weight.value().t());
        (grad_w, grad_b, grad_x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::arr2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_linear_forward() {
        let layer =
            Linear::from_arrays(arr2(&[[1.0, 0.0], [0.0, 2.0]]), arr2(&[[0.5, -0.5]]), 0);
        let y = layer.forward(&arr2(&[[1.0, 1.0], [2.0, 3.0]]));
        assert_eq!(y, arr2(&[[1.5, 1.5], [2.5, 5.5]]));
    }

    #[test]
    fn test_linear_backward_shapes() {
        let mut rng = StdRng::seed_from_u64(0);
        let layer = Linear::new(4, 3, 0, &mut rng);
        let x = Array2::ones((5, 4));
        let g = Array2::ones((5, 3));
        let (gw, gb, gx) = layer.backward(&x, &g);
        assert_eq!(gw.dim(), (4, 3));
        assert_eq!(gb.dim(), (1, 3));
        assert_eq!(gx.dim(), (5, 4));
        // Every row contributes one to the bias gradient
        for &v in &gb {
            assert_relative_eq!(v, 5.0);
        }
    }

    #[test]
    fn test_init_within_bound() {
        let mut rng = StdRng::seed_from_u64(7);
        let layer = Linear::new(48, 8, 0, &mut rng);
        let bound = (3.0_f32 / 48.0).sqrt();
        assert!(layer.weight.value().iter().all(|w| w.abs() <= bound));
        assert!(layer.bias.value().iter().all(|&b| b == 0.0));
    }
}
