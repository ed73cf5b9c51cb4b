//! Differentiable image classifiers
//!
//! The training core only needs a [`Classifier`]: logits from images, analytic
//! gradients back to both the parameters and the input, and a stable identity for
//! its parameter set. [`Mlp`] is the bundled implementation.

mod linear;
mod mlp;
mod param;

pub use linear::Linear;
pub use mlp::Mlp;
pub use param::{Param, ParamSetId};

use ndarray::{Array2, Array4, Axis};

/// Gradients produced by one backward pass
#[derive(Debug, Clone)]
pub struct Gradients {
    /// One gradient per parameter, in [`Classifier::params`] order
    pub params: Vec<Array2<f32>>,
    /// Gradient with respect to the input images
    pub input: Array4<f32>,
}

/// A trainable map from `[N, C, H, W]` images to `[N, K]` logits
///
/// `backward` is pure: it never writes parameter gradients. Callers that want to
/// train use [`Classifier::accumulate`]; the attack loops only read `input`.
pub trait Classifier {
    /// Number of output classes
    fn num_classes(&self) -> usize;

    /// Compute logits
    fn forward(&self, inputs: &Array4<f32>) -> Array2<f32>;

    /// Backpropagate `grad_logits` (dL/dlogits) through the model at `inputs`
    fn backward(&self, inputs: &Array4<f32>, grad_logits: &Array2<f32>) -> Gradients;

    /// Trainable parameters
    fn params(&self) -> Vec<&Param>;

    /// Mutable trainable parameters, same order as [`Classifier::params`]
    fn params_mut(&mut self) -> Vec<&mut Param>;

    /// Identity of this instance's parameter set
    fn param_set(&self) -> ParamSetId;

    /// Number of layers; every param's `layer()` is below this
    fn num_layers(&self) -> usize;

    /// Gradient with respect to the input only
    fn input_gradient(&self, inputs: &Array4<f32>, grad_logits: &Array2<f32>) -> Array4<f32> {
        self.backward(inputs, grad_logits).input
    }

    /// Add parameter gradients to the accumulated `grad` of each param
    fn accumulate(&mut self, grads: Vec<Array2<f32>>) {
        let mut params = self.params_mut();
        assert_eq!(
            params.len(),
            grads.len(),
            "One gradient per parameter is required"
        );
        for (param, grad) in params.iter_mut().zip(grads) {
            param.accumulate_grad(grad);
        }
    }

    /// Arg-max class per row
    fn predict(&self, inputs: &Array4<f32>) -> Vec<usize> {
        argmax_rows(&self.forward(inputs))
    }
}

/// Arg-max of each row; ties resolve to the lowest index
pub fn argmax_rows(logits: &Array2<f32>) -> Vec<usize> {
    logits
        .axis_iter(Axis(0))
        .map(|row| {
            let mut best = 0;
            for (j, &v) in row.iter().enumerate() {
                if v > row[best] {
                    best = j;
                }
            }
            best
        })
        .collect()
}

/// `[N, C, H, W]` → `[N, C·H·W]` in row-major order
pub(crate) fn flatten(inputs: &Array4<f32>) -> Array2<f32> {
    let (n, c, h, w) = inputs.dim();
    let hw = h * w;
    Array2::from_shape_fn((n, c * hw), |(i, j)| {
        inputs[[i, j / hw, (j % hw) / w, j % w]]
    })
}

/// Inverse of [`flatten`]
pub(crate) fn unflatten(flat: &Array2<f32>, shape: (usize, usize, usize)) -> Array4<f32> {
    let (c, h, w) = shape;
    let n = flat.nrows();
    Array4::from_shape_fn((n, c, h, w), |(i, ci, y, x)| flat[[i, ci * h * w + y * w + x]])
}
