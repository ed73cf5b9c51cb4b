//! Loss function trait

use ndarray::Array2;

/// Scalar loss and its gradient with respect to the logits
#[derive(Debug, Clone)]
pub struct LossOutput {
    /// Mean loss over the batch
    pub value: f32,
    /// dL/dlogits, same shape as the logits
    pub grad: Array2<f32>,
}

/// Trait for batch classification losses over `[N, K]` logits
pub trait LossFn {
    /// Compute the mean loss and its analytic gradient
    fn forward(&self, logits: &Array2<f32>, targets: &[usize]) -> LossOutput;

    /// Name of the loss function
    fn name(&self) -> &str;
}
