//! Batch data structure

use ndarray::Array4;

/// A batch of images with class labels
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Images `[N, C, H, W]` in `[0, 1]`
    pub inputs: Array4<f32>,
    /// Class index per image
    pub targets: Vec<usize>,
}

impl Batch {
    /// Create a new batch
    pub fn new(inputs: Array4<f32>, targets: Vec<usize>) -> Self {
        assert_eq!(
            inputs.dim().0,
            targets.len(),
            "Inputs and targets must have same batch size"
        );
        Self { inputs, targets }
    }

    /// Number of samples
    pub fn size(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
