//! In-memory labeled image sets

use crate::{Error, Result};
use ndarray::{Array4, Axis};

/// Images `[N, C, H, W]` with one label each
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledImages {
    images: Array4<f32>,
    labels: Vec<usize>,
}

impl LabeledImages {
    pub fn new(images: Array4<f32>, labels: Vec<usize>) -> Result<Self> {
        let n = images.len_of(Axis(0));
        if n != labels.len() {
            return Err(Error::ShapeMismatch {
                expected: vec![n],
                actual: vec![labels.len()],
            });
        }
        Ok(Self { images, labels })
    }

    pub fn images(&self) -> &Array4<f32> {
        &self.images
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// `(C, H, W)` of every image
    pub fn image_shape(&self) -> (usize, usize, usize) {
        let (_, c, h, w) = self.images.dim();
        (c, h, w)
    }

    /// Largest label plus one
    pub fn num_classes(&self) -> usize {
        self.labels.iter().max().map_or(0, |&m| m + 1)
    }

    /// Samples at `indices`, in that order
    pub fn select(&self, indices: &[usize]) -> (Array4<f32>, Vec<usize>) {
        let images = self.images.select(Axis(0), indices);
        let labels = indices.iter().map(|&i| self.labels[i]).collect();
        (images, labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LabeledImages {
        let images = Array4::from_shape_fn((4, 1, 2, 2), |(n, _, _, _)| n as f32);
        LabeledImages::new(images, vec![3, 0, 1, 2]).unwrap()
    }

    #[test]
    fn test_label_count_mismatch() {
        let err = LabeledImages::new(Array4::zeros((2, 1, 2, 2)), vec![0]).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_select_preserves_order() {
        let set = sample();
        let (images, labels) = set.select(&[2, 0]);
        assert_eq!(labels, vec![1, 3]);
        assert_eq!(images[[0, 0, 0, 0]], 2.0);
        assert_eq!(images[[1, 0, 0, 0]], 0.0);
    }

    #[test]
    fn test_metadata() {
        let set = sample();
        assert_eq!(set.len(), 4);
        assert_eq!(set.image_shape(), (1, 2, 2));
        assert_eq!(set.num_classes(), 4);
    }
}
