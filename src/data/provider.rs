//! Batch providers over in-memory image sets

use super::augment::{Augmentation, CropChoice};
use super::{Batch, LabeledImages};
use ndarray::{Array4, Axis};
use rand::seq::SliceRandom;
use rand::RngCore;

/// Source of batches for one split
///
/// `batches` is lazy and restartable: each call walks the current epoch's order
/// from the beginning. Only `new_epoch` changes that order or the augmentation.
pub trait BatchProvider {
    /// Reshuffle and redraw augmentation for the next epoch
    fn new_epoch(&mut self, rng: &mut dyn RngCore);

    /// Batches of the current epoch, in order
    fn batches(&self) -> Box<dyn Iterator<Item = Batch> + '_>;

    /// Number of samples
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn batch_size(&self) -> usize;

    /// Number of batches per epoch; the last may be short
    fn num_batches(&self) -> usize {
        self.len().div_ceil(self.batch_size())
    }
}

/// Provider over a [`LabeledImages`] set
///
/// Training providers shuffle and augment; evaluation providers keep a fixed
/// order and serve images unchanged.
#[derive(Debug, Clone)]
pub struct InMemoryProvider {
    data: LabeledImages,
    batch_size: usize,
    shuffle: bool,
    augmentation: Option<Augmentation>,
    order: Vec<usize>,
    choices: Vec<CropChoice>,
}

impl InMemoryProvider {
    /// Fixed-order provider
    pub fn sequential(data: LabeledImages, batch_size: usize) -> Self {
        assert!(batch_size > 0, "Batch size must be positive");
        let order = (0..data.len()).collect();
        Self {
            data,
            batch_size,
            shuffle: false,
            augmentation: None,
            order,
            choices: Vec::new(),
        }
    }

    /// Provider reshuffled on every epoch
    pub fn shuffled(data: LabeledImages, batch_size: usize) -> Self {
        Self {
            shuffle: true,
            ..Self::sequential(data, batch_size)
        }
    }

    /// Add random crops and flips; `data` must already be padded
    ///
    /// Until the first `new_epoch`, every sample uses the centered crop.
    pub fn with_augmentation(mut self, augmentation: Augmentation) -> Self {
        let (_, h, w) = self.data.image_shape();
        assert!(
            augmentation.crop <= h && augmentation.crop <= w,
            "Crop must fit inside the stored images"
        );
        let centered = CropChoice {
            dy: (h - augmentation.crop) / 2,
            dx: (w - augmentation.crop) / 2,
            flip: false,
        };
        self.choices = vec![centered; self.data.len()];
        self.augmentation = Some(augmentation);
        self
    }

    pub fn data(&self) -> &LabeledImages {
        &self.data
    }

    /// `(C, H, W)` of served images
    pub fn output_shape(&self) -> (usize, usize, usize) {
        let (c, h, w) = self.data.image_shape();
        match self.augmentation {
            Some(aug) => (c, aug.crop, aug.crop),
            None => (c, h, w),
        }
    }

    fn assemble(&self, indices: &[usize]) -> Batch {
        match self.augmentation {
            None => {
                let (inputs, targets) = self.data.select(indices);
                Batch::new(inputs, targets)
            }
            Some(aug) => {
                let (c, h, w) = self.output_shape();
                let mut inputs = Array4::zeros((indices.len(), c, h, w));
                let images = self.data.images();
                for (mut slot, &i) in inputs.outer_iter_mut().zip(indices) {
                    slot.assign(&aug.apply(images.index_axis(Axis(0), i), self.choices[i]));
                }
                let targets = indices.iter().map(|&i| self.data.labels()[i]).collect();
                Batch::new(inputs, targets)
            }
        }
    }
}

impl BatchProvider for InMemoryProvider {
    fn new_epoch(&mut self, rng: &mut dyn RngCore) {
        if self.shuffle {
            self.order.shuffle(rng);
        }
        if let Some(aug) = self.augmentation {
            let (_, h, w) = self.data.image_shape();
            for choice in &mut self.choices {
                *choice = aug.draw(h, w, rng);
            }
        }
    }

    fn batches(&self) -> Box<dyn Iterator<Item = Batch> + '_> {
        Box::new(
            self.order
                .chunks(self.batch_size)
                .map(move |indices| self.assemble(indices)),
        )
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::reflect_pad;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn numbered(n: usize, side: usize) -> LabeledImages {
        let images = Array4::from_shape_fn((n, 1, side, side), |(i, _, _, _)| i as f32);
        LabeledImages::new(images, (0..n).collect()).unwrap()
    }

    #[test]
    fn test_sequential_order_and_short_last_batch() {
        let provider = InMemoryProvider::sequential(numbered(5, 2), 2);
        let batches: Vec<Batch> = provider.batches().collect();
        assert_eq!(provider.num_batches(), 3);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].targets, vec![0, 1]);
        assert_eq!(batches[2].targets, vec![4]);
    }

    #[test]
    fn test_batches_restartable() {
        let mut provider = InMemoryProvider::shuffled(numbered(8, 2), 3);
        provider.new_epoch(&mut StdRng::seed_from_u64(1));
        let first: Vec<Batch> = provider.batches().collect();
        let second: Vec<Batch> = provider.batches().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut provider = InMemoryProvider::shuffled(numbered(20, 2), 7);
        provider.new_epoch(&mut StdRng::seed_from_u64(3));
        let mut seen: Vec<usize> = provider.batches().flat_map(|b| b.targets).collect();
        assert_ne!(seen, (0..20).collect::<Vec<_>>());
        seen.sort_unstable();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_sequential_ignores_new_epoch() {
        let mut provider = InMemoryProvider::sequential(numbered(6, 2), 4);
        provider.new_epoch(&mut StdRng::seed_from_u64(3));
        let targets: Vec<usize> = provider.batches().flat_map(|b| b.targets).collect();
        assert_eq!(targets, (0..6).collect::<Vec<_>>());
    }

    #[test]
    fn test_augmented_batches_have_crop_shape() {
        let data = numbered(4, 4);
        let padded = reflect_pad(data.images(), 2).unwrap();
        let padded = LabeledImages::new(padded, data.labels().to_vec()).unwrap();
        let mut provider =
            InMemoryProvider::shuffled(padded, 4).with_augmentation(Augmentation::new(4));
        assert_eq!(provider.output_shape(), (1, 4, 4));

        // Before any epoch the centered crop reproduces the original images
        let batch = provider.batches().next().unwrap();
        assert_eq!(batch.inputs, data.images().clone());

        provider.new_epoch(&mut StdRng::seed_from_u64(0));
        let batch = provider.batches().next().unwrap();
        assert_eq!(batch.inputs.dim(), (4, 1, 4, 4));
        // Each image is constant, so crops keep its value
        for (img, &label) in batch.inputs.outer_iter().zip(&batch.targets) {
            assert!(img.iter().all(|&v| v == label as f32));
        }
    }

    #[test]
    fn test_empty_provider() {
        let data = LabeledImages::new(Array4::zeros((0, 1, 2, 2)), vec![]).unwrap();
        let provider = InMemoryProvider::sequential(data, 4);
        assert!(provider.is_empty());
        assert_eq!(provider.num_batches(), 0);
        assert_eq!(provider.batches().count(), 0);
    }
}
