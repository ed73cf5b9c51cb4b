//! Image datasets and batch providers
//!
//! - [`Batch`] - images plus labels
//! - [`BatchProvider`] - lazy, epoch-aware batch source
//! - [`InMemoryProvider`] - shuffled/augmented or fixed-order provider over [`LabeledImages`]
//! - [`load_splits`] / [`save_splits`] - safetensors split files

mod augment;
mod batch;
mod images;
mod loader;
mod provider;

pub use augment::{reflect_pad, Augmentation, CropChoice};
pub use batch::Batch;
pub use images::LabeledImages;
pub use loader::{load_splits, save_splits, DatasetSplits, SPLITS};
pub use provider::{BatchProvider, InMemoryProvider};

use crate::config::DataSpec;
use crate::{Error, Result};

/// Providers for one run: shuffled training data, fixed-order validation and test data
#[derive(Debug, Clone)]
pub struct SplitProviders {
    pub train: InMemoryProvider,
    pub val: InMemoryProvider,
    pub test: InMemoryProvider,
}

impl SplitProviders {
    /// Build providers; training images are reflect-padded and cropped when `spec.augment`
    pub fn from_splits(
        splits: DatasetSplits,
        spec: &DataSpec,
        batch_size: usize,
        test_batch_size: usize,
    ) -> Result<Self> {
        let DatasetSplits { train, val, test } = splits;
        let (c, h, w) = train.image_shape();
        for other in [&val, &test] {
            let (oc, oh, ow) = other.image_shape();
            if !other.is_empty() && (oc, oh, ow) != (c, h, w) {
                return Err(Error::ShapeMismatch {
                    expected: vec![c, h, w],
                    actual: vec![oc, oh, ow],
                });
            }
        }
        // Crops must come out at the evaluation image size
        let train = if spec.augment {
            if (spec.crop, spec.crop) != (h, w) {
                return Err(Error::ShapeMismatch {
                    expected: vec![h, w],
                    actual: vec![spec.crop, spec.crop],
                });
            }
            let padded = reflect_pad(train.images(), spec.pad)?;
            let padded = LabeledImages::new(padded, train.labels().to_vec())?;
            InMemoryProvider::shuffled(padded, batch_size)
                .with_augmentation(Augmentation::new(spec.crop))
        } else {
            InMemoryProvider::shuffled(train, batch_size)
        };
        Ok(Self {
            train,
            val: InMemoryProvider::sequential(val, test_batch_size),
            test: InMemoryProvider::sequential(test, test_batch_size),
        })
    }
}
