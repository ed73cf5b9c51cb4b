//! Safetensors split files
//!
//! A split file carries `{train,val,test}.data` (u8 `[N, H, W, C]`) and
//! `{train,val,test}.labels` (i64 `[N]`). Pixels are scaled to `[0, 1]` and
//! transposed to `[N, C, H, W]` on load.

use super::LabeledImages;
use crate::{Error, Result};
use ndarray::Array4;
use safetensors::tensor::TensorView;
use safetensors::{Dtype, SafeTensors};
use std::path::Path;

/// Split names stored in a dataset file
pub const SPLITS: [&str; 3] = ["train", "val", "test"];

/// Train, validation and test sets from one file
#[derive(Debug, Clone)]
pub struct DatasetSplits {
    pub train: LabeledImages,
    pub val: LabeledImages,
    pub test: LabeledImages,
}

impl DatasetSplits {
    /// Number of classes across all splits
    pub fn num_classes(&self) -> usize {
        [&self.train, &self.val, &self.test]
            .iter()
            .map(|s| s.num_classes())
            .max()
            .unwrap_or(0)
    }
}

/// Load all three splits from `path`
pub fn load_splits(path: impl AsRef<Path>) -> Result<DatasetSplits> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::DatasetNotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = std::fs::read(path)?;
    let dataset_error = |message: String| Error::Dataset {
        path: path.to_path_buf(),
        message,
    };

    let tensors = SafeTensors::deserialize(&bytes)
        .map_err(|e| dataset_error(format!("SafeTensors parsing failed: {e}")))?;

    let load = |split: &str| -> Result<LabeledImages> {
        let data = tensors
            .tensor(&format!("{split}.data"))
            .map_err(|e| dataset_error(format!("missing {split}.data: {e}")))?;
        let labels = tensors
            .tensor(&format!("{split}.labels"))
            .map_err(|e| dataset_error(format!("missing {split}.labels: {e}")))?;
        decode_split(split, &data, &labels).map_err(dataset_error)
    };

    Ok(DatasetSplits {
        train: load("train")?,
        val: load("val")?,
        test: load("test")?,
    })
}

fn decode_split(
    split: &str,
    data: &TensorView<'_>,
    labels: &TensorView<'_>,
) -> std::result::Result<LabeledImages, String> {
    if data.dtype() != Dtype::U8 {
        return Err(format!("{split}.data must be u8, got {:?}", data.dtype()));
    }
    let &[n, h, w, c] = data.shape() else {
        return Err(format!("{split}.data must be [N, H, W, C], got {:?}", data.shape()));
    };
    if labels.dtype() != Dtype::I64 {
        return Err(format!("{split}.labels must be i64, got {:?}", labels.dtype()));
    }
    if labels.shape() != [n].as_slice() {
        return Err(format!(
            "{split}.labels must have shape [{n}], got {:?}",
            labels.shape()
        ));
    }

    let pixels = data.data();
    let images = Array4::from_shape_fn((n, c, h, w), |(i, ch, y, x)| {
        f32::from(pixels[((i * h + y) * w + x) * c + ch]) / 255.0
    });

    let targets = labels
        .data()
        .chunks_exact(8)
        .map(bytemuck::pod_read_unaligned::<i64>)
        .map(|label| {
            usize::try_from(label).map_err(|_| format!("negative label {label} in {split}"))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    LabeledImages::new(images, targets).map_err(|e| e.to_string())
}

/// Write splits in the on-disk layout read by [`load_splits`]
///
/// Pixels are quantized to u8; labels are stored as i64.
pub fn save_splits(splits: &DatasetSplits, path: impl AsRef<Path>) -> Result<()> {
    let mut encoded: Vec<(String, Dtype, Vec<usize>, Vec<u8>)> = Vec::new();
    for (name, set) in SPLITS.iter().zip([&splits.train, &splits.val, &splits.test]) {
        let (n, c, h, w) = set.images().dim();
        let mut pixels = Vec::with_capacity(n * c * h * w);
        for i in 0..n {
            for y in 0..h {
                for x in 0..w {
                    for ch in 0..c {
                        let v = set.images()[[i, ch, y, x]].clamp(0.0, 1.0);
                        pixels.push((v * 255.0).round() as u8);
                    }
                }
            }
        }
        encoded.push((format!("{name}.data"), Dtype::U8, vec![n, h, w, c], pixels));

        let labels: Vec<i64> = set.labels().iter().map(|&l| l as i64).collect();
        encoded.push((
            format!("{name}.labels"),
            Dtype::I64,
            vec![n],
            bytemuck::cast_slice(&labels).to_vec(),
        ));
    }

    let views = encoded
        .iter()
        .map(|(name, dtype, shape, bytes)| {
            TensorView::new(*dtype, shape.clone(), bytes)
                .map(|view| (name.as_str(), view))
                .map_err(|e| Error::Serialization(format!("Invalid tensor {name}: {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

    let bytes = safetensors::serialize(views, None)
        .map_err(|e| Error::Serialization(format!("SafeTensors serialization failed: {e}")))?;
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tiny_set(n: usize, offset: usize) -> LabeledImages {
        let images = Array4::from_shape_fn((n, 3, 2, 2), |(i, c, y, x)| {
            ((i * 37 + c * 11 + y * 5 + x + offset) % 256) as f32 / 255.0
        });
        LabeledImages::new(images, (0..n).map(|i| (i + offset) % 10).collect()).unwrap()
    }

    #[test]
    fn test_save_load_preserves_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("split.safetensors");
        let splits = DatasetSplits {
            train: tiny_set(5, 0),
            val: tiny_set(2, 3),
            test: tiny_set(3, 7),
        };
        save_splits(&splits, &path).unwrap();

        let loaded = load_splits(&path).unwrap();
        assert_eq!(loaded.train.len(), 5);
        assert_eq!(loaded.val.labels(), splits.val.labels());
        assert_eq!(loaded.test.image_shape(), (3, 2, 2));
        // Values are multiples of 1/255 so quantization is exact
        for (a, b) in loaded.train.images().iter().zip(splits.train.images()) {
            assert!((a - b).abs() < 1e-6);
        }
        assert_eq!(loaded.num_classes(), 10);
    }

    #[test]
    fn test_missing_file() {
        let err = load_splits("/nonexistent/split.safetensors").unwrap_err();
        assert!(matches!(err, Error::DatasetNotFound { .. }));
    }

    #[test]
    fn test_garbage_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.safetensors");
        std::fs::write(&path, b"not a safetensors file").unwrap();
        let err = load_splits(&path).unwrap_err();
        assert!(matches!(err, Error::Dataset { .. }));
    }

    #[test]
    fn test_missing_split() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.safetensors");
        let pixels = vec![0u8; 4];
        let view = TensorView::new(Dtype::U8, vec![1, 2, 2, 1], &pixels).unwrap();
        let bytes = safetensors::serialize(vec![("train.data", view)], None).unwrap();
        std::fs::write(&path, bytes).unwrap();

        let err = load_splits(&path).unwrap_err();
        assert!(err.to_string().contains("train.labels"));
    }

    #[test]
    fn test_channel_transpose() {
        // One 1x2 image with 3 channels stored HWC
        let images = Array4::from_shape_vec(
            (1, 3, 1, 2),
            vec![0.0, 1.0, 51.0 / 255.0, 102.0 / 255.0, 1.0, 0.0],
        )
        .unwrap();
        let set = LabeledImages::new(images.clone(), vec![4]).unwrap();
        let splits = DatasetSplits {
            train: set.clone(),
            val: set.clone(),
            test: set,
        };
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hwc.safetensors");
        save_splits(&splits, &path).unwrap();
        let loaded = load_splits(&path).unwrap();
        for (a, b) in loaded.test.images().iter().zip(images.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}
