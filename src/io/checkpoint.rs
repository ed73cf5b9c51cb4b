//! Model checkpoints in safetensors format

use crate::nn::Classifier;
use crate::{Error, Result};
use safetensors::tensor::TensorView;
use safetensors::{Dtype, SafeTensors};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Checkpoint file name for `epoch`
pub fn checkpoint_path(dir: impl AsRef<Path>, epoch: usize) -> PathBuf {
    dir.as_ref().join(format!("model-epoch{epoch}.safetensors"))
}

/// Save every parameter of `model`, recording `epoch` in the metadata
pub fn save_checkpoint<M>(model: &M, path: impl AsRef<Path>, epoch: usize) -> Result<()>
where
    M: Classifier + ?Sized,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let params = model.params();
    let tensor_data: Vec<(String, Vec<u8>, Vec<usize>)> = params
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let values: Vec<f32> = p.value().iter().copied().collect();
            let (rows, cols) = p.shape();
            (
                format!("{i:03}.{}", p.name()),
                bytemuck::cast_slice(&values).to_vec(),
                vec![rows, cols],
            )
        })
        .collect();

    let views = tensor_data
        .iter()
        .map(|(name, bytes, shape)| {
            TensorView::new(Dtype::F32, shape.clone(), bytes)
                .map(|view| (name.as_str(), view))
                .map_err(|e| Error::Serialization(format!("Invalid tensor {name}: {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut metadata = HashMap::new();
    metadata.insert("epoch".to_string(), epoch.to_string());
    metadata.insert("param_count".to_string(), params.len().to_string());

    let bytes = safetensors::serialize(views, Some(metadata))
        .map_err(|e| Error::Serialization(format!("SafeTensors serialization failed: {e}")))?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Load parameter values saved by [`save_checkpoint`] into `model`
///
/// Returns the stored epoch.
pub fn load_checkpoint<M>(model: &mut M, path: impl AsRef<Path>) -> Result<usize>
where
    M: Classifier + ?Sized,
{
    let data = std::fs::read(path.as_ref())?;
    let (_, header) = SafeTensors::read_metadata(&data)
        .map_err(|e| Error::Serialization(format!("SafeTensors parsing failed: {e}")))?;
    let epoch: usize = header
        .metadata()
        .as_ref()
        .and_then(|m| m.get("epoch"))
        .and_then(|e| e.parse().ok())
        .ok_or_else(|| Error::Serialization("Checkpoint has no epoch metadata".to_string()))?;

    let tensors = SafeTensors::deserialize(&data)
        .map_err(|e| Error::Serialization(format!("SafeTensors parsing failed: {e}")))?;

    for (i, param) in model.params_mut().into_iter().enumerate() {
        let name = format!("{i:03}.{}", param.name());
        let view = tensors
            .tensor(&name)
            .map_err(|e| Error::Serialization(format!("Missing tensor {name}: {e}")))?;
        let (rows, cols) = param.shape();
        if view.dtype() != Dtype::F32 || view.shape() != [rows, cols].as_slice() {
            return Err(Error::ShapeMismatch {
                expected: vec![rows, cols],
                actual: view.shape().to_vec(),
            });
        }
        let values = view
            .data()
            .chunks_exact(4)
            .map(bytemuck::pod_read_unaligned::<f32>);
        for (dst, src) in param.value_mut().iter_mut().zip(values) {
            *dst = src;
        }
    }
    Ok(epoch)
}
