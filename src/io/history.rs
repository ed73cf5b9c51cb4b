//! Per-epoch metrics history and its JSON sink

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Metrics of one completed epoch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochRecord {
    pub natural_acc: f32,
    pub robust_acc: f32,
    pub train_loss: f32,
    pub lr: f32,
    pub seconds: f64,
}

/// Parallel per-epoch sequences, one entry per completed epoch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpochHistory {
    pub natural_acc: Vec<f32>,
    pub robust_acc: Vec<f32>,
    #[serde(default)]
    pub train_loss: Vec<f32>,
    #[serde(default)]
    pub lr: Vec<f32>,
    #[serde(default)]
    pub epoch_secs: Vec<f64>,
}

impl EpochHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: EpochRecord) {
        self.natural_acc.push(record.natural_acc);
        self.robust_acc.push(record.robust_acc);
        self.train_loss.push(record.train_loss);
        self.lr.push(record.lr);
        self.epoch_secs.push(record.seconds);
    }

    /// Completed epochs
    pub fn len(&self) -> usize {
        self.natural_acc.len()
    }

    pub fn is_empty(&self) -> bool {
        self.natural_acc.is_empty()
    }

    /// Highest robust accuracy and its 1-based epoch
    pub fn best_robust(&self) -> Option<(usize, f32)> {
        self.robust_acc
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best, (i, acc)| match best {
                Some((_, b)) if b >= acc => best,
                _ => Some((i + 1, acc)),
            })
    }

    pub fn last(&self) -> Option<EpochRecord> {
        let i = self.len().checked_sub(1)?;
        Some(EpochRecord {
            natural_acc: self.natural_acc[i],
            robust_acc: self.robust_acc[i],
            train_loss: self.train_loss.get(i).copied().unwrap_or(f32::NAN),
            lr: self.lr.get(i).copied().unwrap_or(f32::NAN),
            seconds: self.epoch_secs.get(i).copied().unwrap_or(0.0),
        })
    }
}

/// Writes the full history to one JSON file, replacing it every time
#[derive(Debug, Clone)]
pub struct MetricsSink {
    path: PathBuf,
}

impl MetricsSink {
    /// Sink writing `<dir>/train_stats.json`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join("train_stats.json"))
    }

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the file with `history` via a temp file and rename
    pub fn write(&self, history: &EpochHistory) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(history)
            .map_err(|e| Error::Serialization(format!("JSON serialization failed: {e}")))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Read back a previously written history
    pub fn read(&self) -> Result<EpochHistory> {
        let text = fs::read_to_string(&self.path)?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Serialization(format!("JSON deserialization failed: {e}")))
    }
}
