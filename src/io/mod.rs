//! Metrics history and checkpoint I/O

mod checkpoint;
mod history;

pub use checkpoint::{checkpoint_path, load_checkpoint, save_checkpoint};
pub use history::{EpochHistory, EpochRecord, MetricsSink};
