//! Optimizers and learning-rate schedules

mod optimizer;
mod scheduler;
mod sgd;

pub use optimizer::{ensure_bound, Optimizer};
pub use scheduler::{LRScheduler, MilestoneLR};
pub use sgd::SGD;
