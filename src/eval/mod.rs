//! Robustness evaluation

mod whitebox;

pub use whitebox::{evaluate_whitebox, RobustnessReport};
