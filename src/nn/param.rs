//! Trainable parameters and parameter-set identity

use ndarray::Array2;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PARAM_SET: AtomicU64 = AtomicU64::new(1);

/// Identity of a model's parameter set.
///
/// Every model instance owns exactly one id; cloning a model allocates a new one.
/// Optimizers record the id they were built for so a replaced model can never be
/// updated through a stale optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamSetId(u64);

impl ParamSetId {
    /// Allocate a process-unique id
    pub fn fresh() -> Self {
        Self(NEXT_PARAM_SET.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ParamSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A named 2-D parameter with an optional accumulated gradient
#[derive(Debug, Clone)]
pub struct Param {
    name: String,
    layer: usize,
    value: Array2<f32>,
    grad: Option<Array2<f32>>,
}

impl Param {
    /// Create a parameter belonging to `layer`
    pub fn new(name: impl Into<String>, layer: usize, value: Array2<f32>) -> Self {
        Self {
            name: name.into(),
            layer,
            value,
            grad: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index of the layer this parameter belongs to
    pub fn layer(&self) -> usize {
        self.layer
    }

    pub fn value(&self) -> &Array2<f32> {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut Array2<f32> {
        &mut self.value
    }

    pub fn shape(&self) -> (usize, usize) {
        self.value.dim()
    }

    pub fn grad(&self) -> Option<&Array2<f32>> {
        self.grad.as_ref()
    }

    /// Drop the accumulated gradient
    pub fn zero_grad(&mut self) {
        self.grad = None;
    }

    /// Add `grad` to the accumulated gradient
    pub fn accumulate_grad(&mut self, grad: Array2<f32>) {
        assert_eq!(
            grad.dim(),
            self.value.dim(),
            "Gradient shape must match parameter {}",
            self.name
        );
        match self.grad.as_mut() {
            Some(existing) => *existing += &grad,
            None => self.grad = Some(grad),
        }
    }
}
