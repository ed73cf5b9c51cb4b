//! Validation error types

/// Validation error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid epsilon: {0} (must be finite and >= 0.0)")]
    InvalidEpsilon(f32),

    #[error("Invalid step size: {0} (must be finite and >= 0.0)")]
    InvalidStepSize(f32),

    #[error("Invalid beta: {0} (must be finite and >= 0.0)")]
    InvalidBeta(f32),

    #[error("Invalid batch size: {0} (must be > 0)")]
    InvalidBatchSize(usize),

    #[error("Invalid test batch size: {0} (must be > 0)")]
    InvalidTestBatchSize(usize),

    #[error("Invalid epochs: {0} (must be > 0)")]
    InvalidEpochs(usize),

    #[error("Invalid learning rate: {0} (must be > 0.0 and <= 1.0)")]
    InvalidLearningRate(f32),

    #[error("Invalid momentum: {0} (must be in [0.0, 1.0))")]
    InvalidMomentum(f32),

    #[error("Invalid weight decay: {0} (must be finite and >= 0.0)")]
    InvalidWeightDecay(f32),

    #[error("Invalid log interval: {0} (must be > 0)")]
    InvalidLogInterval(usize),

    #[error("Invalid adaptor gap: {0} (must be > 0)")]
    InvalidGap(usize),

    #[error("Invalid adaptor times: {0} (must be > 0)")]
    InvalidTimes(usize),

    #[error("Invalid adaptor window: meta_start_epoch {start} must not exceed stop_epoch {stop}")]
    InvalidAdaptorWindow { start: usize, stop: usize },

    #[error("Invalid class count: {0} (must be >= 2)")]
    InvalidNumClasses(usize),

    #[error("Hidden layer {0} has zero width")]
    EmptyHiddenLayer(usize),

    #[error("Invalid crop size: {0} (must be > 0)")]
    InvalidCrop(usize),
}
