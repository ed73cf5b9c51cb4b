//! Configuration validation logic

use super::error::ValidationError;
use crate::config::schema::MartConfig;

fn non_negative(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}

/// Validate a run configuration
///
/// Checks numeric ranges only; the dataset path is checked when it is opened.
pub fn validate_config(config: &MartConfig) -> Result<(), ValidationError> {
    let attack = &config.attack;
    if !non_negative(attack.epsilon) {
        return Err(ValidationError::InvalidEpsilon(attack.epsilon));
    }
    if !non_negative(attack.step_size) {
        return Err(ValidationError::InvalidStepSize(attack.step_size));
    }
    if !non_negative(config.eval.pgd_alpha) {
        return Err(ValidationError::InvalidStepSize(config.eval.pgd_alpha));
    }
    if !non_negative(config.training.beta) {
        return Err(ValidationError::InvalidBeta(config.training.beta));
    }

    if config.training.batch_size == 0 {
        return Err(ValidationError::InvalidBatchSize(config.training.batch_size));
    }
    if config.eval.test_batch_size == 0 {
        return Err(ValidationError::InvalidTestBatchSize(
            config.eval.test_batch_size,
        ));
    }
    if config.training.epochs == 0 {
        return Err(ValidationError::InvalidEpochs(config.training.epochs));
    }
    if config.training.log_interval == 0 {
        return Err(ValidationError::InvalidLogInterval(
            config.training.log_interval,
        ));
    }

    let optim = &config.optimizer;
    if !(optim.lr > 0.0 && optim.lr <= 1.0) {
        return Err(ValidationError::InvalidLearningRate(optim.lr));
    }
    if !(0.0..1.0).contains(&optim.momentum) {
        return Err(ValidationError::InvalidMomentum(optim.momentum));
    }
    if !non_negative(optim.weight_decay) {
        return Err(ValidationError::InvalidWeightDecay(optim.weight_decay));
    }

    let adaptor = &config.adaptor;
    if adaptor.enabled {
        if adaptor.gap == 0 {
            return Err(ValidationError::InvalidGap(adaptor.gap));
        }
        if adaptor.times == 0 {
            return Err(ValidationError::InvalidTimes(adaptor.times));
        }
        if adaptor.meta_start_epoch > adaptor.stop_epoch {
            return Err(ValidationError::InvalidAdaptorWindow {
                start: adaptor.meta_start_epoch,
                stop: adaptor.stop_epoch,
            });
        }
    }

    if config.model.num_classes < 2 {
        return Err(ValidationError::InvalidNumClasses(config.model.num_classes));
    }
    if let Some(i) = config.model.hidden.iter().position(|&w| w == 0) {
        return Err(ValidationError::EmptyHiddenLayer(i));
    }
    if config.data.crop == 0 {
        return Err(ValidationError::InvalidCrop(config.data.crop));
    }

    Ok(())
}
