//! Property-based tests for configuration validation

use super::error::ValidationError;
use super::validator::validate_config;
use crate::config::schema::*;
use proptest::prelude::*;

fn arb_valid_config() -> impl Strategy<Value = MartConfig> {
    (
        1usize..512,   // batch_size
        1e-6f32..1.0,  // lr
        1usize..200,   // epochs
        0.0f32..0.5,   // epsilon
        0.0f32..10.0,  // beta
        0.0f32..0.999, // momentum
    )
        .prop_map(|(batch_size, lr, epochs, epsilon, beta, momentum)| {
            let mut config = MartConfig::default()
                .with_batch_sizes(batch_size, batch_size)
                .with_lr(lr)
                .with_epochs(epochs)
                .with_beta(beta);
            config.attack.epsilon = epsilon;
            config.optimizer.momentum = momentum;
            config
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_valid_config_passes(config in arb_valid_config()) {
        prop_assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn prop_lr_above_one_rejected(lr in 1.0001f32..100.0) {
        let config = MartConfig::default().with_lr(lr);
        prop_assert!(matches!(
            validate_config(&config),
            Err(ValidationError::InvalidLearningRate(_))
        ));
    }

    #[test]
    fn prop_negative_beta_rejected(beta in -100.0f32..-1e-6) {
        let config = MartConfig::default().with_beta(beta);
        prop_assert!(matches!(
            validate_config(&config),
            Err(ValidationError::InvalidBeta(_))
        ));
    }
}
