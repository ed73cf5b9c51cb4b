//! Validate command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{load_config, MartConfig, ValidateArgs};

/// Format attack settings as a string
pub fn format_attack_info(config: &MartConfig) -> String {
    let attack = &config.attack;
    [
        format!("  Norm: {:?}", attack.norm),
        format!("  Epsilon: {}", attack.epsilon),
        format!(
            "  Training attack: {} steps of {} ({:?})",
            attack.num_steps, attack.step_size, attack.inner_loss
        ),
        format!(
            "  Evaluation attack: {} steps of {}",
            config.eval.attack_iters, config.eval.pgd_alpha
        ),
    ]
    .join("\n")
}

/// Format training settings as a string
pub fn format_training_info(config: &MartConfig) -> String {
    let training = &config.training;
    let optim = &config.optimizer;
    [
        format!("  Epochs: {}", training.epochs),
        format!(
            "  Batch size: {} (eval {})",
            training.batch_size, config.eval.test_batch_size
        ),
        format!("  Beta: {}", training.beta),
        format!(
            "  SGD: lr={} momentum={} weight_decay={}",
            optim.lr, optim.momentum, optim.weight_decay
        ),
        format!("  Seed: {}", training.seed),
    ]
    .join("\n")
}

/// Format adaptor settings as a string
pub fn format_adaptor_info(config: &MartConfig) -> String {
    let adaptor = &config.adaptor;
    if !adaptor.enabled {
        return "  Adaptor: disabled".to_string();
    }
    let mut lines = vec![
        "  Adaptor:".to_string(),
        format!("    Gaps: {} x {} steps", adaptor.num_gaps, adaptor.gap),
        format!(
            "    Epochs: {}..{}",
            adaptor.meta_start_epoch, adaptor.stop_epoch
        ),
        format!(
            "    Restore: {}",
            if adaptor.layer_wise {
                "layer-wise"
            } else {
                "whole model"
            }
        ),
        format!(
            "    Meta loss: {:?} over {} batches",
            adaptor.meta_loss, adaptor.times
        ),
    ];
    if adaptor.reinitialize {
        lines.push(format!("    Reinitialize: {:?}", adaptor.initialize_type));
    }
    lines.join("\n")
}

/// Format data and output locations as a string
pub fn format_io_info(config: &MartConfig) -> String {
    let mut lines = vec![format!("  Dataset: {}", config.data.path.display())];
    if config.data.augment {
        lines.push(format!(
            "  Augmentation: pad {} crop {}",
            config.data.pad, config.data.crop
        ));
    }
    lines.push(format!("  Metrics: {}", config.output.log_dir.display()));
    if config.output.save_freq > 0 {
        lines.push(format!(
            "  Checkpoints: {} every {} epochs",
            config.output.model_dir.display(),
            config.output.save_freq
        ));
    }
    lines.join("\n")
}

/// Print detailed configuration summary
pub fn print_detailed_summary(config: &MartConfig) {
    println!();
    println!("Configuration Summary:");
    println!("{}", format_attack_info(config));
    println!();
    println!("{}", format_training_info(config));
    println!();
    println!("{}", format_adaptor_info(config));
    println!();
    println!("{}", format_io_info(config));
}

pub fn run_validate(args: ValidateArgs, level: LogLevel) -> Result<(), String> {
    log(
        level,
        LogLevel::Normal,
        &format!("Validating config: {}", args.config.display()),
    );

    let config = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;

    log(level, LogLevel::Normal, "Configuration is valid");

    if args.detailed && level != LogLevel::Quiet {
        print_detailed_summary(&config);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapt::{AdaptorConfig, MomentumInit};
    use crate::attack::Norm;

    #[test]
    fn test_format_attack_info() {
        let config = MartConfig::default().with_norm(Norm::L2);
        let info = format_attack_info(&config);
        assert!(info.contains("L2"));
        assert!(info.contains("Epsilon: 0.031"));
        assert!(info.contains("20 steps of 0.003"));
    }

    #[test]
    fn test_format_training_info() {
        let info = format_training_info(&MartConfig::default());
        assert!(info.contains("Epochs: 120"));
        assert!(info.contains("Batch size: 128 (eval 100)"));
        assert!(info.contains("Beta: 5"));
    }

    #[test]
    fn test_format_adaptor_info() {
        let info = format_adaptor_info(&MartConfig::default());
        assert!(info.contains("4 x 100 steps"));
        assert!(info.contains("layer-wise"));
        assert!(!info.contains("Reinitialize"));

        let adaptor = AdaptorConfig::default()
            .with_layer_wise(false)
            .with_reinitialize(MomentumInit::One);
        let info = format_adaptor_info(&MartConfig::default().with_adaptor(adaptor));
        assert!(info.contains("whole model"));
        assert!(info.contains("Reinitialize: One"));
    }

    #[test]
    fn test_format_adaptor_disabled() {
        let mut adaptor = AdaptorConfig::default();
        adaptor.enabled = false;
        let info = format_adaptor_info(&MartConfig::default().with_adaptor(adaptor));
        assert_eq!(info, "  Adaptor: disabled");
    }

    #[test]
    fn test_format_io_info() {
        let info = format_io_info(&MartConfig::default());
        assert!(info.contains("cifar10_validation_split.safetensors"));
        assert!(info.contains("pad 4 crop 32"));
        assert!(info.contains("every 1 epochs"));
    }
}
