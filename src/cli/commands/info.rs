//! Info command implementation

use super::validate::{format_adaptor_info, format_attack_info, format_training_info};
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{load_config, to_yaml, InfoArgs, MartConfig, OutputFormat};

pub fn run_info(args: InfoArgs, level: LogLevel) -> Result<(), String> {
    let config = match &args.config {
        Some(path) => load_config(path).map_err(|e| format!("Config error: {e}"))?,
        None => MartConfig::default(),
    };

    match args.format {
        OutputFormat::Text => {
            log(level, LogLevel::Normal, "Configuration Info:");
            println!();
            println!("Dataset: {}", config.data.path.display());
            println!(
                "Model: MLP {:?} -> {} classes",
                config.model.hidden, config.model.num_classes
            );
            println!("{}", format_attack_info(&config));
            println!("{}", format_training_info(&config));
            println!("{}", format_adaptor_info(&config));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&config)
                .map_err(|e| format!("JSON serialization error: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Yaml => {
            let yaml = to_yaml(&config).map_err(|e| format!("YAML serialization error: {e}"))?;
            println!("{yaml}");
        }
    }

    Ok(())
}
