//! Reading and writing configuration files

use super::schema::MartConfig;
use super::validate::validate_config;
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Parse YAML text into a validated configuration
pub fn parse_config(yaml: &str) -> Result<MartConfig> {
    let config: MartConfig = serde_yaml::from_str(yaml)
        .map_err(|e| Error::ConfigFile(format!("Failed to parse YAML config: {e}")))?;
    validate_config(&config)?;
    Ok(config)
}

/// Load and validate a YAML configuration file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MartConfig> {
    let path = path.as_ref();
    let yaml = fs::read_to_string(path).map_err(|e| {
        Error::ConfigFile(format!("Failed to read config file {}: {e}", path.display()))
    })?;
    parse_config(&yaml)
}

/// Render a configuration as YAML
pub fn to_yaml(config: &MartConfig) -> Result<String> {
    serde_yaml::to_string(config).map_err(|e| Error::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attack::Norm;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = parse_config("{}").unwrap();
        assert_eq!(config, MartConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let yaml = r#"
attack:
  epsilon: 0.5
  norm: l_2
training:
  epochs: 3
adaptor:
  enabled: "false"
"#;
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.attack.epsilon, 0.5);
        assert_eq!(config.attack.norm, Norm::L2);
        assert_eq!(config.attack.num_steps, 10);
        assert_eq!(config.training.epochs, 3);
        assert!(!config.adaptor.enabled);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = parse_config("training:\n  batch_size: 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = parse_config("attack: [1, 2").unwrap_err();
        assert!(matches!(err, Error::ConfigFile(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "optimizer:\n  lr: 0.05").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.optimizer.lr, 0.05);
    }

    #[test]
    fn test_missing_file() {
        let err = load_config("/nonexistent/run.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_yaml_roundtrip_preserves_config() {
        let config = MartConfig::default().with_epochs(7).with_seed(42);
        let yaml = to_yaml(&config).unwrap();
        assert_eq!(parse_config(&yaml).unwrap(), config);
    }
}
