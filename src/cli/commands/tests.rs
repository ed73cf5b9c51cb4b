//! CLI command tests

use super::*;
use crate::cli::LogLevel;
use crate::config::*;
use crate::data::{save_splits, DatasetSplits, LabeledImages};
use ndarray::Array4;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn images(seed: u64, n: usize) -> LabeledImages {
    let mut rng = StdRng::seed_from_u64(seed);
    let pixels = Array4::from_shape_fn((n, 1, 4, 4), |_| rng.random::<f32>());
    LabeledImages::new(pixels, (0..n).map(|i| i % 2).collect()).unwrap()
}

/// Write a tiny 1×4×4 two-class split file
fn create_dataset(dir: &Path) -> PathBuf {
    let path = dir.join("split.safetensors");
    let splits = DatasetSplits {
        train: images(0, 6),
        val: images(1, 4),
        test: images(2, 4),
    };
    save_splits(&splits, &path).unwrap();
    path
}

/// Create a small valid config file pointing into `dir`
fn create_test_config(dir: &TempDir) -> PathBuf {
    let config_path = dir.path().join("mart.yaml");
    let dataset = create_dataset(dir.path());
    let config = format!(
        r#"
attack:
  epsilon: 0.05
  step_size: 0.02
  num_steps: 1
eval:
  attack_iters: 2
  pgd_alpha: 0.02
  test_batch_size: 4
training:
  epochs: 2
  batch_size: 3
  log_interval: 1
adaptor:
  gap: 1
  num_gaps: 1
  meta_start_epoch: 1
  train_mode_epoch: 5
  layer_wise: 0
  times: 1
model:
  hidden: [4]
  num_classes: 2
data:
  path: {}
  pad: 1
  crop: 4
output:
  log_dir: {}
  model_dir: {}
  save_freq: 1
"#,
        dataset.display(),
        dir.path().join("log").display(),
        dir.path().join("ckpt").display()
    );
    std::fs::write(&config_path, config).unwrap();
    config_path
}

#[test]
fn test_validate_command_basic() {
    let dir = TempDir::new().unwrap();
    let args = ValidateArgs {
        config: create_test_config(&dir),
        detailed: true,
    };
    assert!(validate::run_validate(args, LogLevel::Quiet).is_ok());
}

#[test]
fn test_validate_command_rejects_bad_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.yaml");
    std::fs::write(&path, "training:\n  beta: -1.0\n").unwrap();
    let args = ValidateArgs {
        config: path,
        detailed: false,
    };
    let err = validate::run_validate(args, LogLevel::Quiet).unwrap_err();
    assert!(err.contains("Config error"));
}

#[test]
fn test_validate_command_missing_file() {
    let args = ValidateArgs {
        config: PathBuf::from("/nonexistent/mart.yaml"),
        detailed: false,
    };
    assert!(validate::run_validate(args, LogLevel::Quiet).is_err());
}

#[test]
fn test_info_command_formats() {
    let dir = TempDir::new().unwrap();
    let config_path = create_test_config(&dir);
    for format in [OutputFormat::Text, OutputFormat::Json, OutputFormat::Yaml] {
        let args = InfoArgs {
            config: Some(config_path.clone()),
            format,
        };
        assert!(info::run_info(args, LogLevel::Quiet).is_ok());
    }
}

#[test]
fn test_info_command_defaults() {
    let args = InfoArgs {
        config: None,
        format: OutputFormat::Text,
    };
    assert!(info::run_info(args, LogLevel::Quiet).is_ok());
}

#[test]
fn test_resolve_config_applies_overrides() {
    let dir = TempDir::new().unwrap();
    let args = TrainArgs {
        config: Some(create_test_config(&dir)),
        epochs: Some(7),
        no_adapt: true,
        ..TrainArgs::default()
    };
    let config = train::resolve_config(&args).unwrap();
    assert_eq!(config.training.epochs, 7);
    assert!(!config.adaptor.enabled);
    assert!(!config.adaptor.layer_wise);
    assert_eq!(config.adaptor.stop_epoch, 5);
}

#[test]
fn test_resolve_config_rejects_invalid_override() {
    let args = TrainArgs {
        batch_size: Some(0),
        ..TrainArgs::default()
    };
    let err = train::resolve_config(&args).unwrap_err();
    assert!(err.contains("Validation failed"));
}

#[test]
fn test_train_dry_run_does_not_touch_dataset() {
    let args = TrainArgs {
        dataset: Some(PathBuf::from("/nonexistent/split.safetensors")),
        dry_run: true,
        ..TrainArgs::default()
    };
    assert!(train::run_train(args, LogLevel::Quiet).is_ok());
}

#[test]
fn test_train_missing_dataset_fails() {
    let dir = TempDir::new().unwrap();
    let args = TrainArgs {
        config: Some(create_test_config(&dir)),
        dataset: Some(dir.path().join("missing.safetensors")),
        ..TrainArgs::default()
    };
    let err = train::run_train(args, LogLevel::Quiet).unwrap_err();
    assert!(err.contains("Dataset not found"));
}

#[test]
fn test_train_command_end_to_end() {
    let dir = TempDir::new().unwrap();
    let args = TrainArgs {
        config: Some(create_test_config(&dir)),
        ..TrainArgs::default()
    };
    train::run_train(args, LogLevel::Quiet).unwrap();

    assert!(dir.path().join("log/train_stats.json").exists());
    assert!(dir.path().join("ckpt/model-epoch1.safetensors").exists());
    assert!(dir.path().join("ckpt/model-epoch2.safetensors").exists());
}

#[test]
fn test_run_command_dispatch() {
    let dir = TempDir::new().unwrap();
    let config_path = create_test_config(&dir);
    let cli = parse_args([
        "blindaje",
        "--quiet",
        "validate",
        config_path.to_str().unwrap(),
    ])
    .unwrap();
    assert!(run_command(cli).is_ok());
}
