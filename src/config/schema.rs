//! YAML schema for adversarial training runs
//!
//! Every section defaults to the reference hyperparameters, so an empty file is a
//! valid configuration and a partial file only overrides what it names.

use crate::adapt::AdaptorConfig;
use crate::attack::{MartPerturbation, Norm, PgdWhitebox};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Deserialize a bool from `true`, `"true"`, or the integers `0`/`1`.
///
/// Older run scripts pass switches such as `layer_wise` as integers.
pub(crate) fn deserialize_bool_lenient<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Switch {
        Bool(bool),
        Int(i64),
        Str(String),
    }

    match Switch::deserialize(deserializer)? {
        Switch::Bool(b) => Ok(b),
        Switch::Int(0) => Ok(false),
        Switch::Int(1) => Ok(true),
        Switch::Int(other) => Err(serde::de::Error::custom(format!(
            "expected 0 or 1, got {other}"
        ))),
        Switch::Str(s) => match s.to_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected 'true' or 'false', got '{other}'"
            ))),
        },
    }
}

/// Complete run configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MartConfig {
    /// Training-time perturbation
    pub attack: MartPerturbation,
    /// White-box evaluation attack
    pub eval: EvalSpec,
    pub training: TrainingSpec,
    pub optimizer: OptimSpec,
    pub adaptor: AdaptorConfig,
    pub model: ModelSpec,
    pub data: DataSpec,
    pub output: OutputSpec,
}

/// Evaluation attack and batching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalSpec {
    /// PGD steps at evaluation time
    pub attack_iters: usize,
    /// PGD step length at evaluation time
    pub pgd_alpha: f32,
    pub test_batch_size: usize,
}

impl Default for EvalSpec {
    fn default() -> Self {
        Self {
            attack_iters: 20,
            pgd_alpha: 0.003,
            test_batch_size: 100,
        }
    }
}

/// Outer training loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingSpec {
    pub epochs: usize,
    pub batch_size: usize,
    /// Weight of the robust KL term
    pub beta: f32,
    pub seed: u64,
    /// Batches between progress log lines
    pub log_interval: usize,
}

impl Default for TrainingSpec {
    fn default() -> Self {
        Self {
            epochs: 120,
            batch_size: 128,
            beta: 5.0,
            seed: 1,
            log_interval: 100,
        }
    }
}

/// SGD hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimSpec {
    /// Base learning rate before milestone decay
    pub lr: f32,
    pub momentum: f32,
    pub weight_decay: f32,
}

impl Default for OptimSpec {
    fn default() -> Self {
        Self {
            lr: 0.01,
            momentum: 0.9,
            weight_decay: 3.5e-3,
        }
    }
}

/// Bundled MLP classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSpec {
    /// Hidden layer widths
    pub hidden: Vec<usize>,
    pub num_classes: usize,
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self {
            hidden: vec![512, 256],
            num_classes: 10,
        }
    }
}

/// Dataset location and augmentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSpec {
    /// Safetensors split file with train/val/test tensors
    pub path: PathBuf,
    /// Reflect padding applied to training images
    pub pad: usize,
    /// Side of the random training crop
    pub crop: usize,
    #[serde(deserialize_with = "deserialize_bool_lenient")]
    pub augment: bool,
}

impl Default for DataSpec {
    fn default() -> Self {
        Self {
            path: PathBuf::from("cifar10_validation_split.safetensors"),
            pad: 4,
            crop: 32,
            augment: true,
        }
    }
}

/// Metrics and checkpoint destinations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSpec {
    /// Directory receiving `train_stats.json`
    pub log_dir: PathBuf,
    /// Directory receiving checkpoints
    pub model_dir: PathBuf,
    /// Epochs between checkpoints; 0 disables them
    pub save_freq: usize,
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("./log"),
            model_dir: PathBuf::from("./checkpoints"),
            save_freq: 1,
        }
    }
}

impl MartConfig {
    /// Evaluation attack sharing the training budget and norm
    pub fn pgd(&self) -> PgdWhitebox {
        PgdWhitebox::new(
            self.attack.epsilon,
            self.eval.pgd_alpha,
            self.eval.attack_iters,
            self.attack.norm,
        )
    }

    pub fn with_attack(mut self, attack: MartPerturbation) -> Self {
        self.attack = attack;
        self
    }

    pub fn with_norm(mut self, norm: Norm) -> Self {
        self.attack.norm = norm;
        self
    }

    pub fn with_eval_attack(mut self, attack_iters: usize, pgd_alpha: f32) -> Self {
        self.eval.attack_iters = attack_iters;
        self.eval.pgd_alpha = pgd_alpha;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.training.epochs = epochs;
        self
    }

    pub fn with_batch_sizes(mut self, batch_size: usize, test_batch_size: usize) -> Self {
        self.training.batch_size = batch_size;
        self.eval.test_batch_size = test_batch_size;
        self
    }

    pub fn with_beta(mut self, beta: f32) -> Self {
        self.training.beta = beta;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.training.seed = seed;
        self
    }

    pub fn with_lr(mut self, lr: f32) -> Self {
        self.optimizer.lr = lr;
        self
    }

    pub fn with_adaptor(mut self, adaptor: AdaptorConfig) -> Self {
        self.adaptor = adaptor;
        self
    }

    pub fn with_hidden(mut self, hidden: Vec<usize>) -> Self {
        self.model.hidden = hidden;
        self
    }

    pub fn with_dataset(mut self, path: impl Into<PathBuf>) -> Self {
        self.data.path = path.into();
        self
    }

    pub fn with_output(
        mut self,
        log_dir: impl Into<PathBuf>,
        model_dir: impl Into<PathBuf>,
    ) -> Self {
        self.output.log_dir = log_dir.into();
        self.output.model_dir = model_dir.into();
        self
    }
}
