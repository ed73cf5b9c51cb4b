//! Core CLI types - Cli, Command, and argument structs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::types::OutputFormat;
use crate::adapt::MetaLoss;
use crate::attack::{InnerLoss, Norm};
use crate::config::MartConfig;

/// Blindaje: misclassification-aware adversarial training
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "blindaje")]
#[command(version)]
#[command(
    about = "Adversarial training with the MART objective and a validation-guided adaptor"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run adversarial training
    Train(TrainArgs),

    /// Validate a configuration file without training
    Validate(ValidateArgs),

    /// Display the resolved configuration
    Info(InfoArgs),
}

/// Arguments for the train command
#[derive(Parser, Debug, Clone, PartialEq, Default)]
pub struct TrainArgs {
    /// YAML configuration file; defaults apply when omitted
    #[arg(short, long, value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Safetensors split file
    #[arg(long)]
    pub dataset: Option<PathBuf>,

    /// Override number of epochs
    #[arg(short, long)]
    pub epochs: Option<usize>,

    /// Override training batch size
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Override evaluation batch size
    #[arg(long)]
    pub test_batch_size: Option<usize>,

    /// Override base learning rate
    #[arg(long)]
    pub lr: Option<f32>,

    /// Override SGD weight decay
    #[arg(long)]
    pub weight_decay: Option<f32>,

    /// Perturbation radius
    #[arg(long)]
    pub epsilon: Option<f32>,

    /// Training attack step length
    #[arg(long)]
    pub step_size: Option<f32>,

    /// Training attack steps
    #[arg(long)]
    pub num_steps: Option<usize>,

    /// Training attack objective
    #[arg(long, value_enum)]
    pub inner_loss: Option<InnerLoss>,

    /// Evaluation PGD steps
    #[arg(long)]
    pub attack_iters: Option<usize>,

    /// Evaluation PGD step length
    #[arg(long)]
    pub pgd_alpha: Option<f32>,

    /// Weight of the robust term
    #[arg(long)]
    pub beta: Option<f32>,

    /// Threat-model norm
    #[arg(long, value_enum)]
    pub norm: Option<Norm>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Batches between progress lines
    #[arg(long)]
    pub log_interval: Option<usize>,

    /// Train without the adaptor
    #[arg(long)]
    pub no_adapt: bool,

    /// Optimizer steps per adaptor gap
    #[arg(long)]
    pub gap: Option<usize>,

    /// Adaptor gaps per epoch
    #[arg(long)]
    pub num_gaps: Option<usize>,

    /// First epoch with adaptor gaps
    #[arg(long)]
    pub meta_start_epoch: Option<usize>,

    /// Epoch from which the adaptor is dormant
    #[arg(long, alias = "train-mode-epoch")]
    pub stop_epoch: Option<usize>,

    /// Restore layer by layer (true) or whole model (false)
    #[arg(long)]
    pub layer_wise: Option<bool>,

    /// Validation batches per adaptor comparison
    #[arg(long)]
    pub times: Option<usize>,

    /// Adaptor scoring objective
    #[arg(long, value_enum)]
    pub meta_loss: Option<MetaLoss>,

    /// Metrics directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Checkpoint directory
    #[arg(long)]
    pub model_dir: Option<PathBuf>,

    /// Epochs between checkpoints (0 disables)
    #[arg(long)]
    pub save_freq: Option<usize>,

    /// Dry run (validate config but don't train)
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Show the resolved configuration after validation
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for the info command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct InfoArgs {
    /// YAML configuration file; defaults apply when omitted
    #[arg(value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format (text, json, yaml)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Parse CLI arguments from a string slice (for testing)
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Apply command-line overrides to a configuration
pub fn apply_overrides(config: &mut MartConfig, args: &TrainArgs) {
    if let Some(path) = &args.dataset {
        config.data.path = path.clone();
    }
    if let Some(epochs) = args.epochs {
        config.training.epochs = epochs;
    }
    if let Some(batch_size) = args.batch_size {
        config.training.batch_size = batch_size;
    }
    if let Some(test_batch_size) = args.test_batch_size {
        config.eval.test_batch_size = test_batch_size;
    }
    if let Some(lr) = args.lr {
        config.optimizer.lr = lr;
    }
    if let Some(weight_decay) = args.weight_decay {
        config.optimizer.weight_decay = weight_decay;
    }

    if let Some(epsilon) = args.epsilon {
        config.attack.epsilon = epsilon;
    }
    if let Some(step_size) = args.step_size {
        config.attack.step_size = step_size;
    }
    if let Some(num_steps) = args.num_steps {
        config.attack.num_steps = num_steps;
    }
    if let Some(inner_loss) = args.inner_loss {
        config.attack.inner_loss = inner_loss;
    }
    if let Some(norm) = args.norm {
        config.attack.norm = norm;
    }
    if let Some(attack_iters) = args.attack_iters {
        config.eval.attack_iters = attack_iters;
    }
    if let Some(pgd_alpha) = args.pgd_alpha {
        config.eval.pgd_alpha = pgd_alpha;
    }
    if let Some(beta) = args.beta {
        config.training.beta = beta;
    }
    if let Some(seed) = args.seed {
        config.training.seed = seed;
    }
    if let Some(log_interval) = args.log_interval {
        config.training.log_interval = log_interval;
    }

    let adaptor = &mut config.adaptor;
    if args.no_adapt {
        adaptor.enabled = false;
    }
    if let Some(gap) = args.gap {
        adaptor.gap = gap;
    }
    if let Some(num_gaps) = args.num_gaps {
        adaptor.num_gaps = num_gaps;
    }
    if let Some(start) = args.meta_start_epoch {
        adaptor.meta_start_epoch = start;
    }
    if let Some(stop) = args.stop_epoch {
        adaptor.stop_epoch = stop;
    }
    if let Some(layer_wise) = args.layer_wise {
        adaptor.layer_wise = layer_wise;
    }
    if let Some(times) = args.times {
        adaptor.times = times;
    }
    if let Some(meta_loss) = args.meta_loss {
        adaptor.meta_loss = meta_loss;
    }

    if let Some(log_dir) = &args.log_dir {
        config.output.log_dir = log_dir.clone();
    }
    if let Some(model_dir) = &args.model_dir {
        config.output.model_dir = model_dir.clone();
    }
    if let Some(save_freq) = args.save_freq {
        config.output.save_freq = save_freq;
    }
}
