//! Single-command training from configuration

use super::builder::{build_hook, build_model, build_optimizer};
use super::loader::load_config;
use super::schema::MartConfig;
use super::validate::validate_config;
use crate::data::{load_splits, SplitProviders};
use crate::error::{Error, Result};
use crate::io::MetricsSink;
use crate::nn::Mlp;
use crate::optim::SGD;
use crate::train::{MartTrainer, RunSummary, TrainProviders};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use tracing::info;

/// Train from a YAML configuration file
///
/// # Example
///
/// ```no_run
/// use blindaje::config::train_from_yaml;
///
/// let summary = train_from_yaml("mart.yaml")?;
/// println!("interventions: {}", summary.interventions);
/// # Ok::<(), blindaje::Error>(())
/// ```
pub fn train_from_yaml<P: AsRef<Path>>(path: P) -> Result<RunSummary<Mlp, SGD>> {
    let config = load_config(path)?;
    train_from_config(&config)
}

/// Run a complete training session described by `config`
///
/// 1. Validates the configuration
/// 2. Loads the dataset split file and builds the providers
/// 3. Builds the classifier, the optimizer and the adaptation hook
/// 4. Trains, writing metrics to `output.log_dir` and checkpoints to `output.model_dir`
pub fn train_from_config(config: &MartConfig) -> Result<RunSummary<Mlp, SGD>> {
    validate_config(config)?;

    let splits = load_splits(&config.data.path)?;
    let classes = splits.num_classes();
    if classes > config.model.num_classes {
        return Err(Error::Dataset {
            path: config.data.path.clone(),
            message: format!(
                "labels span {classes} classes but model.num_classes is {}",
                config.model.num_classes
            ),
        });
    }
    let mut providers = SplitProviders::from_splits(
        splits,
        &config.data,
        config.training.batch_size,
        config.eval.test_batch_size,
    )?;
    info!(
        train = providers.train.data().len(),
        val = providers.val.data().len(),
        test = providers.test.data().len(),
        path = %config.data.path.display(),
        "Loaded dataset"
    );

    let mut rng = StdRng::seed_from_u64(config.training.seed);
    let model = build_model(config, providers.train.output_shape(), &mut rng);
    let optimizer = build_optimizer(config, &model);

    let mut trainer = MartTrainer::new(config.clone(), build_hook(config))
        .with_metrics_sink(MetricsSink::in_dir(&config.output.log_dir))
        .with_checkpoints(&config.output.model_dir, config.output.save_freq);
    trainer.run(model, optimizer, &mut TrainProviders::from(&mut providers))
}
