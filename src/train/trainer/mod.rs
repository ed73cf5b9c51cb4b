//! MART training loop
//!
//! [`MartTrainer`] drives epochs of adversarial training over a [`TrainProviders`]
//! set. Each optimizer step is followed by a call to the adaptation hook, which
//! may hand back a different model and optimizer pair.
//!
//! # Example
//!
//! ```no_run
//! use blindaje::adapt::NoAdaptation;
//! use blindaje::config::MartConfig;
//! use blindaje::data::{load_splits, SplitProviders};
//! use blindaje::nn::Mlp;
//! use blindaje::optim::SGD;
//! use blindaje::train::{MartTrainer, TrainProviders};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! # fn main() -> blindaje::Result<()> {
//! let config = MartConfig::default().with_epochs(2);
//! let splits = load_splits(&config.data.path)?;
//! let mut providers = SplitProviders::from_splits(splits, &config.data, 128, 100)?;
//!
//! let mut rng = StdRng::seed_from_u64(config.training.seed);
//! let model = Mlp::new(providers.train.output_shape(), &[256], 10, &mut rng);
//! let optimizer = SGD::new(config.optimizer.lr, config.optimizer.momentum).bound_to(&model);
//!
//! let mut trainer = MartTrainer::new(config, NoAdaptation);
//! let summary = trainer.run(model, optimizer, &mut TrainProviders::from(&mut providers))?;
//! println!("robust accuracy: {:?}", summary.history.best_robust());
//! # Ok(())
//! # }
//! ```

mod core;
mod epoch;
mod result;
mod run;
mod step;

pub use core::{MartTrainer, TrainProviders};
pub use result::{EpochReport, RunSummary, StepLoss};
