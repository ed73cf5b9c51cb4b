//! Blindaje: misclassification-aware adversarial training
//!
//! This crate trains image classifiers against L∞ / L2 bounded perturbations with
//! the MART objective, and can revert recent updates when a validation set
//! prefers earlier weights:
//! - [`attack`]: projected gradient attacks for training and evaluation
//! - [`train`]: the MART loss and the epoch loop
//! - [`adapt`]: per-step hooks, including the validation-guided [`adapt::GAdaptor`]
//! - [`eval`]: white-box robustness evaluation
//! - [`data`], [`io`], [`config`], [`cli`]: datasets, metrics and checkpoints,
//!   configuration, and the command-line front end
//!
//! # Example
//!
//! ```
//! use blindaje::attack::MartPerturbation;
//! use blindaje::nn::{Classifier, Mlp};
//! use ndarray::Array4;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let model = Mlp::new((1, 4, 4), &[8], 3, &mut rng);
//! let x = Array4::from_elem((2, 1, 4, 4), 0.5);
//!
//! let attack = MartPerturbation::new(0.03, 0.01, 5);
//! let x_adv = attack.perturb(&model, &x, &[0, 2], &mut rng);
//! assert!((&x_adv - &x).iter().all(|d| d.abs() <= 0.03 + 1e-6));
//! assert_eq!(model.forward(&x_adv).dim(), (2, 3));
//! ```

pub mod adapt;
pub mod attack;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod eval;
pub mod io;
pub mod nn;
pub mod optim;
pub mod train;

pub use error::{Error, Result};
