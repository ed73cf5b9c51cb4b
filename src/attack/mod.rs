//! Adversarial example generation
//!
//! Two projected-gradient-ascent variants share one core:
//!
//! - [`MartPerturbation`] crafts training examples (configurable inner loss)
//! - [`PgdWhitebox`] is the cross-entropy evaluation attack that counts errors
//!
//! Both start from uniform noise in the ε-ball, take a fixed number of
//! steps, and keep every iterate inside the ball and the `[0, 1]` pixel range.

mod norm;
mod perturb;
mod pgd;

pub use norm::{clip_unit, Norm};
pub use perturb::{InnerLoss, MartPerturbation};
pub use pgd::{BatchErrors, PgdWhitebox};
