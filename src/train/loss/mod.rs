//! Loss functions for adversarial training
//!
//! - [`CrossEntropyLoss`] - Mean cross entropy, used by the PGD attacks
//! - [`KlToReference`] - KL toward a frozen clean prediction (inner-loop surrogate)
//! - [`MartLoss`] - The MART training objective with gradients for both logit sets

mod cross_entropy;
mod kl;
mod mart;
mod traits;

pub use cross_entropy::{cross_entropy_rows, log_softmax_rows, softmax_rows, CrossEntropyLoss};
pub use kl::{kl_rows, KlToReference};
pub use mart::{MartLoss, MartOutput};
pub use traits::{LossFn, LossOutput};

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_loss_names() {
        assert_eq!(CrossEntropyLoss.name(), "CrossEntropy");
        let kl = KlToReference::from_logits(&Array2::zeros((1, 3)));
        assert_eq!(kl.name(), "KLDivergence");
    }
}
