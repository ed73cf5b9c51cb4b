//! Build training components from configuration

use super::schema::MartConfig;
use crate::adapt::{AdaptationHook, GAdaptor, NoAdaptation};
use crate::nn::Mlp;
use crate::optim::SGD;
use rand::Rng;

/// Adaptation hook type produced by [`build_hook`]
pub type DynHook = Box<dyn AdaptationHook<Mlp, SGD>>;

/// Build the MLP classifier for images of `input_shape = (C, H, W)`
pub fn build_model<R: Rng + ?Sized>(
    config: &MartConfig,
    input_shape: (usize, usize, usize),
    rng: &mut R,
) -> Mlp {
    Mlp::new(
        input_shape,
        &config.model.hidden,
        config.model.num_classes,
        rng,
    )
}

/// Build SGD with the configured momentum and weight decay, bound to `model`
pub fn build_optimizer(config: &MartConfig, model: &Mlp) -> SGD {
    let spec = &config.optimizer;
    SGD::new(spec.lr, spec.momentum)
        .with_weight_decay(spec.weight_decay)
        .bound_to(model)
}

/// Build the adaptor, or the pass-through hook when it is disabled
///
/// The adaptor crafts its validation examples with the training attack.
pub fn build_hook(config: &MartConfig) -> DynHook {
    if config.adaptor.enabled {
        Box::new(GAdaptor::<Mlp, SGD>::new(
            config.adaptor.clone(),
            config.attack,
            config.training.seed,
        ))
    } else {
        Box::new(NoAdaptation)
    }
}
