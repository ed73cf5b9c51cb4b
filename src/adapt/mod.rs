//! Adaptation hooks run after every optimizer step
//!
//! A hook receives the model and optimizer by value and returns the pair that
//! training continues with. [`NoAdaptation`] hands both back untouched;
//! [`GAdaptor`] may swap in state saved at the start of a gap when validation
//! scores favor it.

mod config;
mod gadaptor;
mod hook;
mod meta;

pub use config::{AdaptorConfig, MetaLoss, MomentumInit};
pub use gadaptor::GAdaptor;
pub use hook::{AdaptPhase, AdaptProviders, AdaptStats, AdaptationHook, NoAdaptation};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{InMemoryProvider, LabeledImages};
    use crate::nn::{Classifier, Mlp};
    use crate::optim::{Optimizer, SGD};
    use ndarray::Array4;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_no_adaptation_passes_through() {
        let data = LabeledImages::new(Array4::zeros((2, 1, 2, 2)), vec![0, 1]).unwrap();
        let provider = InMemoryProvider::sequential(data, 2);
        let providers = AdaptProviders {
            train: &provider,
            val: &provider,
            test: &provider,
        };
        let model = Mlp::new((1, 2, 2), &[3], 2, &mut StdRng::seed_from_u64(0));
        let id = model.param_set();
        let opt = SGD::new(0.1, 0.9).bound_to(&model);

        let mut hook = NoAdaptation;
        let (model, opt) = hook.take_step(99, model, opt, &providers).unwrap();
        assert_eq!(model.param_set(), id);
        assert_eq!(opt.param_set(), Some(id));
        assert_eq!(
            AdaptationHook::<Mlp, SGD>::stats(&hook),
            AdaptStats::default()
        );
    }

    #[test]
    fn test_boxed_hook_delegates() {
        let data = LabeledImages::new(Array4::zeros((2, 1, 2, 2)), vec![0, 1]).unwrap();
        let provider = InMemoryProvider::sequential(data, 2);
        let providers = AdaptProviders {
            train: &provider,
            val: &provider,
            test: &provider,
        };
        let model = Mlp::new((1, 2, 2), &[], 2, &mut StdRng::seed_from_u64(1));
        let id = model.param_set();
        let opt = SGD::new(0.1, 0.0).bound_to(&model);

        let mut hook: Box<dyn AdaptationHook<Mlp, SGD>> = Box::new(NoAdaptation);
        let (model, _) = hook.take_step(1, model, opt, &providers).unwrap();
        assert_eq!(model.param_set(), id);
        assert_eq!(
            AdaptationHook::<Mlp, SGD>::stats(&hook),
            AdaptStats::default()
        );
    }
}
