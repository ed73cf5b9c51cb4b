//! Validation scoring and momentum refills

use super::config::{MetaLoss, MomentumInit};
use crate::attack::MartPerturbation;
use crate::data::BatchProvider;
use crate::nn::Classifier;
use crate::optim::Optimizer;
use crate::train::{kl_rows, CrossEntropyLoss, LossFn};
use ndarray::Array2;
use rand::Rng;

/// Mean meta loss over the first `times` validation batches
///
/// Returns `None` when the provider yields no batches.
pub(crate) fn score<M, R>(
    model: &M,
    val: &dyn BatchProvider,
    times: usize,
    meta_loss: MetaLoss,
    attack: &MartPerturbation,
    rng: &mut R,
) -> Option<f32>
where
    M: Classifier + ?Sized,
    R: Rng + ?Sized,
{
    let mut total = 0.0;
    let mut batches = 0usize;
    for batch in val.batches().take(times) {
        let adversarial = attack.perturb(model, &batch.inputs, &batch.targets, rng);
        let adv_logits = model.forward(&adversarial);
        total += match meta_loss {
            MetaLoss::CrossEntropy => {
                CrossEntropyLoss
                    .forward(&adv_logits, &batch.targets)
                    .value
            }
            MetaLoss::Kl => {
                let rows = kl_rows(&model.forward(&batch.inputs), &adv_logits);
                rows.iter().sum::<f32>() / rows.len().max(1) as f32
            }
        };
        batches += 1;
    }
    (batches > 0).then(|| total / batches as f32)
}

/// Overwrite the momentum slots at `indices` with `init`
pub(crate) fn refill_slots<M, O, R>(
    model: &M,
    optimizer: &mut O,
    indices: &[usize],
    init: MomentumInit,
    rng: &mut R,
) where
    M: Classifier + ?Sized,
    O: Optimizer + ?Sized,
    R: Rng + ?Sized,
{
    let params = model.params();
    let slots = optimizer.slots_mut();
    if slots.len() < params.len() {
        slots.resize(params.len(), None);
    }
    for &i in indices {
        let shape = params[i].shape();
        slots[i] = Some(match init {
            MomentumInit::Zero => Array2::zeros(shape),
            MomentumInit::One => Array2::ones(shape),
            MomentumInit::Random => {
                Array2::from_shape_fn(shape, |_| rng.random_range(-1.0..=1.0))
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{InMemoryProvider, LabeledImages};
    use crate::nn::Mlp;
    use crate::optim::SGD;
    use ndarray::Array4;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn provider(n: usize, batch: usize) -> InMemoryProvider {
        let images = Array4::from_shape_fn((n, 1, 2, 2), |(i, _, y, x)| {
            ((i + y + x) % 5) as f32 / 5.0
        });
        let labels = (0..n).map(|i| i % 3).collect();
        InMemoryProvider::sequential(LabeledImages::new(images, labels).unwrap(), batch)
    }

    fn model() -> Mlp {
        Mlp::new((1, 2, 2), &[4], 3, &mut StdRng::seed_from_u64(0))
    }

    #[test]
    fn test_score_uses_first_batches_only() {
        let m = model();
        let val = provider(9, 3);
        let attack = MartPerturbation::new(0.0, 0.0, 0);
        let mut rng = StdRng::seed_from_u64(1);

        let one = score(&m, &val, 1, MetaLoss::CrossEntropy, &attack, &mut rng).unwrap();
        let first = val.batches().next().unwrap();
        let expected = CrossEntropyLoss.forward(&m.forward(&first.inputs), &first.targets).value;
        assert!((one - expected).abs() < 1e-6);
    }

    #[test]
    fn test_kl_score_zero_without_perturbation() {
        let m = model();
        let val = provider(6, 3);
        let attack = MartPerturbation::new(0.0, 0.0, 0);
        let s = score(&m, &val, 2, MetaLoss::Kl, &attack, &mut StdRng::seed_from_u64(1)).unwrap();
        assert!(s.abs() < 1e-5);
    }

    #[test]
    fn test_score_empty_provider() {
        let m = model();
        let empty = provider(0, 3);
        let attack = MartPerturbation::default();
        let mut rng = StdRng::seed_from_u64(1);
        let s = score(&m, &empty, 2, MetaLoss::CrossEntropy, &attack, &mut rng);
        assert!(s.is_none());
    }

    #[test]
    fn test_refill_slots() {
        let m = model();
        let mut opt = SGD::new(0.1, 0.9).bound_to(&m);
        let mut rng = StdRng::seed_from_u64(2);

        refill_slots(&m, &mut opt, &[1], MomentumInit::One, &mut rng);
        assert_eq!(opt.slots().len(), 4);
        assert!(opt.slots()[0].is_none());
        assert!(opt.slots()[1].as_ref().unwrap().iter().all(|&v| v == 1.0));

        refill_slots(&m, &mut opt, &[0, 1], MomentumInit::Random, &mut rng);
        let random = opt.slots()[0].as_ref().unwrap();
        assert_eq!(random.dim(), m.params()[0].shape());
        assert!(random.iter().all(|v| (-1.0..=1.0).contains(v)));

        refill_slots(&m, &mut opt, &[1], MomentumInit::Zero, &mut rng);
        assert!(opt.slots()[1].as_ref().unwrap().iter().all(|&v| v == 0.0));
    }
}
