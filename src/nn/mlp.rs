//! Multilayer perceptron classifier over flattened images

use super::{flatten, unflatten, Classifier, Gradients, Linear, Param, ParamSetId};
use ndarray::{Array2, Array4, Zip};
use rand::Rng;

/// ReLU MLP: flatten → (Linear → ReLU)* → Linear
pub struct Mlp {
    id: ParamSetId,
    input_shape: (usize, usize, usize),
    layers: Vec<Linear>,
}

impl Mlp {
    /// Build an MLP for `input_shape = (C, H, W)` with the given hidden widths
    pub fn new<R: Rng + ?Sized>(
        input_shape: (usize, usize, usize),
        hidden: &[usize],
        num_classes: usize,
        rng: &mut R,
    ) -> Self {
        let (c, h, w) = input_shape;
        let mut widths = Vec::with_capacity(hidden.len() + 2);
        widths.push(c * h * w);
        widths.extend_from_slice(hidden);
        widths.push(num_classes);

        let layers = widths
            .windows(2)
            .enumerate()
            .map(|(i, pair)| Linear::new(pair[0], pair[1], i, &mut *rng))
            .collect();

        Self {
            id: ParamSetId::fresh(),
            input_shape,
            layers,
        }
    }

    /// Assemble from existing layers
    pub fn from_layers(input_shape: (usize, usize, usize), layers: Vec<Linear>) -> Self {
        assert!(!layers.is_empty(), "An MLP needs at least one layer");
        let (c, h, w) = input_shape;
        assert_eq!(
            layers[0].in_features(),
            c * h * w,
            "First layer must consume the flattened image"
        );
        for pair in layers.windows(2) {
            assert_eq!(
                pair[0].out_features(),
                pair[1].in_features(),
                "Adjacent layer widths must agree"
            );
        }
        Self {
            id: ParamSetId::fresh(),
            input_shape,
            layers,
        }
    }

    pub fn input_shape(&self) -> (usize, usize, usize) {
        self.input_shape
    }

    pub fn layers(&self) -> &[Linear] {
        &self.layers
    }

    fn check_input(&self, inputs: &Array4<f32>) {
        let (_, c, h, w) = inputs.dim();
        assert_eq!(
            (c, h, w),
            self.input_shape,
            "Input image shape must match the classifier"
        );
    }

    /// Inputs seen by every layer during the forward pass, plus the logits
    fn trace(&self, x: Array2<f32>) -> (Vec<Array2<f32>>, Array2<f32>) {
        let last = self.layers.len() - 1;
        let mut seen = Vec::with_capacity(self.layers.len());
        let mut h = x;
        for (i, layer) in self.layers.iter().enumerate() {
            let out = layer.forward(&h);
            seen.push(h);
            h = if i < last { out.mapv(|v| v.max(0.0)) } else { out };
        }
        (seen, h)
    }
}

impl Clone for Mlp {
    /// A clone is a distinct parameter set with its own id
    fn clone(&self) -> Self {
        Self {
            id: ParamSetId::fresh(),
            input_shape: self.input_shape,
            layers: self.layers.clone(),
        }
    }
}

impl std::fmt::Debug for Mlp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let widths: Vec<usize> = self.layers.iter().map(Linear::out_features).collect();
        f.debug_struct("Mlp")
            .field("id", &self.id)
            .field("input_shape", &self.input_shape)
            .field("widths", &widths)
            .finish()
    }
}

impl Classifier for Mlp {
    fn num_classes(&self) -> usize {
        self.layers.last().map_or(0, Linear::out_features)
    }

    fn forward(&self, inputs: &Array4<f32>) -> Array2<f32> {
        self.check_input(inputs);
        self.trace(flatten(inputs)).1
    }

    fn backward(&self, inputs: &Array4<f32>, grad_logits: &Array2<f32>) -> Gradients {
        self.check_input(inputs);
        let (seen, _) = self.trace(flatten(inputs));

        let mut grads = vec![Array2::zeros((0, 0)); 2 * self.layers.len()];
        let mut upstream = grad_logits.to_owned();
        for (i, layer) in self.layers.iter().enumerate().rev() {
            let (grad_w, grad_b, mut grad_x) = layer.backward(&seen[i], &upstream);
            grads[2 * i] = grad_w;
            grads[2 * i + 1] = grad_b;
            if i > 0 {
                // ReLU mask: the layer input is positive exactly where the pre-activation was
                Zip::from(&mut grad_x).and(&seen[i]).for_each(|g, &a| {
                    if a <= 0.0 {
                        *g = 0.0;
                    }
                });
            }
            upstream = grad_x;
        }

        Gradients {
            params: grads,
            input: unflatten(&upstream, self.input_shape),
        }
    }

    fn params(&self) -> Vec<&Param> {
        self.layers
            .iter()
            .flat_map(|l| [&l.weight, &l.bias])
            .collect()
    }

    fn params_mut(&mut self) -> Vec<&mut Param> {
        self.layers
            .iter_mut()
            .flat_map(|l| [&mut l.weight, &mut l.bias])
            .collect()
    }

    fn param_set(&self) -> ParamSetId {
        self.id
    }

    fn num_layers(&self) -> usize {
        self.layers.len()
    }
}
