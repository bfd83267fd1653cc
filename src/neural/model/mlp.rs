//! Multi-layer perceptron classifier: `Linear → act` per hidden size, then a
//! linear head producing logits.

use burn::config::Config;
use burn::module::{Ignored, Module};
use burn::nn::Linear;
use burn::prelude::*;
use tracing::debug;

use super::activation::Activation;
use super::init::InitScheme;
use crate::error::{ConfigError, ShapeError};

/// MLP configuration. Defaults match flattened 28×28 greyscale images.
#[derive(Config, Debug)]
pub struct MlpConfig {
    /// Hidden layer widths, input side first.
    pub hidden_sizes: Vec<usize>,
    /// Flattened input features.
    #[config(default = 784)]
    pub input_size: usize,
    #[config(default = 10)]
    pub num_classes: usize,
    #[config(default = "Activation::Relu")]
    pub activation: Activation,
    #[config(default = "InitScheme::Default")]
    pub init: InitScheme,
}

#[derive(Module, Debug)]
pub struct Mlp<B: Backend> {
    pub hidden: Vec<Linear<B>>,
    pub head: Linear<B>,
    input_size: usize,
    activation: Ignored<Activation>,
}

impl MlpConfig {
    /// The course default: four hidden layers of 512/256/256/128 units.
    pub fn fashion_mnist() -> Self {
        Self::new(vec![512, 256, 256, 128])
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input_size == 0 {
            return Err(ConfigError::Zero("input_size"));
        }
        if self.num_classes == 0 {
            return Err(ConfigError::Zero("num_classes"));
        }
        if self.hidden_sizes.contains(&0) {
            return Err(ConfigError::Zero("hidden_sizes"));
        }
        self.init.validate()
    }

    /// Initialize the MLP.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<Mlp<B>, ConfigError> {
        self.validate()?;

        let widths: Vec<usize> = std::iter::once(self.input_size)
            .chain(self.hidden_sizes.iter().copied())
            .collect();
        let hidden = widths
            .windows(2)
            .enumerate()
            .map(|(i, pair)| self.init.linear(pair[0], pair[1], i, device))
            .collect();
        let head = self.init.linear(
            widths[widths.len() - 1],
            self.num_classes,
            self.hidden_sizes.len(),
            device,
        );

        let model = Mlp {
            hidden,
            head,
            input_size: self.input_size,
            activation: Ignored(self.activation),
        };
        debug!(
            hidden = ?self.hidden_sizes,
            activation = %self.activation,
            init = ?self.init,
            params = model.num_params(),
            "initialized mlp"
        );
        Ok(model)
    }
}

impl<B: Backend> Mlp<B> {
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    /// Forward pass on images, flattened per sample.
    ///
    /// - `images`: [N, C, H, W] with `C·H·W == input_size`
    ///
    /// Returns: [N, num_classes] logits.
    pub fn forward(&self, images: Tensor<B, 4>) -> Result<Tensor<B, 2>, ShapeError> {
        self.forward_features(images.flatten::<2>(1, 3))
    }

    /// Forward pass on already-flat features [N, input_size].
    pub fn forward_features(&self, x: Tensor<B, 2>) -> Result<Tensor<B, 2>, ShapeError> {
        let [_, features] = x.dims();
        if features != self.input_size {
            return Err(ShapeError::Features {
                layer: "mlp input".into(),
                expected: self.input_size,
                actual: features,
            });
        }

        let mut x = x;
        for layer in &self.hidden {
            x = self.activation.forward(layer.forward(x));
        }
        Ok(self.head.forward(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type B = NdArray;

    #[test]
    fn maps_images_to_logits() {
        let device = Default::default();
        let model = MlpConfig::new(vec![64, 32]).init::<B>(&device).unwrap();
        let x = Tensor::<B, 4>::random([5, 1, 28, 28], Distribution::Default, &device);
        assert_eq!(model.forward(x).unwrap().dims(), [5, 10]);
    }

    #[test]
    fn no_hidden_layers_is_linear_regression() {
        let device = Default::default();
        let model = MlpConfig::new(vec![])
            .with_input_size(6)
            .with_num_classes(3)
            .init::<B>(&device)
            .unwrap();
        assert!(model.hidden.is_empty());
        let x = Tensor::<B, 2>::ones([2, 6], &device);
        assert_eq!(model.forward_features(x).unwrap().dims(), [2, 3]);
    }

    #[test]
    fn every_activation_and_init_runs() {
        let device = Default::default();
        let inits = [
            InitScheme::Default,
            InitScheme::Constant { value: 0.005 },
            InitScheme::ConstantVariance { std: 0.01 },
            InitScheme::Xavier,
            InitScheme::Kaiming,
        ];
        for act in Activation::ALL {
            for init in inits {
                let model = MlpConfig::new(vec![16, 8])
                    .with_input_size(12)
                    .with_activation(act)
                    .with_init(init)
                    .init::<B>(&device)
                    .unwrap();
                let x = Tensor::<B, 2>::random([3, 12], Distribution::Normal(0.0, 1.0), &device);
                let out = model.forward_features(x).unwrap();
                let values = out.into_data().to_vec::<f32>().unwrap();
                assert!(values.iter().all(|v| v.is_finite()), "{act} {init:?}");
            }
        }
    }

    #[test]
    fn wrong_width_is_a_shape_error() {
        let device = Default::default();
        let model = MlpConfig::new(vec![8]).init::<B>(&device).unwrap();
        let x = Tensor::<B, 4>::zeros([1, 3, 32, 32], &device);
        assert_eq!(
            model.forward(x).unwrap_err(),
            ShapeError::Features {
                layer: "mlp input".into(),
                expected: 784,
                actual: 3072,
            }
        );
    }

    #[test]
    fn zero_width_is_rejected() {
        let err = MlpConfig::new(vec![32, 0])
            .init::<B>(&Default::default())
            .unwrap_err();
        assert_eq!(err, ConfigError::Zero("hidden_sizes"));
    }

    #[test]
    fn course_default_widths() {
        let model = MlpConfig::fashion_mnist()
            .init::<B>(&Default::default())
            .unwrap();
        let widths: Vec<usize> = model.hidden.iter().map(|l| l.weight.dims()[1]).collect();
        assert_eq!(widths, vec![512, 256, 256, 128]);
        assert_eq!(model.head.weight.dims(), [128, 10]);
    }
}
