//! Weight initialization schemes for fully connected layers.
//!
//! `Default` keeps burn's own initializer (weights and biases). Every other
//! scheme sets the weights as described and starts biases at zero.

use burn::module::Param;
use burn::nn::{Initializer, Linear, LinearConfig};
use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How the weights of a linear layer are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum InitScheme {
    /// burn's default (Kaiming uniform).
    Default,
    /// Every weight set to `value`.
    Constant { value: f64 },
    /// Zero-mean normal with a fixed standard deviation, independent of fan.
    ConstantVariance { std: f64 },
    /// Xavier/Glorot uniform, `bound = sqrt(6 / (fan_in + fan_out))`.
    Xavier,
    /// Kaiming normal on fan-in. The first layer sees raw inputs and uses
    /// gain 1; later layers follow a rectifier and use gain sqrt(2).
    Kaiming,
}

impl InitScheme {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::Constant { value } if !value.is_finite() => Err(ConfigError::Init {
                scheme: "constant",
                value,
            }),
            Self::ConstantVariance { std } if !(std.is_finite() && std > 0.0) => {
                Err(ConfigError::Init {
                    scheme: "constant_variance",
                    value: std,
                })
            }
            _ => Ok(()),
        }
    }

    /// burn initializer for the weights of layer `index` (0 = input layer).
    pub fn initializer(&self, index: usize) -> Option<Initializer> {
        match *self {
            Self::Default => None,
            Self::Constant { value } => Some(Initializer::Constant { value }),
            Self::ConstantVariance { std } => Some(Initializer::Normal { mean: 0.0, std }),
            Self::Xavier => Some(Initializer::XavierUniform { gain: 1.0 }),
            Self::Kaiming => Some(Initializer::KaimingNormal {
                gain: if index == 0 {
                    1.0
                } else {
                    std::f64::consts::SQRT_2
                },
                fan_out_only: false,
            }),
        }
    }

    /// Build a linear layer initialized with this scheme.
    pub fn linear<B: Backend>(
        &self,
        d_in: usize,
        d_out: usize,
        index: usize,
        device: &B::Device,
    ) -> Linear<B> {
        let config = LinearConfig::new(d_in, d_out);
        match self.initializer(index) {
            None => config.init(device),
            Some(init) => {
                let mut layer = config.with_initializer(init).init(device);
                layer.bias = Some(Param::from_tensor(Tensor::zeros([d_out], device)));
                layer
            }
        }
    }
}

impl Default for InitScheme {
    fn default() -> Self {
        Self::Default
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray;

    fn weights(layer: &Linear<B>) -> Vec<f32> {
        layer.weight.val().into_data().to_vec::<f32>().unwrap()
    }

    fn std_dev(values: &[f32]) -> f32 {
        let n = values.len() as f32;
        let mean = values.iter().sum::<f32>() / n;
        (values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n).sqrt()
    }

    #[test]
    fn constant_fills_weights_and_zeroes_bias() {
        let device = Default::default();
        let layer =
            InitScheme::Constant { value: 0.005 }.linear::<B>(8, 4, 0, &device);
        assert!(weights(&layer).iter().all(|&w| (w - 0.005).abs() < 1e-9));
        let bias = layer.bias.as_ref().unwrap().val();
        assert!(bias.into_data().to_vec::<f32>().unwrap().iter().all(|&b| b == 0.0));
    }

    #[test]
    fn kaiming_std_tracks_fan_in() {
        let device = Default::default();
        let layer = InitScheme::Kaiming.linear::<B>(512, 256, 1, &device);
        let expected = (2.0f32 / 512.0).sqrt();
        let std = std_dev(&weights(&layer));
        assert!((std - expected).abs() < expected * 0.1, "std {std} vs {expected}");
    }

    #[test]
    fn xavier_stays_within_bound() {
        let device = Default::default();
        let layer = InitScheme::Xavier.linear::<B>(64, 32, 0, &device);
        let bound = (6.0f32 / 96.0).sqrt();
        assert!(weights(&layer).iter().all(|w| w.abs() <= bound + 1e-6));
    }

    #[test]
    fn rejects_degenerate_parameters() {
        assert!(InitScheme::ConstantVariance { std: 0.0 }.validate().is_err());
        assert!(InitScheme::Constant { value: f64::NAN }.validate().is_err());
        assert!(InitScheme::ConstantVariance { std: 0.01 }.validate().is_ok());
    }
}
