//! Residual blocks for CIFAR-sized image classifiers.
//!
//! Two orderings are provided. The pre-activation block normalizes and
//! activates *before* each convolution and adds the skip path without a
//! trailing nonlinearity. The post-activation block is the original
//! conv → BN → act ordering with an activation after the sum.

use burn::config::Config;
use burn::module::{Ignored, Module};
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{BatchNorm, BatchNormConfig, Initializer, PaddingConfig2d};
use burn::prelude::*;
use serde::{Deserialize, Serialize};

use super::activation::Activation;
use crate::error::{ConfigError, ShapeError};

// ─── Configuration ────────────────────────────────────────────────

/// Ordering of normalization, activation and convolution in a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    PreActivation,
    PostActivation,
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PreActivation => write!(f, "pre-activation"),
            Self::PostActivation => write!(f, "post-activation"),
        }
    }
}

/// Residual block configuration.
#[derive(Config, Debug)]
pub struct ResidualBlockConfig {
    /// Input channels.
    pub c_in: usize,
    /// Halve the spatial resolution (and allow a channel change).
    #[config(default = false)]
    pub subsample: bool,
    /// Output channels. Required when subsampling, otherwise equal to `c_in`.
    pub c_out: Option<usize>,
    #[config(default = "Activation::Relu")]
    pub activation: Activation,
    #[config(default = "BlockKind::PreActivation")]
    pub kind: BlockKind,
}

/// Kaiming-normal on fan-out with the rectifier gain.
pub(crate) fn conv_initializer() -> Initializer {
    Initializer::KaimingNormal {
        gain: std::f64::consts::SQRT_2,
        fan_out_only: true,
    }
}

/// 3×3 convolution, padding 1, no bias.
pub(crate) fn conv3x3<B: Backend>(
    c_in: usize,
    c_out: usize,
    stride: usize,
    device: &B::Device,
) -> Conv2d<B> {
    Conv2dConfig::new([c_in, c_out], [3, 3])
        .with_stride([stride, stride])
        .with_padding(PaddingConfig2d::Explicit(1, 1))
        .with_bias(false)
        .with_initializer(conv_initializer())
        .init(device)
}

// ─── Block ────────────────────────────────────────────────────────

/// Shape-adapting skip path used by subsampling blocks.
#[derive(Module, Debug)]
pub struct Downsample<B: Backend> {
    /// Present only in the pre-activation ordering.
    norm: Option<BatchNorm<B>>,
    /// 1×1 convolution with stride 2.
    conv: Conv2d<B>,
}

/// Residual block: `out = F(x) + skip(x)`.
#[derive(Module, Debug)]
pub struct ResidualBlock<B: Backend> {
    conv1: Conv2d<B>,
    norm1: BatchNorm<B>,
    conv2: Conv2d<B>,
    norm2: BatchNorm<B>,
    downsample: Option<Downsample<B>>,
    c_in: usize,
    c_out: usize,
    activation: Ignored<Activation>,
    kind: Ignored<BlockKind>,
}

impl ResidualBlockConfig {
    /// Resolve the output channel count, rejecting inconsistent settings.
    pub fn out_channels(&self) -> Result<usize, ConfigError> {
        if self.c_in == 0 {
            return Err(ConfigError::Zero("c_in"));
        }
        let c_out = match (self.subsample, self.c_out) {
            (true, None) => return Err(ConfigError::MissingOutChannels),
            (true, Some(c_out)) => c_out,
            (false, None) => self.c_in,
            (false, Some(c_out)) if c_out == self.c_in => c_out,
            (false, Some(c_out)) => {
                return Err(ConfigError::ChannelChange {
                    c_in: self.c_in,
                    c_out,
                })
            }
        };
        if c_out == 0 {
            return Err(ConfigError::Zero("c_out"));
        }
        Ok(c_out)
    }

    /// Initialize a residual block.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<ResidualBlock<B>, ConfigError> {
        let c_in = self.c_in;
        let c_out = self.out_channels()?;
        let stride = if self.subsample { 2 } else { 1 };

        // The first norm sits before conv1 in the pre-activation ordering.
        let norm1_channels = match self.kind {
            BlockKind::PreActivation => c_in,
            BlockKind::PostActivation => c_out,
        };

        let downsample = self.subsample.then(|| {
            let conv = Conv2dConfig::new([c_in, c_out], [1, 1])
                .with_stride([2, 2])
                .with_initializer(conv_initializer());
            match self.kind {
                BlockKind::PreActivation => Downsample {
                    norm: Some(BatchNormConfig::new(c_in).init(device)),
                    conv: conv.with_bias(false).init(device),
                },
                BlockKind::PostActivation => Downsample {
                    norm: None,
                    conv: conv.init(device),
                },
            }
        });

        Ok(ResidualBlock {
            conv1: conv3x3(c_in, c_out, stride, device),
            norm1: BatchNormConfig::new(norm1_channels).init(device),
            conv2: conv3x3(c_out, c_out, 1, device),
            norm2: BatchNormConfig::new(c_out).init(device),
            downsample,
            c_in,
            c_out,
            activation: Ignored(self.activation),
            kind: Ignored(self.kind),
        })
    }
}

impl<B: Backend> ResidualBlock<B> {
    pub fn c_in(&self) -> usize {
        self.c_in
    }

    pub fn c_out(&self) -> usize {
        self.c_out
    }

    pub fn subsamples(&self) -> bool {
        self.downsample.is_some()
    }

    /// Forward pass.
    ///
    /// - `x`: [N, c_in, H, W]
    ///
    /// Returns: [N, c_out, H, W], or [N, c_out, ⌊H/2⌋, ⌊W/2⌋] when subsampling.
    /// A subsampling block needs H and W of at least 2.
    pub fn forward(&self, x: Tensor<B, 4>) -> Result<Tensor<B, 4>, ShapeError> {
        let [_, channels, height, width] = x.dims();
        if channels != self.c_in {
            return Err(ShapeError::Channels {
                layer: "residual block".into(),
                expected: self.c_in,
                actual: channels,
            });
        }
        if self.subsamples() && (height < 2 || width < 2) {
            return Err(ShapeError::Spatial {
                layer: "residual block".into(),
                height,
                width,
            });
        }
        let out_hw = if self.subsamples() {
            [height / 2, width / 2]
        } else {
            [height, width]
        };

        let act = *self.activation;
        let out = match *self.kind {
            BlockKind::PreActivation => {
                let z = self.conv1.forward(act.forward(self.norm1.forward(x.clone())));
                let z = crop(z, out_hw);
                let z = self.conv2.forward(act.forward(self.norm2.forward(z)));
                z + self.skip(x, out_hw)
            }
            BlockKind::PostActivation => {
                let z = crop(self.conv1.forward(x.clone()), out_hw);
                let z = act.forward(self.norm1.forward(z));
                let z = self.norm2.forward(self.conv2.forward(z));
                act.forward(z + self.skip(x, out_hw))
            }
        };
        Ok(out)
    }

    fn skip(&self, x: Tensor<B, 4>, out_hw: [usize; 2]) -> Tensor<B, 4> {
        match &self.downsample {
            None => x,
            Some(down) => {
                let x = match &down.norm {
                    Some(norm) => self.activation.forward(norm.forward(x)),
                    None => x,
                };
                crop(down.conv.forward(x), out_hw)
            }
        }
    }
}

/// Drop trailing rows and columns so the map is exactly `[h, w]`.
///
/// A stride-2 convolution yields `ceil(H/2)` rows; halving blocks keep
/// `floor(H/2)`, so odd inputs lose their last output row (and column).
fn crop<B: Backend>(x: Tensor<B, 4>, [h, w]: [usize; 2]) -> Tensor<B, 4> {
    let [n, c, height, width] = x.dims();
    if height == h && width == w {
        return x;
    }
    x.slice([0..n, 0..c, 0..h, 0..w])
}

// ─── Tests ────────────────────────────────────────────────────────
