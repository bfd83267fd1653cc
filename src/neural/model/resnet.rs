//! Residual network: stem convolution, block groups, pooled linear head.
//!
//! Group `i` runs at `c_hidden[i]` channels. Every group after the first
//! opens with a subsampling block, so each extra group halves the spatial
//! resolution.

use burn::config::Config;
use burn::module::{Ignored, Module};
use burn::nn::conv::Conv2d;
use burn::nn::{BatchNorm, BatchNormConfig, Linear, LinearConfig};
use burn::prelude::*;
use tracing::debug;

use super::activation::Activation;
use super::block::{conv3x3, BlockKind, ResidualBlock, ResidualBlockConfig};
use crate::error::{ConfigError, Error, ShapeError};

/// Input channels of the stem (RGB).
pub const IMAGE_CHANNELS: usize = 3;

// ─── Configuration ────────────────────────────────────────────────

/// Residual network configuration.
#[derive(Config, Debug)]
pub struct ResNetConfig {
    /// Number of output logits.
    pub num_classes: usize,
    /// Blocks per group.
    pub num_blocks: Vec<usize>,
    /// Channels per group, same length as `num_blocks`.
    pub c_hidden: Vec<usize>,
    #[config(default = "Activation::Relu")]
    pub activation: Activation,
    #[config(default = "BlockKind::PreActivation")]
    pub block: BlockKind,
}

/// Stem-only normalization used by the post-activation ordering.
#[derive(Module, Debug)]
pub struct StemNorm<B: Backend> {
    norm: BatchNorm<B>,
}

/// Residual network classifier.
#[derive(Module, Debug)]
pub struct ResNet<B: Backend> {
    pub stem: Conv2d<B>,
    stem_norm: Option<StemNorm<B>>,
    /// Blocks per group, in order.
    pub groups: Vec<Vec<ResidualBlock<B>>>,
    pub head: Linear<B>,
    activation: Ignored<Activation>,
}

impl ResNetConfig {
    /// The CIFAR-10 layout: three groups of three blocks at 16/32/64 channels.
    pub fn cifar10() -> Self {
        Self::new(10, vec![3, 3, 3], vec![16, 32, 64])
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_blocks.len() != self.c_hidden.len() {
            return Err(ConfigError::GroupMismatch {
                blocks: self.num_blocks.len(),
                channels: self.c_hidden.len(),
            });
        }
        if self.num_blocks.is_empty() {
            return Err(ConfigError::NoGroups);
        }
        if self.num_classes == 0 {
            return Err(ConfigError::Zero("num_classes"));
        }
        if let Some(group) = self.num_blocks.iter().position(|&n| n == 0) {
            return Err(ConfigError::EmptyGroup(group));
        }
        if self.c_hidden.contains(&0) {
            return Err(ConfigError::Zero("c_hidden"));
        }
        Ok(())
    }

    /// Block configurations in forward order, grouped.
    pub fn block_configs(&self) -> Vec<Vec<ResidualBlockConfig>> {
        self.num_blocks
            .iter()
            .enumerate()
            .map(|(group, &count)| {
                (0..count)
                    .map(|index| {
                        let subsample = index == 0 && group > 0;
                        let c_in = if subsample {
                            self.c_hidden[group - 1]
                        } else {
                            self.c_hidden[group]
                        };
                        ResidualBlockConfig::new(c_in)
                            .with_subsample(subsample)
                            .with_c_out(Some(self.c_hidden[group]))
                            .with_activation(self.activation)
                            .with_kind(self.block)
                    })
                    .collect()
            })
            .collect()
    }

    /// Initialize the network.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<ResNet<B>, ConfigError> {
        self.validate()?;

        let c_first = self.c_hidden[0];
        let c_last = self.c_hidden[self.c_hidden.len() - 1];

        let stem_norm = match self.block {
            BlockKind::PreActivation => None,
            BlockKind::PostActivation => Some(StemNorm {
                norm: BatchNormConfig::new(c_first).init(device),
            }),
        };

        let groups = self
            .block_configs()
            .iter()
            .map(|group| {
                group
                    .iter()
                    .map(|config| config.init(device))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let model = ResNet {
            stem: conv3x3(IMAGE_CHANNELS, c_first, 1, device),
            stem_norm,
            groups,
            head: LinearConfig::new(c_last, self.num_classes).init(device),
            activation: Ignored(self.activation),
        };

        debug!(
            blocks = ?self.num_blocks,
            channels = ?self.c_hidden,
            block = %self.block,
            activation = %self.activation,
            params = model.num_params(),
            "initialized residual network"
        );
        Ok(model)
    }
}

impl<B: Backend> ResNet<B> {
    pub fn num_classes(&self) -> usize {
        self.head.weight.dims()[1]
    }

    /// Forward pass.
    ///
    /// - `images`: [N, 3, H, W]
    ///
    /// Returns: [N, num_classes] logits.
    pub fn forward(&self, images: Tensor<B, 4>) -> Result<Tensor<B, 2>, Error> {
        let features = self.features(images, |_, _| {})?;
        Ok(self.classify(features))
    }

    /// Feature-map shape after the stem and after every group.
    pub fn stage_shapes(&self, images: Tensor<B, 4>) -> Result<Vec<[usize; 4]>, Error> {
        let mut shapes = Vec::with_capacity(self.groups.len() + 1);
        self.features(images, |_, x| shapes.push(x.dims()))?;
        Ok(shapes)
    }

    /// Stem + groups. `observe` sees the output of each stage.
    fn features(
        &self,
        images: Tensor<B, 4>,
        mut observe: impl FnMut(usize, &Tensor<B, 4>),
    ) -> Result<Tensor<B, 4>, ShapeError> {
        let [_, channels, _, _] = images.dims();
        if channels != IMAGE_CHANNELS {
            return Err(ShapeError::Channels {
                layer: "stem".into(),
                expected: IMAGE_CHANNELS,
                actual: channels,
            });
        }

        let mut x = self.stem.forward(images);
        if let Some(stem) = &self.stem_norm {
            x = self.activation.forward(stem.norm.forward(x));
        }
        observe(0, &x);

        for (g, group) in self.groups.iter().enumerate() {
            for (b, block) in group.iter().enumerate() {
                x = block
                    .forward(x)
                    .map_err(|err| err.at(format!("group {g} block {b}")))?;
            }
            observe(g + 1, &x);
        }
        Ok(x)
    }

    /// Global average pool over H and W, then the linear head.
    fn classify(&self, features: Tensor<B, 4>) -> Tensor<B, 2> {
        let [n, c, _, _] = features.dims();
        let pooled = features.mean_dim(3).mean_dim(2).reshape([n, c]);
        self.head.forward(pooled)
    }
}

// ─── Tests ────────────────────────────────────────────────────────
