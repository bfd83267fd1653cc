//! Error kinds shared by the models, optimizers and CLI.
//!
//! Configuration problems are caught when a model or optimizer is built;
//! shape problems surface at the first layer that receives a tensor it
//! cannot consume.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid hyperparameters or architecture descriptions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("learning rate must be finite and positive, got {0}")]
    LearningRate(f64),
    #[error("momentum must lie in [0, 1), got {0}")]
    Momentum(f64),
    #[error("{name} must lie in [0, 1), got {value}")]
    Beta { name: &'static str, value: f64 },
    #[error("epsilon must be finite and positive, got {0}")]
    Epsilon(f64),
    #[error("num_blocks has {blocks} groups but c_hidden has {channels}")]
    GroupMismatch { blocks: usize, channels: usize },
    #[error("a network needs at least one block group")]
    NoGroups,
    #[error("block group {0} is empty")]
    EmptyGroup(usize),
    #[error("a subsampling block needs an explicit c_out")]
    MissingOutChannels,
    #[error("c_out ({c_out}) must equal c_in ({c_in}) when the block does not subsample")]
    ChannelChange { c_in: usize, c_out: usize },
    #[error("{0} must be non-zero")]
    Zero(&'static str),
    #[error("init scheme {scheme} cannot use {value}")]
    Init { scheme: &'static str, value: f64 },
}

/// A tensor reached a layer whose declared input does not match it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("{layer}: expected {expected} input channels, got {actual}")]
    Channels {
        layer: String,
        expected: usize,
        actual: usize,
    },
    #[error("{layer}: expected {expected} input features, got {actual}")]
    Features {
        layer: String,
        expected: usize,
        actual: usize,
    },
    #[error("{layer}: cannot halve a {height}x{width} feature map")]
    Spatial {
        layer: String,
        height: usize,
        width: usize,
    },
}

impl ShapeError {
    /// Re-label the failing layer, keeping the offending sizes.
    pub fn at(self, layer: impl Into<String>) -> Self {
        match self {
            Self::Channels {
                expected, actual, ..
            } => Self::Channels {
                layer: layer.into(),
                expected,
                actual,
            },
            Self::Features {
                expected, actual, ..
            } => Self::Features {
                layer: layer.into(),
                expected,
                actual,
            },
            Self::Spatial { height, width, .. } => Self::Spatial {
                layer: layer.into(),
                height,
                width,
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error("load {}: {message}", path.display())]
    Load { path: PathBuf, message: String },
    #[error("{count} of {total} outputs are not finite")]
    NonFinite { count: usize, total: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
