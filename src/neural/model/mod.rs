//! Feed-forward classifiers.
//!
//! - [`mlp`]: stacked `Linear → activation` layers over flattened images
//! - [`block`]: pre- and post-activation residual blocks
//! - [`resnet`]: residual network built from block groups

pub mod activation;
pub mod block;
pub mod init;
pub mod mlp;
pub mod resnet;

pub use activation::Activation;
pub use block::{BlockKind, ResidualBlock, ResidualBlockConfig};
pub use init::InitScheme;
pub use mlp::{Mlp, MlpConfig};
pub use resnet::{ResNet, ResNetConfig};
