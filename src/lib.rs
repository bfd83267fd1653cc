pub mod config;
pub mod error;
pub mod neural;
pub mod telemetry;

// Re-exports for the types most callers reach for
pub use config::{DeviceKind, RunConfig};
pub use error::{ConfigError, Error, ShapeError};
pub use neural::model::{Mlp, MlpConfig, ResNet, ResNetConfig};
pub use neural::optim::{AdamConfig, ParamStepper, SgdConfig, SgdMomentumConfig};
