//! Parameter update rules on top of burn autodiff.
//!
//! Every rule is a [`burn::optim::SimpleOptimizer`] wrapped in a
//! [`ParamStepper`], which holds gradients between `backward` and `step`.

pub mod adam;
pub mod momentum;
pub mod stepper;

pub use adam::{Adam, AdamConfig};
pub use momentum::{Momentum, SgdConfig, SgdMomentumConfig};
pub use stepper::ParamStepper;
