//! Classifiers and optimizers on burn.
//!
//! # Public API
//!
//! ```ignore
//! use burn::backend::{Autodiff, NdArray};
//! use netlab::neural::model::ResNetConfig;
//! use netlab::neural::optim::SgdMomentumConfig;
//!
//! type B = Autodiff<NdArray>;
//! let device = Default::default();
//! let mut model = ResNetConfig::cifar10().init::<B>(&device)?;
//! let mut optim = SgdMomentumConfig::new(0.1).init::<B, _>()?;
//!
//! optim.clear_gradients();
//! let loss = model.forward(images)?.powf_scalar(2.0).mean();
//! optim.backward(loss, &model);
//! model = optim.step(model);
//! ```

pub mod data;
pub mod model;
pub mod optim;
pub mod surface;
