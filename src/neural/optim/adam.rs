//! Adam: bias-corrected first and second moment estimates.

use burn::config::Config;
use burn::module::AutodiffModule;
use burn::optim::SimpleOptimizer;
use burn::prelude::*;
use burn::record::Record;
use burn::tensor::backend::AutodiffBackend;
use tracing::debug;

use super::momentum::check_learning_rate;
use super::stepper::ParamStepper;
use crate::error::ConfigError;

/// Adam configuration.
#[derive(Config, Debug)]
pub struct AdamConfig {
    pub learning_rate: f64,
    /// Decay of the first moment.
    #[config(default = 0.9)]
    pub beta_1: f64,
    /// Decay of the second moment.
    #[config(default = 0.999)]
    pub beta_2: f64,
    /// Added to the denominator.
    #[config(default = 1e-8)]
    pub epsilon: f64,
}

impl AdamConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_learning_rate(self.learning_rate)?;
        for (name, value) in [("beta_1", self.beta_1), ("beta_2", self.beta_2)] {
            if !(0.0..1.0).contains(&value) {
                return Err(ConfigError::Beta { name, value });
            }
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(ConfigError::Epsilon(self.epsilon));
        }
        Ok(())
    }

    pub fn init<B, M>(&self) -> Result<ParamStepper<M, B, Adam>, ConfigError>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B>,
    {
        self.validate()?;
        debug!(
            lr = self.learning_rate,
            beta_1 = self.beta_1,
            beta_2 = self.beta_2,
            epsilon = self.epsilon,
            "adam"
        );
        Ok(ParamStepper::new(
            Adam {
                beta_1: self.beta_1,
                beta_2: self.beta_2,
                epsilon: self.epsilon,
            },
            self.learning_rate,
        ))
    }
}

#[derive(Debug, Clone)]
pub struct Adam {
    beta_1: f64,
    beta_2: f64,
    epsilon: f64,
}

/// Moment estimates of one parameter.
#[derive(Record, Clone)]
pub struct AdamState<B: Backend, const D: usize> {
    /// Number of updates applied so far.
    pub time: usize,
    pub moment_1: Tensor<B, D>,
    pub moment_2: Tensor<B, D>,
}

impl<B: Backend> SimpleOptimizer<B> for Adam {
    type State<const D: usize> = AdamState<B, D>;

    fn step<const D: usize>(
        &self,
        lr: f64,
        tensor: Tensor<B, D>,
        grad: Tensor<B, D>,
        state: Option<Self::State<D>>,
    ) -> (Tensor<B, D>, Option<Self::State<D>>) {
        let (time, moment_1, moment_2) = match state {
            Some(state) => (state.time, state.moment_1, state.moment_2),
            None => (0, grad.zeros_like(), grad.zeros_like()),
        };
        let time = time + 1;

        let moment_1 =
            moment_1.mul_scalar(self.beta_1) + grad.clone().mul_scalar(1.0 - self.beta_1);
        let moment_2 =
            moment_2.mul_scalar(self.beta_2) + (grad.clone() * grad).mul_scalar(1.0 - self.beta_2);

        let t = time as i32;
        let m_hat = moment_1.clone().div_scalar(1.0 - self.beta_1.powi(t));
        let v_hat = moment_2.clone().div_scalar(1.0 - self.beta_2.powi(t));
        let update = m_hat / v_hat.sqrt().add_scalar(self.epsilon);

        let state = AdamState {
            time,
            moment_1,
            moment_2,
        };
        (tensor - update.mul_scalar(lr), Some(state))
    }

    fn to_device<const D: usize>(
        mut state: Self::State<D>,
        device: &B::Device,
    ) -> Self::State<D> {
        state.moment_1 = state.moment_1.to_device(device);
        state.moment_2 = state.moment_2.to_device(device);
        state
    }
}
