//! SGD with momentum, in exponential-moving-average form.
//!
//! ```text
//! m ← β·m + (1 − β)·g
//! w ← w − η·m
//! ```
//!
//! With `β = 0` this is plain SGD, which is how [`SgdConfig`] is built.

use burn::config::Config;
use burn::module::AutodiffModule;
use burn::optim::SimpleOptimizer;
use burn::prelude::*;
use burn::record::Record;
use burn::tensor::backend::AutodiffBackend;
use tracing::debug;

use super::stepper::ParamStepper;
use crate::error::ConfigError;

// ─── Configuration ────────────────────────────────────────────────

/// SGD-with-momentum configuration.
#[derive(Config, Debug)]
pub struct SgdMomentumConfig {
    /// Step size η, strictly positive.
    pub learning_rate: f64,
    /// Smoothing coefficient β in [0, 1).
    #[config(default = 0.9)]
    pub momentum: f64,
}

/// Plain SGD configuration: `w ← w − η·g`.
#[derive(Config, Debug)]
pub struct SgdConfig {
    pub learning_rate: f64,
}

pub(crate) fn check_learning_rate(lr: f64) -> Result<(), ConfigError> {
    if lr.is_finite() && lr > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::LearningRate(lr))
    }
}

impl SgdMomentumConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_learning_rate(self.learning_rate)?;
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(ConfigError::Momentum(self.momentum));
        }
        Ok(())
    }

    /// Build the optimizer for the parameters of `M`.
    pub fn init<B, M>(&self) -> Result<ParamStepper<M, B, Momentum>, ConfigError>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B>,
    {
        self.validate()?;
        debug!(
            lr = self.learning_rate,
            momentum = self.momentum,
            "sgd with momentum"
        );
        Ok(ParamStepper::new(
            Momentum {
                momentum: self.momentum,
            },
            self.learning_rate,
        ))
    }
}

impl SgdConfig {
    pub fn init<B, M>(&self) -> Result<ParamStepper<M, B, Momentum>, ConfigError>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B>,
    {
        SgdMomentumConfig::new(self.learning_rate)
            .with_momentum(0.0)
            .init::<B, M>()
    }
}

// ─── Update rule ──────────────────────────────────────────────────

/// EMA momentum update rule.
///
/// Velocities are created lazily as zeros the first time a parameter yields
/// a gradient. Every parameter that is ever updated therefore has a zero
/// velocity registered before its first update, the same as allocating all
/// buffers when the optimizer is built.
#[derive(Debug, Clone)]
pub struct Momentum {
    momentum: f64,
}

impl Momentum {
    pub fn momentum(&self) -> f64 {
        self.momentum
    }
}

/// Velocity of one parameter; same shape as the parameter.
#[derive(Record, Clone)]
pub struct MomentumState<B: Backend, const D: usize> {
    pub velocity: Tensor<B, D>,
}

impl<B: Backend> SimpleOptimizer<B> for Momentum {
    type State<const D: usize> = MomentumState<B, D>;

    fn step<const D: usize>(
        &self,
        lr: f64,
        tensor: Tensor<B, D>,
        grad: Tensor<B, D>,
        state: Option<Self::State<D>>,
    ) -> (Tensor<B, D>, Option<Self::State<D>>) {
        // A parameter seen for the first time starts from zero velocity.
        let velocity = match state {
            Some(state) => state.velocity,
            None => grad.zeros_like(),
        };
        let velocity =
            velocity.mul_scalar(self.momentum) + grad.mul_scalar(1.0 - self.momentum);
        let tensor = tensor - velocity.clone().mul_scalar(lr);

        (tensor, Some(MomentumState { velocity }))
    }

    fn to_device<const D: usize>(
        mut state: Self::State<D>,
        device: &B::Device,
    ) -> Self::State<D> {
        state.velocity = state.velocity.to_device(device);
        state
    }
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::module::{Module, Param};

    type B = Autodiff<NdArray>;

    const GRAD: [f32; 3] = [1.0, -2.0, 0.5];

    /// `used` enters the loss linearly, so its gradient is exactly `GRAD`.
    /// `unused` never reaches the loss.
    #[derive(Module, Debug)]
    struct Probe<B: Backend> {
        used: Param<Tensor<B, 1>>,
        unused: Param<Tensor<B, 1>>,
    }

    impl<B: Backend> Probe<B> {
        fn new(device: &B::Device) -> Self {
            Self {
                used: Param::from_tensor(Tensor::from_floats([0.5, 0.5, 0.5], device)),
                unused: Param::from_tensor(Tensor::from_floats([3.0], device)),
            }
        }

        fn loss(&self, device: &B::Device) -> Tensor<B, 1> {
            (self.used.val() * Tensor::from_floats(GRAD, device)).sum()
        }
    }

    fn values(t: Tensor<NdArray, 1>) -> Vec<f32> {
        t.into_data().to_vec::<f32>().unwrap()
    }

    fn assert_close(actual: &[f32], expected: &[f32]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-6, "{actual:?} != {expected:?}");
        }
    }

    fn run_steps(config: &SgdMomentumConfig, steps: usize) -> Vec<Vec<f32>> {
        let device = Default::default();
        let mut probe = Probe::<B>::new(&device);
        let mut optim = config.init::<B, Probe<B>>().unwrap();
        let mut history = vec![values(probe.used.val().inner())];
        for _ in 0..steps {
            optim.clear_gradients();
            let loss = probe.loss(&device);
            optim.backward(loss, &probe);
            probe = optim.step(probe);
            history.push(values(probe.used.val().inner()));
        }
        history
    }

    #[test]
    fn first_step_scales_gradient_by_one_minus_beta() {
        let (lr, beta) = (0.1f32, 0.9f32);
        let history = run_steps(&SgdMomentumConfig::new(0.1), 1);
        let expected: Vec<f32> = GRAD.iter().map(|g| 0.5 - lr * (1.0 - beta) * g).collect();
        assert_close(&history[1], &expected);
    }

    #[test]
    fn second_step_adds_decayed_velocity() {
        let (lr, beta) = (0.1f32, 0.9f32);
        let history = run_steps(&SgdMomentumConfig::new(0.1), 2);
        let expected: Vec<f32> = history[1]
            .iter()
            .zip(GRAD)
            .map(|(w, g)| w - lr * (beta * (1.0 - beta) * g + (1.0 - beta) * g))
            .collect();
        assert_close(&history[2], &expected);
    }

    #[test]
    fn velocity_starts_at_zero_after_empty_steps() {
        let (lr, beta) = (0.1f32, 0.9f32);
        let device = Default::default();
        let mut probe = Probe::<B>::new(&device);
        let mut optim = SgdMomentumConfig::new(0.1).init::<B, Probe<B>>().unwrap();
        for _ in 0..3 {
            optim.clear_gradients();
            probe = optim.step(probe);
        }
        assert_close(&values(probe.used.val().inner()), &[0.5, 0.5, 0.5]);

        optim.backward(probe.loss(&device), &probe);
        probe = optim.step(probe);
        let expected: Vec<f32> = GRAD.iter().map(|g| 0.5 - lr * (1.0 - beta) * g).collect();
        assert_close(&values(probe.used.val().inner()), &expected);
        assert_eq!(optim.steps(), 4);
    }

    #[test]
    fn identical_runs_are_bit_identical() {
        let config = SgdMomentumConfig::new(0.3).with_momentum(0.8);
        assert_eq!(run_steps(&config, 5), run_steps(&config, 5));
    }

    #[test]
    fn plain_sgd_moves_by_lr_times_gradient() {
        let device = Default::default();
        let mut probe = Probe::<B>::new(&device);
        let mut optim = SgdConfig::new(0.25).init::<B, Probe<B>>().unwrap();
        optim.backward(probe.loss(&device), &probe);
        probe = optim.step(probe);
        let expected: Vec<f32> = GRAD.iter().map(|g| 0.5 - 0.25 * g).collect();
        assert_close(&values(probe.used.val().inner()), &expected);
    }

    #[test]
    fn parameters_without_gradient_are_skipped() {
        let device = Default::default();
        let mut probe = Probe::<B>::new(&device);
        let mut optim = SgdMomentumConfig::new(1.0).init::<B, Probe<B>>().unwrap();
        optim.backward(probe.loss(&device), &probe);
        assert!(optim.has_gradient(&probe.used));
        assert!(!optim.has_gradient(&probe.unused));
        probe = optim.step(probe);
        assert_eq!(values(probe.unused.val().inner()), vec![3.0]);
    }

    #[test]
    fn cleared_gradients_read_as_zero() {
        let device = Default::default();
        let probe = Probe::<B>::new(&device);
        let mut optim = SgdMomentumConfig::new(0.1).init::<B, Probe<B>>().unwrap();
        optim.backward(probe.loss(&device), &probe);
        assert_close(&values(optim.gradient(&probe.used)), &GRAD);

        optim.clear_gradients();
        assert_eq!(values(optim.gradient(&probe.used)), vec![0.0; 3]);
        assert_eq!(values(optim.gradient(&probe.unused)), vec![0.0]);
    }

    #[test]
    fn step_after_clear_changes_nothing() {
        let device = Default::default();
        let mut probe = Probe::<B>::new(&device);
        let mut optim = SgdMomentumConfig::new(0.1).init::<B, Probe<B>>().unwrap();
        optim.backward(probe.loss(&device), &probe);
        optim.clear_gradients();
        probe = optim.step(probe);
        assert_eq!(values(probe.used.val().inner()), vec![0.5; 3]);
        assert_eq!(optim.steps(), 1);
    }

    #[test]
    fn rejects_out_of_range_hyperparameters() {
        let bad = |lr: f64, beta: f64| {
            SgdMomentumConfig::new(lr)
                .with_momentum(beta)
                .init::<B, Probe<B>>()
                .err()
        };
        assert_eq!(bad(0.0, 0.9), Some(ConfigError::LearningRate(0.0)));
        assert_eq!(bad(-1.0, 0.9), Some(ConfigError::LearningRate(-1.0)));
        assert_eq!(bad(0.1, 1.0), Some(ConfigError::Momentum(1.0)));
        assert_eq!(bad(0.1, -0.1), Some(ConfigError::Momentum(-0.1)));
        assert!(bad(0.1, 0.0).is_none());
        assert!(bad(f64::NAN, 0.5).is_some());
    }
}
