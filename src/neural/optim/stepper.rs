//! Stateful front-end over burn's functional optimizers.
//!
//! burn returns gradients as a value from `backward()` and threads modules
//! through `Optimizer::step` by value. [`ParamStepper`] keeps the most
//! recent gradients between the two calls so training code can follow the
//! clear → backward → step rhythm. Per-parameter state (velocities,
//! moments) lives in the wrapped [`OptimizerAdaptor`], keyed by `ParamId`.

use burn::module::{AutodiffModule, Param};
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{GradientsParams, Optimizer, SimpleOptimizer};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use tracing::trace;

/// Gradient buffer plus an update rule `O` for the parameters of `M`.
pub struct ParamStepper<M, B, O>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
    O: SimpleOptimizer<B::InnerBackend>,
{
    learning_rate: f64,
    optim: OptimizerAdaptor<O, M, B>,
    grads: GradientsParams,
    steps: usize,
}

impl<M, B, O> ParamStepper<M, B, O>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
    O: SimpleOptimizer<B::InnerBackend>,
{
    /// Callers validate `learning_rate` before getting here.
    pub(crate) fn new(rule: O, learning_rate: f64) -> Self {
        Self {
            learning_rate,
            optim: OptimizerAdaptor::from(rule),
            grads: GradientsParams::new(),
            steps: 0,
        }
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Number of `step` calls so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Forget every recorded gradient.
    ///
    /// Afterwards [`gradient`](Self::gradient) reports zeros and `step`
    /// leaves every parameter untouched.
    pub fn clear_gradients(&mut self) {
        self.grads = GradientsParams::new();
    }

    /// Differentiate a scalar loss and record the gradient of every
    /// parameter of `module` that took part in computing it.
    pub fn backward(&mut self, loss: Tensor<B, 1>, module: &M) {
        let grads = loss.backward();
        self.grads = GradientsParams::from_grads(grads, module);
    }

    /// Recorded gradient of `param`, or zeros of its shape if none.
    pub fn gradient<const D: usize>(
        &self,
        param: &Param<Tensor<B, D>>,
    ) -> Tensor<B::InnerBackend, D> {
        self.grads
            .get::<B::InnerBackend, D>(param.id)
            .unwrap_or_else(|| param.val().inner().zeros_like())
    }

    pub fn has_gradient<const D: usize>(&self, param: &Param<Tensor<B, D>>) -> bool {
        self.grads.get::<B::InnerBackend, D>(param.id).is_some()
    }

    /// Apply one update to every parameter with a recorded gradient and
    /// return the updated module. The recorded gradients are consumed.
    ///
    /// Runs on the inner backend, outside the autodiff graph.
    pub fn step(&mut self, module: M) -> M {
        let grads = std::mem::replace(&mut self.grads, GradientsParams::new());
        self.steps += 1;
        trace!(step = self.steps, lr = self.learning_rate, "optimizer step");
        self.optim.step(self.learning_rate, module, grads)
    }
}
