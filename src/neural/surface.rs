//! Two-parameter test surface for comparing update rules.
//!
//! `loss(w1, w2) = tanh(w1)² + 0.01·|w1| + sigmoid(w2)`
//!
//! Along `w1` the surface is a narrow valley with a kink at zero; along `w2`
//! it is a plateau whose slope vanishes in both directions. Plain SGD crawls
//! on the plateau while momentum keeps accelerating down it.

use burn::module::{Module, Param};
use burn::optim::SimpleOptimizer;
use burn::prelude::*;
use burn::tensor::activation;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;
use serde::Serialize;
use tracing::{debug, trace};

use super::optim::ParamStepper;

/// Start used in the course notebooks.
pub const DEFAULT_START: [f32; 2] = [5.0, 5.0];

/// Evaluate the surface. Both inputs hold a single element.
pub fn pathological_loss<B: Backend>(w1: Tensor<B, 1>, w2: Tensor<B, 1>) -> Tensor<B, 1> {
    let valley = w1.clone().tanh();
    valley.clone() * valley + w1.abs().mul_scalar(0.01) + activation::sigmoid(w2)
}

/// The two coordinates as trainable parameters.
#[derive(Module, Debug)]
pub struct CurveParams<B: Backend> {
    pub w1: Param<Tensor<B, 1>>,
    pub w2: Param<Tensor<B, 1>>,
}

impl<B: Backend> CurveParams<B> {
    pub fn new(start: [f32; 2], device: &B::Device) -> Self {
        Self {
            w1: Param::from_tensor(Tensor::from_floats([start[0]], device)),
            w2: Param::from_tensor(Tensor::from_floats([start[1]], device)),
        }
    }

    pub fn loss(&self) -> Tensor<B, 1> {
        pathological_loss(self.w1.val(), self.w2.val())
    }

    pub fn position(&self) -> [f32; 2] {
        [scalar(self.w1.val()), scalar(self.w2.val())]
    }
}

fn scalar<B: Backend>(t: Tensor<B, 1>) -> f32 {
    t.into_scalar().elem::<f32>()
}

/// One visited point of the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvePoint {
    pub w1: f32,
    pub w2: f32,
    pub loss: f32,
}

/// Points visited by an optimizer, start first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Trajectory {
    pub points: Vec<CurvePoint>,
}

impl Trajectory {
    pub fn start(&self) -> Option<&CurvePoint> {
        self.points.first()
    }

    pub fn end(&self) -> Option<&CurvePoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

fn visit<B: Backend>(params: &CurveParams<B>, loss: Tensor<B, 1>) -> CurvePoint {
    let [w1, w2] = params.position();
    CurvePoint {
        w1,
        w2,
        loss: scalar(loss),
    }
}

/// Run `num_updates` optimizer steps from `start`.
///
/// Returns `num_updates + 1` points: the start and the position after each
/// update.
pub fn train_curve<B, O>(
    optim: &mut ParamStepper<CurveParams<B>, B, O>,
    start: [f32; 2],
    num_updates: usize,
    device: &B::Device,
) -> Trajectory
where
    B: AutodiffBackend,
    O: SimpleOptimizer<B::InnerBackend>,
{
    let mut params = CurveParams::<B>::new(start, device);
    let mut points = Vec::with_capacity(num_updates + 1);

    for update in 0..num_updates {
        optim.clear_gradients();
        let loss = params.loss();
        let point = visit(&params, loss.clone());
        trace!(update, w1 = point.w1, w2 = point.w2, loss = point.loss, "curve");
        points.push(point);

        optim.backward(loss, &params);
        params = optim.step(params);
    }
    points.push(visit(&params, params.loss()));

    let trajectory = Trajectory { points };
    if let Some(end) = trajectory.end() {
        debug!(
            updates = num_updates,
            w1 = end.w1,
            w2 = end.w2,
            loss = end.loss,
            "curve finished"
        );
    }
    trajectory
}
