use burn::backend::{Autodiff, NdArray};
use burn::prelude::Backend;
use clap::{Args, ValueEnum};

use netlab::neural::optim::{AdamConfig, SgdConfig, SgdMomentumConfig};
use netlab::neural::surface::{train_curve, CurveParams, DEFAULT_START};
use netlab::Error;

type B = Autodiff<NdArray>;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OptimizerKind {
    Sgd,
    Momentum,
    Adam,
}

impl OptimizerKind {
    fn default_lr(self) -> f64 {
        match self {
            Self::Sgd | Self::Momentum => 10.0,
            Self::Adam => 1.0,
        }
    }
}

#[derive(Args)]
pub struct CurveArgs {
    /// Update rule
    #[arg(long, value_enum, default_value = "momentum")]
    pub optimizer: OptimizerKind,
    /// Learning rate (default: 10 for sgd/momentum, 1 for adam)
    #[arg(long)]
    pub lr: Option<f64>,
    /// Momentum coefficient for --optimizer momentum
    #[arg(long, default_value = "0.9")]
    pub momentum: f64,
    /// Number of updates
    #[arg(long, default_value = "100")]
    pub steps: usize,
    /// Starting point
    #[arg(long, num_args = 2, value_names = ["W1", "W2"])]
    pub start: Option<Vec<f32>>,
    /// Print the whole trajectory as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn cmd_curve(args: CurveArgs) {
    if let Err(err) = run(&args) {
        super::fail(err);
    }
}

fn run(args: &CurveArgs) -> Result<(), Error> {
    let device: <B as Backend>::Device = Default::default();
    let lr = args.lr.unwrap_or_else(|| args.optimizer.default_lr());
    let start = match args.start.as_deref() {
        Some(&[w1, w2]) => [w1, w2],
        _ => DEFAULT_START,
    };

    let trajectory = match args.optimizer {
        OptimizerKind::Sgd => {
            let mut optim = SgdConfig::new(lr).init::<B, CurveParams<B>>()?;
            train_curve(&mut optim, start, args.steps, &device)
        }
        OptimizerKind::Momentum => {
            let mut optim = SgdMomentumConfig::new(lr)
                .with_momentum(args.momentum)
                .init::<B, CurveParams<B>>()?;
            train_curve(&mut optim, start, args.steps, &device)
        }
        OptimizerKind::Adam => {
            let mut optim = AdamConfig::new(lr).init::<B, CurveParams<B>>()?;
            train_curve(&mut optim, start, args.steps, &device)
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&trajectory)?);
        return Ok(());
    }

    if let (Some(first), Some(last)) = (trajectory.start(), trajectory.end()) {
        eprintln!("{:?}, lr {}, {} updates", args.optimizer, lr, args.steps);
        println!(
            "start  w1 {:>9.4}  w2 {:>9.4}  loss {:.6}",
            first.w1, first.w2, first.loss
        );
        println!(
            "end    w1 {:>9.4}  w2 {:>9.4}  loss {:.6}",
            last.w1, last.w2, last.loss
        );
    }
    Ok(())
}
