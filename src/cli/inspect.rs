use std::path::PathBuf;

use burn::backend::wgpu::{Wgpu, WgpuDevice};
use burn::backend::NdArray;
use burn::module::Module;
use burn::prelude::*;
use clap::Args;

use netlab::neural::data::synthetic_images;
use netlab::neural::model::{MlpConfig, ResNetConfig};
use netlab::{DeviceKind, Error, RunConfig};

#[derive(Args)]
pub struct ModelArgs {
    /// Model config JSON (default: the course layout)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Synthetic batch size
    #[arg(short, long, default_value = "4")]
    pub batch: usize,
    /// Seed for the synthetic batch
    #[arg(long, default_value = "42")]
    pub seed: u64,
    /// Run on the GPU (wgpu) instead of the CPU (ndarray)
    #[arg(long)]
    pub gpu: bool,
}

impl ModelArgs {
    fn run_config(&self) -> RunConfig {
        let device = if self.gpu {
            DeviceKind::Gpu
        } else {
            DeviceKind::Cpu
        };
        RunConfig::new().with_seed(self.seed).with_device(device)
    }
}

pub fn cmd_resnet(args: ModelArgs) {
    let result = super::load_config(args.config.as_deref(), ResNetConfig::cifar10).and_then(
        |config| {
            let run = args.run_config();
            match run.device {
                DeviceKind::Cpu => {
                    inspect_resnet::<NdArray>(&config, &run, args.batch, &Default::default())
                }
                DeviceKind::Gpu => {
                    inspect_resnet::<Wgpu>(&config, &run, args.batch, &WgpuDevice::default())
                }
            }
        },
    );
    if let Err(err) = result {
        super::fail(err);
    }
}

pub fn cmd_mlp(args: ModelArgs) {
    let result = super::load_config(args.config.as_deref(), MlpConfig::fashion_mnist).and_then(
        |config| {
            let run = args.run_config();
            match run.device {
                DeviceKind::Cpu => {
                    inspect_mlp::<NdArray>(&config, &run, args.batch, &Default::default())
                }
                DeviceKind::Gpu => {
                    inspect_mlp::<Wgpu>(&config, &run, args.batch, &WgpuDevice::default())
                }
            }
        },
    );
    if let Err(err) = result {
        super::fail(err);
    }
}

fn inspect_resnet<B: Backend>(
    config: &ResNetConfig,
    run: &RunConfig,
    batch: usize,
    device: &B::Device,
) -> Result<(), Error> {
    let model = config.init::<B>(device)?;
    let shape = [batch, 3, 32, 32];

    eprintln!(
        "resnet: {} groups, blocks {:?}, channels {:?}, {}, {}",
        config.num_blocks.len(),
        config.num_blocks,
        config.c_hidden,
        config.block,
        config.activation,
    );
    eprintln!("device: {}, seed {}", run.device, run.seed);
    println!("params  {}", model.num_params());
    println!("input   {:?}", shape);

    let shapes = model.stage_shapes(synthetic_images::<B>(run, shape, device))?;
    for (stage, dims) in shapes.iter().enumerate() {
        if stage == 0 {
            println!("stem    {:?}", dims);
        } else {
            println!("group {} {:?}", stage, dims);
        }
    }

    let logits = model.forward(synthetic_images::<B>(run, shape, device))?;
    println!("logits  {:?}", logits.dims());
    report_finite(logits)
}

fn inspect_mlp<B: Backend>(
    config: &MlpConfig,
    run: &RunConfig,
    batch: usize,
    device: &B::Device,
) -> Result<(), Error> {
    let model = config.init::<B>(device)?;
    let shape = image_shape(batch, config.input_size);

    eprintln!(
        "mlp: hidden {:?}, {}, init {:?}",
        config.hidden_sizes, config.activation, config.init
    );
    eprintln!("device: {}, seed {}", run.device, run.seed);
    println!("params  {}", model.num_params());
    println!("input   {:?}", shape);

    let logits = model.forward(synthetic_images::<B>(run, shape, device))?;
    println!("logits  {:?}", logits.dims());
    report_finite(logits)
}

/// Square single-channel images when the width allows it, otherwise one row.
fn image_shape(batch: usize, input_size: usize) -> [usize; 4] {
    let side = (input_size as f64).sqrt().round() as usize;
    if side * side == input_size {
        [batch, 1, side, side]
    } else {
        [batch, 1, 1, input_size]
    }
}

/// Fail when any logit is NaN or infinite.
fn report_finite<B: Backend>(logits: Tensor<B, 2>) -> Result<(), Error> {
    let values = logits.into_data().iter::<f32>().collect::<Vec<_>>();
    let count = values.iter().filter(|v| !v.is_finite()).count();
    if count > 0 {
        return Err(Error::NonFinite {
            count,
            total: values.len(),
        });
    }
    eprintln!("all {} logits finite", values.len());
    Ok(())
}
