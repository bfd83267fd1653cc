use std::path::PathBuf;

use burn::config::Config;
use clap::{Args, ValueEnum};

use netlab::neural::model::{MlpConfig, ResNetConfig};

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModelKind {
    Resnet,
    Mlp,
}

#[derive(Args)]
pub struct InitConfigArgs {
    /// Which model's defaults to write
    #[arg(value_enum)]
    pub model: ModelKind,
    /// Output JSON file
    pub output: PathBuf,
}

pub fn cmd_init_config(args: InitConfigArgs) {
    let saved = match args.model {
        ModelKind::Resnet => ResNetConfig::cifar10().save(&args.output),
        ModelKind::Mlp => MlpConfig::fashion_mnist().save(&args.output),
    };
    if let Err(e) = saved {
        eprintln!("error: cannot write '{}': {}", args.output.display(), e);
        std::process::exit(1);
    }
    eprintln!("Wrote {:?} config to {}", args.model, args.output.display());
}
