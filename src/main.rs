use clap::{ArgAction, Parser, Subcommand};

mod cli;

use cli::config::{cmd_init_config, InitConfigArgs};
use cli::curve::{cmd_curve, CurveArgs};
use cli::inspect::{cmd_mlp, cmd_resnet, ModelArgs};

#[derive(Parser)]
#[command(
    name = "netlab",
    version,
    about = "Residual networks, MLPs and momentum SGD on burn"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Optimize the two-parameter pathological curve and report the path
    Curve(CurveArgs),
    /// Build a ResNet and push a synthetic CIFAR-sized batch through it
    Resnet(ModelArgs),
    /// Build an MLP and push a synthetic FashionMNIST-sized batch through it
    Mlp(ModelArgs),
    /// Write a default model config as JSON
    InitConfig(InitConfigArgs),
}

fn main() {
    let cli = Cli::parse();
    netlab::telemetry::init_tracing(cli.verbose);

    match cli.command {
        Command::Curve(args) => cmd_curve(args),
        Command::Resnet(args) => cmd_resnet(args),
        Command::Mlp(args) => cmd_mlp(args),
        Command::InitConfig(args) => cmd_init_config(args),
    }
}
