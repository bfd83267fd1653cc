//! Run-level settings that would otherwise be process-global state.

use burn::config::Config;
use serde::{Deserialize, Serialize};

/// Where tensors live for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Cpu,
    Gpu,
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu (ndarray)"),
            Self::Gpu => write!(f, "gpu (wgpu)"),
        }
    }
}

/// Seed and device for one run, passed explicitly to whatever needs them.
#[derive(Config, Debug)]
pub struct RunConfig {
    /// Seed for synthetic inputs.
    #[config(default = 42)]
    pub seed: u64,
    /// Backend device family.
    #[config(default = "DeviceKind::Cpu")]
    pub device: DeviceKind,
}
