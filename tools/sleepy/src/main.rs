//! sleepy: the writers awake the readers.
//!
//! Host tool that opens one [`SleepyDevice`] and drives reader and writer
//! threads against it.
//!
//! Pipeline: parse flags → init logging → load config → build device →
//!           run subcommand.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sleepy::{cli, log, run};
use sleepy_core::{DeviceConfig, SleepyDevice};
use tracing::debug;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    log::init(cli.quiet, cli.verbose);

    let mut config = match cli.config {
        Some(ref path) => load_config(path)?,
        None => DeviceConfig::default(),
    };
    if let Some(policy) = cli.policy {
        config.policy = policy;
    }
    debug!(name = %config.name, policy = %config.policy, "device config");

    let device = Arc::new(SleepyDevice::new(config));

    match cli.command {
        cli::Command::Demo(ref args) => run::cmd_demo(&device, args),
        cli::Command::Interrupt(ref args) => run::cmd_interrupt(&device, args),
    }
}

/// Reads and parses a device config file.
fn load_config(path: &Path) -> Result<DeviceConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    DeviceConfig::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
}
