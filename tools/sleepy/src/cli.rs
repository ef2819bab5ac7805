//! Command-line interface definitions for sleepy.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sleepy_core::ConsumePolicy;

/// Readers sleep until a writer wakes them.
#[derive(Parser)]
#[command(name = "sleepy", version, about)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Device config file (TOML).
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Consume policy (overrides the config file).
    #[arg(long, global = true)]
    pub policy: Option<ConsumePolicy>,

    /// Show only warnings, errors and the final summary.
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log every sleep and wake.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Put readers to sleep, then wake them with writes.
    Demo(DemoArgs),
    /// Interrupt a sleeping reader, then show the device still works.
    Interrupt(InterruptArgs),
}

/// Arguments for the `demo` subcommand.
#[derive(Parser)]
pub struct DemoArgs {
    /// Number of reader threads.
    #[arg(long, short = 'r', default_value = "2")]
    pub readers: usize,

    /// Number of writes.
    #[arg(long, short = 'w', default_value = "1")]
    pub writes: usize,

    /// Pause before each write, and before cancelling leftover readers.
    #[arg(long, default_value = "100")]
    pub interval_ms: u64,
}

/// Arguments for the `interrupt` subcommand.
#[derive(Parser)]
pub struct InterruptArgs {
    /// How long the reader sleeps before it is interrupted.
    #[arg(long, default_value = "100")]
    pub delay_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn policy_flag_parses() {
        let cli = Cli::parse_from(["sleepy", "--policy", "exclusive", "demo", "-r", "3"]);
        assert_eq!(cli.policy, Some(ConsumePolicy::Exclusive));
        match cli.command {
            Command::Demo(args) => {
                assert_eq!(args.readers, 3);
                assert_eq!(args.writes, 1);
            }
            Command::Interrupt(_) => panic!("expected demo"),
        }
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["sleepy", "-q", "-v", "demo"]).is_err());
    }
}
