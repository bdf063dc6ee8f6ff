pub mod locations;
pub mod log;
pub mod plan;
pub mod run;
pub mod watch;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use stocksync_core::SyncConfig;

/// Exit status when `--strict` is set and at least one update failed.
pub const EXIT_UPDATE_FAILURES: u8 = 2;
/// Exit status when a run was cancelled before finishing its updates.
pub const EXIT_CANCELLED: u8 = 3;

/// `--config` shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// YAML config file (default: ~/.stocksync/config.yaml if present).
    /// Environment variables override file values.
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl ConfigArgs {
    pub fn load(&self) -> Result<SyncConfig> {
        SyncConfig::load(self.config.as_deref()).context("configuration error")
    }
}
