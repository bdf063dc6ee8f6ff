//! `stocksync watch`: loop mode.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use stocksync_core::{sync_interval_from_minutes, UreqTransport, MAX_SYNC_INTERVAL_MINUTES};
use stocksync_daemon::{start_blocking, LoopOptions};

use super::{ConfigArgs, EXIT_CANCELLED};

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Minutes between passes (overrides SYNC_INTERVAL_MINUTES).
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=MAX_SYNC_INTERVAL_MINUTES))]
    pub interval_minutes: Option<u64>,

    /// Reconcile only on every pass.
    #[arg(long)]
    pub dry_run: bool,
}

impl WatchArgs {
    pub fn run(self) -> Result<ExitCode> {
        let config = self.config.load()?;
        let interval = match self.interval_minutes {
            Some(minutes) => sync_interval_from_minutes(minutes)
                .with_context(|| format!("invalid --interval-minutes {minutes}"))?,
            None => config.sync_interval,
        };

        let options = LoopOptions {
            dry_run: self.dry_run,
            ..LoopOptions::every(interval)
        };
        let report = start_blocking(config, Arc::new(UreqTransport::new()), options)
            .context("loop mode failed")?;

        println!(
            "{} passes, {} failed",
            report.cycles, report.failed_cycles
        );
        if report.cancelled {
            return Ok(ExitCode::from(EXIT_CANCELLED));
        }
        Ok(ExitCode::SUCCESS)
    }
}
