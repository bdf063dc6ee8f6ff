//! `stocksync log`: tail of the run log.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use stocksync_core::{RunLogEntry, UpdateOutcome};
use stocksync_sync::run_log;

use super::ConfigArgs;

#[derive(Args, Debug)]
pub struct LogArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Read this file instead of the configured RUN_LOG_PATH.
    #[arg(long, value_name = "FILE")]
    pub path: Option<PathBuf>,

    /// Number of entries to show.
    #[arg(long, short = 'n', default_value_t = 20)]
    pub lines: usize,
}

#[derive(Tabled)]
struct LogRow {
    #[tabled(rename = "time")]
    time: String,
    #[tabled(rename = "sku")]
    sku: String,
    #[tabled(rename = "qty")]
    quantity: u32,
    #[tabled(rename = "result")]
    result: String,
    #[tabled(rename = "message")]
    message: String,
}

impl From<RunLogEntry> for LogRow {
    fn from(entry: RunLogEntry) -> Self {
        Self {
            time: entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            sku: entry.sku.to_string(),
            quantity: entry.quantity,
            result: match entry.result {
                UpdateOutcome::Ok => "ok".green().to_string(),
                UpdateOutcome::Error => "error".red().to_string(),
            },
            message: entry.message,
        }
    }
}

impl LogArgs {
    pub fn run(self) -> Result<ExitCode> {
        let path = match self.path {
            Some(path) => path,
            None => self
                .config
                .load()?
                .run_log_path
                .context("no run log configured (set RUN_LOG_PATH or run_log_path)")?,
        };

        if !path.exists() {
            println!("run log not found: {}", path.display());
            return Ok(ExitCode::SUCCESS);
        }

        let entries = run_log::tail(&path, self.lines)
            .with_context(|| format!("failed to read {}", path.display()))?;
        println!("==> {} <==", path.display());
        if entries.is_empty() {
            println!("No entries.");
            return Ok(ExitCode::SUCCESS);
        }

        let rows: Vec<LogRow> = entries.into_iter().map(LogRow::from).collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(ExitCode::SUCCESS)
    }
}
