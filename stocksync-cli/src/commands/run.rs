//! `stocksync run`: one pass.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use stocksync_core::{UpdateOutcome, UreqTransport};
use stocksync_daemon::run_once_blocking;
use stocksync_sync::{RunOptions, RunReport};

use super::{ConfigArgs, EXIT_CANCELLED, EXIT_UPDATE_FAILURES};

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Reconcile only: no inventory writes and no run log.
    #[arg(long)]
    pub dry_run: bool,

    /// Exit with status 2 when any update failed.
    #[arg(long)]
    pub strict: bool,

    /// Print the summary as JSON on stdout.
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    pub fn run(self) -> Result<ExitCode> {
        let config = self.config.load()?;
        let options = RunOptions {
            dry_run: self.dry_run,
            ..RunOptions::default()
        };

        let report = run_once_blocking(config, Arc::new(UreqTransport::new()), options)
            .context("sync aborted")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report.summary)
                    .context("failed to serialize run summary")?
            );
        } else {
            print_report(&report);
        }

        Ok(exit_code(&report, self.strict))
    }
}

pub(crate) fn exit_code(report: &RunReport, strict: bool) -> ExitCode {
    if report.summary.cancelled {
        ExitCode::from(EXIT_CANCELLED)
    } else if strict && report.summary.tally.failed > 0 {
        ExitCode::from(EXIT_UPDATE_FAILURES)
    } else {
        ExitCode::SUCCESS
    }
}

fn print_report(report: &RunReport) {
    let summary = &report.summary;
    let prefix = if summary.dry_run { "[dry-run] " } else { "" };

    for attempt in &report.attempts {
        match attempt.result {
            UpdateOutcome::Ok => println!(
                "  {}  {} → {}",
                "✓".green(),
                attempt.sku,
                attempt.quantity
            ),
            UpdateOutcome::Error => println!(
                "  {}  {} → {}  {}",
                "✗".red(),
                attempt.sku,
                attempt.quantity,
                attempt.message.bright_black()
            ),
        }
    }

    let tally = &summary.tally;
    let line = if summary.dry_run {
        format!(
            "{prefix}{} would be updated, {} skipped ({} feed SKUs, {} variants)",
            tally.pending, tally.skipped, summary.feed_skus, summary.variants
        )
    } else {
        format!(
            "{} updated, {} skipped, {} failed ({} feed SKUs, {} variants, {} ms)",
            tally.updated, tally.skipped, tally.failed, summary.feed_skus, summary.variants,
            summary.duration_ms
        )
    };

    if summary.cancelled {
        println!(
            "{} {line}, {} pending",
            "■ cancelled:".yellow().bold(),
            tally.pending
        );
    } else if tally.failed > 0 {
        println!("{} {line}", "■".yellow().bold());
    } else {
        println!("{} {line}", "■".green().bold());
    }

    if summary.feed_rows_skipped > 0 {
        println!(
            "{}",
            format!("{} feed rows were skipped", summary.feed_rows_skipped).bright_black()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stocksync_core::{LocationId, Tally};
    use stocksync_sync::RunSummary;

    fn report(failed: usize, cancelled: bool) -> RunReport {
        RunReport {
            summary: RunSummary {
                tally: Tally {
                    updated: 1,
                    failed,
                    ..Tally::default()
                },
                cancelled,
                ..RunSummary::default()
            },
            location: LocationId(2),
            decisions: Vec::new(),
            attempts: Vec::new(),
        }
    }

    #[test]
    fn cancelled_run_exits_3_even_when_strict() {
        assert_eq!(exit_code(&report(1, true), true), ExitCode::from(EXIT_CANCELLED));
        assert_eq!(exit_code(&report(0, true), false), ExitCode::from(EXIT_CANCELLED));
    }

    #[test]
    fn failures_only_matter_under_strict() {
        assert_eq!(exit_code(&report(1, false), true), ExitCode::from(EXIT_UPDATE_FAILURES));
        assert_eq!(exit_code(&report(1, false), false), ExitCode::SUCCESS);
        assert_eq!(exit_code(&report(0, false), true), ExitCode::SUCCESS);
    }
}
