//! Shared run entrypoint used by the CLI and the loop runtime.
//!
//! feed → catalog → location → reconcile → apply → tally → run log.
//! Everything before the first update is fatal on error; per-variant update
//! failures are counted and never abort.

use std::thread;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;

use stocksync_core::{
    reconcile, FeedFailurePolicy, LocationId, RunLogEntry, SyncConfig, SyncDecision, Tally,
    Transport, UpdateOutcome,
};
use stocksync_feed::{fetch_feed, FeedParse};
use stocksync_shop::{
    fetch_tagged_variants, resolve_location, InventoryUpdater, ShopClient, UpdateResult,
};

use crate::cancel::CancelToken;
use crate::error::SyncError;
use crate::run_log;

/// Per-run switches that are not part of the configuration.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Reconcile only: no connect/set calls and no run log.
    pub dry_run: bool,
    pub cancel: CancelToken,
}

/// Everything known before the first write.
#[derive(Debug, Clone)]
pub struct Plan {
    pub feed: FeedParse,
    /// Set when the feed failed and the `tolerate` policy replaced it with an
    /// empty one.
    pub feed_error: Option<String>,
    pub variants: usize,
    pub location: LocationId,
    pub decisions: Vec<SyncDecision>,
}

impl Plan {
    pub fn updates(&self) -> impl Iterator<Item = &SyncDecision> {
        self.decisions.iter().filter(|d| d.action.is_update())
    }
}

/// Machine-readable outcome of a run, as printed by `run --json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    #[serde(flatten)]
    pub tally: Tally,
    pub feed_skus: usize,
    pub feed_rows_skipped: usize,
    pub variants: usize,
    pub cancelled: bool,
    pub dry_run: bool,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: RunSummary,
    pub location: LocationId,
    pub decisions: Vec<SyncDecision>,
    /// One entry per attempted update, in order.
    pub attempts: Vec<RunLogEntry>,
}

/// Fetch feed and catalog, resolve the location and reconcile.
///
/// Issues read requests only.
pub fn plan(config: &SyncConfig, transport: &dyn Transport) -> Result<Plan, SyncError> {
    let (feed, feed_error) = match fetch_feed(transport, &config.feed) {
        Ok(feed) => (feed, None),
        Err(err) if config.feed.on_failure == FeedFailurePolicy::Tolerate => {
            tracing::warn!(error = %err, "feed failed; continuing with an empty feed");
            (FeedParse::default(), Some(err.to_string()))
        }
        Err(err) => return Err(err.into()),
    };
    for skip in &feed.skipped {
        tracing::debug!(line = skip.line, reason = %skip.reason, "feed row skipped");
    }

    let client = ShopClient::new(transport, &config.shop);
    let variants = fetch_tagged_variants(&client, &config.catalog).map_err(SyncError::Catalog)?;
    let location = resolve_location(&client, &config.location).map_err(SyncError::Location)?;

    let decisions = reconcile(&feed.map, &variants, config.update.policy);
    Ok(Plan {
        feed,
        feed_error,
        variants: variants.len(),
        location,
        decisions,
    })
}

/// One complete pass.
///
/// The cancel token is checked right before each update, after the delay
/// between updates; once set, the remaining updates are reported as
/// `pending` and the summary as cancelled. A run log write failure is logged
/// and does not fail the run.
pub fn run(
    config: &SyncConfig,
    transport: &dyn Transport,
    options: &RunOptions,
) -> Result<RunReport, SyncError> {
    let started = Instant::now();
    let plan = plan(config, transport)?;

    let mut tally = Tally::from_decisions(&plan.decisions);
    let mut attempts = Vec::new();
    let mut cancelled = false;
    let total_updates = plan.updates().count();

    if options.dry_run {
        tally.pending = total_updates;
        tracing::info!(updates = total_updates, "dry run; no writes issued");
    } else {
        let updater = InventoryUpdater::new(
            ShopClient::new(transport, &config.shop),
            plan.location,
            config.update.connect_first,
        );

        for (index, decision) in plan.updates().enumerate() {
            if index > 0 && !config.update.delay.is_zero() {
                thread::sleep(config.update.delay);
            }
            // Checked after the pause so a cancel during it issues no call.
            if options.cancel.is_cancelled() {
                cancelled = true;
                tally.pending = total_updates - index;
                tracing::warn!(pending = tally.pending, "run cancelled; stopping updates");
                break;
            }
            if let Some(entry) = apply_one(&updater, decision, &mut tally) {
                attempts.push(entry);
            }
        }
    }

    if let (Some(path), false) = (&config.run_log_path, options.dry_run) {
        if let Err(err) = run_log::append(path, &attempts) {
            tracing::warn!(path = %path.display(), error = %err, "run log not written");
        }
    }

    let summary = RunSummary {
        tally,
        feed_skus: plan.feed.map.len(),
        feed_rows_skipped: plan.feed.skipped.len(),
        variants: plan.variants,
        cancelled,
        dry_run: options.dry_run,
        duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    };
    tracing::info!(
        updated = summary.tally.updated,
        skipped = summary.tally.skipped,
        failed = summary.tally.failed,
        pending = summary.tally.pending,
        cancelled,
        "sync finished"
    );

    Ok(RunReport {
        summary,
        location: plan.location,
        decisions: plan.decisions,
        attempts,
    })
}

fn apply_one(
    updater: &InventoryUpdater<'_>,
    decision: &SyncDecision,
    tally: &mut Tally,
) -> Option<RunLogEntry> {
    let sku = decision.sku.clone()?;
    let quantity = decision.target_quantity?;
    let current = decision
        .current_quantity
        .map_or_else(|| "?".to_string(), |q| q.to_string());

    let (result, message) = match updater.apply(decision)? {
        UpdateResult::Ok => {
            tally.updated += 1;
            tracing::info!("{sku} {current} → {quantity}");
            (UpdateOutcome::Ok, String::new())
        }
        UpdateResult::Failed { detail } => {
            tally.failed += 1;
            tracing::error!(
                sku = %sku,
                inventory_item_id = %decision.inventory_item_id,
                detail = %detail,
                "stock update failed"
            );
            (UpdateOutcome::Error, detail)
        }
    };

    Some(RunLogEntry {
        timestamp: Utc::now(),
        sku,
        inventory_item_id: decision.inventory_item_id,
        quantity,
        result,
        message,
    })
}
