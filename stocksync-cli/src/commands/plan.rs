//! `stocksync plan`: decisions for the next pass, no writes.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use stocksync_core::{SyncAction, SyncDecision, UreqTransport};
use stocksync_sync::pipeline;

use super::ConfigArgs;

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Include skipped variants, not only updates.
    #[arg(long)]
    pub all: bool,
}

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "sku")]
    sku: String,
    #[tabled(rename = "inventory item")]
    item: String,
    #[tabled(rename = "current")]
    current: String,
    #[tabled(rename = "feed")]
    target: String,
    #[tabled(rename = "action")]
    action: String,
}

impl From<&SyncDecision> for PlanRow {
    fn from(decision: &SyncDecision) -> Self {
        Self {
            sku: decision
                .sku
                .as_ref()
                .map_or_else(|| "-".to_string(), ToString::to_string),
            item: decision.inventory_item_id.to_string(),
            current: decision
                .current_quantity
                .map_or_else(|| "?".to_string(), |q| q.to_string()),
            target: decision
                .target_quantity
                .map_or_else(|| "-".to_string(), |q| q.to_string()),
            action: decision.action.to_string(),
        }
    }
}

impl PlanArgs {
    pub fn run(self) -> Result<ExitCode> {
        let config = self.config.load()?;
        let transport = UreqTransport::new();
        let plan = pipeline::plan(&config, &transport).context("plan aborted")?;

        if let Some(err) = &plan.feed_error {
            println!("{} {err}", "feed ignored:".yellow().bold());
        }

        let count = |action: SyncAction| plan.decisions.iter().filter(|d| d.action == action).count();
        println!(
            "location {} | {} feed SKUs | {} variants | {} update, {} unchanged, {} no match, {} no sku",
            plan.location,
            plan.feed.map.len(),
            plan.variants,
            count(SyncAction::Update),
            count(SyncAction::SkipUnchanged),
            count(SyncAction::SkipNoMatch),
            count(SyncAction::SkipNoSku),
        );

        let rows: Vec<PlanRow> = plan
            .decisions
            .iter()
            .filter(|d| self.all || d.action.is_update())
            .map(PlanRow::from)
            .collect();
        if rows.is_empty() {
            println!("Nothing to update.");
            return Ok(ExitCode::SUCCESS);
        }

        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(ExitCode::SUCCESS)
    }
}
