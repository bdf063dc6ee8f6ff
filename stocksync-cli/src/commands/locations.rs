//! `stocksync locations`: storefront locations and the resolved target.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use stocksync_core::{LocationTarget, UreqTransport};
use stocksync_shop::{list_locations, location::select_location, ShopClient};

use super::ConfigArgs;

#[derive(Args, Debug)]
pub struct LocationsArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Tabled)]
struct LocationRow {
    #[tabled(rename = "")]
    marker: String,
    #[tabled(rename = "id")]
    id: u64,
    #[tabled(rename = "name")]
    name: String,
}

impl LocationsArgs {
    pub fn run(self) -> Result<ExitCode> {
        let config = self.config.load()?;
        let transport = UreqTransport::new();
        let client = ShopClient::new(&transport, &config.shop);
        let locations = list_locations(&client).context("failed to list locations")?;

        let target = match &config.location {
            LocationTarget::Id(id) => Some(*id),
            LocationTarget::Name(name) => select_location(&locations, name),
        };

        println!("target: {}", config.location);
        if locations.is_empty() {
            println!("No locations returned.");
            return Ok(ExitCode::SUCCESS);
        }

        let rows: Vec<LocationRow> = locations
            .into_iter()
            .map(|loc| LocationRow {
                marker: if target.is_some_and(|t| t.0 == loc.id) {
                    "■".green().bold().to_string()
                } else {
                    String::new()
                },
                id: loc.id,
                name: loc.name,
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");

        if target.is_none() {
            println!("{}", "No location matches the configured name.".yellow());
        }
        Ok(ExitCode::SUCCESS)
    }
}
