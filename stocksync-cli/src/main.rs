//! stocksync: push supplier feed quantities to a storefront's inventory.
//!
//! # Usage
//!
//! ```text
//! stocksync run [--config <file>] [--dry-run] [--strict] [--json]
//! stocksync plan [--config <file>] [--all]
//! stocksync locations [--config <file>]
//! stocksync watch [--config <file>] [--interval-minutes <n>]
//! stocksync log [--config <file>] [--path <file>] [--lines <n>]
//! ```
//!
//! Exit codes: 0 ok, 1 fatal error, 2 update failures under `--strict`,
//! 3 cancelled.

mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;

use commands::{
    locations::LocationsArgs, log::LogArgs, plan::PlanArgs, run::RunArgs, watch::WatchArgs,
};
use stocksync_daemon::{init_tracing, LogFormat};

#[derive(Parser, Debug)]
#[command(
    name = "stocksync",
    version,
    about = "Sync supplier stock levels into storefront inventory",
    long_about = None,
)]
struct Cli {
    /// Emit log lines as JSON objects on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one sync pass.
    Run(RunArgs),

    /// Show what a pass would change, without writing.
    Plan(PlanArgs),

    /// List storefront locations and the one stock is written to.
    Locations(LocationsArgs),

    /// Run a pass at a fixed interval until Ctrl-C.
    Watch(WatchArgs),

    /// Print the most recent run log entries.
    Log(LogArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    });

    let result = match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Plan(args) => args.run(),
        Commands::Locations(args) => args.run(),
        Commands::Watch(args) => args.run(),
        Commands::Log(args) => args.run(),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err:#}", "✗ error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
