//! TİAK ratings scraper
//!
//! Scrapes the daily TV ratings tables for every audience category, merges
//! them per program and publishes one JSON report per date.

mod cli;
mod config;
mod merge;
mod pipeline;
mod retry;
mod schedule;
mod scraper;
mod storage;
mod types;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tiak_scraper=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            dates,
            days,
            no_push,
            output_dir,
            headful,
        } => cli::run_scrape(dates, days, no_push, output_dir, headful).await,
        Commands::Parse { input, format } => cli::run_parse(input, format),
        Commands::Show { input, by, top } => cli::run_show(input, by, top),
        Commands::Push { input } => cli::run_push(input).await,
    };

    if let Err(e) = &result {
        tracing::error!("{:#}", e);
    }
    result
}
