//! CLI commands for tiak-scraper.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::pipeline::Pipeline;
use crate::schedule::{plan_targets, source_today};
use crate::scraper::parsers::RatingsTableParser;
use crate::storage::{ApiClient, ArtifactStore, ReportSink};
use crate::types::{Category, CategoryExtract, DailyReport};

#[derive(Parser)]
#[command(name = "tiak-scraper")]
#[command(version, about = "Daily TİAK ratings scraper", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scrape the due dates (yesterday; Fri-Sun on Mondays; nothing on weekends)
    Run {
        /// Scrape this date instead (YYYY-MM-DD, repeatable)
        #[arg(short, long = "date", value_name = "DATE")]
        dates: Vec<NaiveDate>,

        /// Scrape the last N days ending yesterday
        #[arg(long, conflicts_with = "dates")]
        days: Option<usize>,

        /// Keep reports local, do not push to the API
        #[arg(long)]
        no_push: bool,

        /// Output directory override
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Show the browser window
        #[arg(long)]
        headful: bool,
    },

    /// Parse saved table markup and print the extract
    Parse {
        /// HTML file containing the ratings table
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output format (json, table)
        #[arg(short, long, default_value = "json")]
        format: String,
    },

    /// Print a saved report ranked by one category
    Show {
        /// Report JSON file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Category to rank by (total, ab, abc1)
        #[arg(short, long, default_value = "total")]
        by: Category,

        /// Number of programs to show
        #[arg(short, long, default_value_t = 10)]
        top: usize,
    },

    /// Send a saved report to the API
    Push {
        /// Report JSON file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

/// Scrape the planned dates and publish each report.
pub async fn run_scrape(
    dates: Vec<NaiveDate>,
    days: Option<usize>,
    no_push: bool,
    output_dir: Option<PathBuf>,
    headful: bool,
) -> anyhow::Result<()> {
    let mut config = AppConfig::load()?;

    if let Some(dir) = output_dir {
        config.output.dir = dir;
    }
    if headful {
        config.browser.headless = false;
    }

    tracing::info!("{}", "=".repeat(60));
    tracing::info!("TİAK Scraper Started");
    tracing::info!("{}", "=".repeat(60));

    let today = source_today(config.source.utc_offset_hours)?;
    let targets = plan_targets(today, &dates, days)?;

    if targets.is_empty() {
        tracing::info!("{} is a weekend day, nothing is published. Skipping.", today);
        return Ok(());
    }
    tracing::info!(
        "Target dates: {}",
        targets
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let api = if no_push {
        None
    } else {
        ApiClient::from_config(&config.api)?
    };
    let sink = ReportSink::new(ArtifactStore::new(config.output.dir.clone()), api);

    let pipeline = Pipeline::new(&config);
    let summary = pipeline.run(&targets, &sink).await?.into_result()?;

    tracing::info!(
        "Completed: {} of {} date(s) saved",
        summary.published.len(),
        summary.targets
    );
    Ok(())
}

/// Parse an HTML file with the ratings table parser.
pub fn run_parse(input: PathBuf, format: String) -> anyhow::Result<()> {
    let html = std::fs::read_to_string(&input)?;
    let extract = RatingsTableParser::parse(&html);

    eprintln!("Parsed {} programs from {}", extract.len(), input.display());

    match format.as_str() {
        "table" => print_extract(&extract),
        "json" => println!("{}", serde_json::to_string_pretty(&extract)?),
        _ => {
            eprintln!("Unknown format: {}. Using JSON.", format);
            println!("{}", serde_json::to_string_pretty(&extract)?);
        }
    }

    Ok(())
}

/// Print a saved report ranked by a category.
pub fn run_show(input: PathBuf, by: Category, top: usize) -> anyhow::Result<()> {
    let report = ArtifactStore::load(&input)?;
    print_report(&report, by, top);
    Ok(())
}

/// Push a saved report to the configured API.
pub async fn run_push(input: PathBuf) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let report = ArtifactStore::load(&input)?;

    let Some(api) = ApiClient::from_config(&config.api)? else {
        anyhow::bail!("No API URL configured (set API_URL or api.url)");
    };

    tracing::info!("Sending {} ({} programs) to API...", report.date, report.programs.len());
    let body = api.push(&report).await?;
    tracing::info!("Success: {}", body.trim());

    Ok(())
}

fn fmt_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn fmt_measure(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
}

fn print_extract(extract: &CategoryExtract) {
    let mut rows: Vec<_> = extract.iter().collect();
    rows.sort_by_key(|(_, r)| r.rank.unwrap_or(u32::MAX));

    for (name, r) in rows {
        println!(
            "  {:>4}  {:<40} {:<12} {}-{}  {:>6} {:>6}",
            fmt_opt(r.rank),
            name,
            r.channel,
            r.start_time,
            r.end_time,
            fmt_measure(r.rating),
            fmt_measure(r.share)
        );
    }
}

fn print_report(report: &DailyReport, by: Category, top: usize) {
    println!("Date: {}  ({} programs, ranked by {})", report.date, report.programs.len(), by);
    println!();
    println!(
        "  {:>4}  {:<40} {:<12} {:>13} {:>13} {:>13}",
        "#", "Program", "Channel", "Total", "AB", "ABC1"
    );

    for program in report.ranked_by(by).into_iter().take(top) {
        let cells: Vec<String> = Category::ALL
            .iter()
            .map(|&c| {
                let m = program.measurement(c);
                format!("{}/{}", fmt_measure(m.rating), fmt_measure(m.share))
            })
            .collect();
        println!(
            "  {:>4}  {:<40} {:<12} {:>13} {:>13} {:>13}",
            fmt_opt(program.measurement(by).rank),
            program.name,
            program.channel,
            cells[0],
            cells[1],
            cells[2]
        );
    }
}
