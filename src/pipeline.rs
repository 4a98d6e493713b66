//! Per-date scraping pipeline and run sequencing.

use std::future::Future;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tokio::time::sleep;

use crate::config::AppConfig;
use crate::merge::merge_extracts;
use crate::retry::{retry, RetryConfig};
use crate::scraper::browser::{Browser, PageDriver};
use crate::scraper::extractor::{CategoryExtractor, Refresh, RefreshPolicy};
use crate::scraper::pacing::Pacer;
use crate::scraper::parsers::{format_for_input, parse_displayed_date};
use crate::storage::ReportSink;
use crate::types::{Category, DailyReport};

/// What happened to one target date
#[derive(Debug, Clone, PartialEq)]
pub enum DateOutcome {
    Report(DailyReport),
    /// The site has no programs for the date yet
    NoData,
    /// The page showed a different date than requested
    DateMismatch { displayed: Option<NaiveDate> },
}

/// Drives the charts page for one date at a time
pub struct Pipeline<'a> {
    config: &'a AppConfig,
    policy: RefreshPolicy,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self {
            config,
            policy: RefreshPolicy::from(&config.wait),
        }
    }

    /// Scrape one date on a page already showing the charts view
    pub async fn process_date<P: PageDriver>(&self, page: &P, date: NaiveDate) -> Result<DateOutcome> {
        let source = &self.config.source;

        tracing::info!("Opening daily tables...");
        page.click(&source.daily_tables_selector)
            .await
            .context("Daily tables control missing")?;
        sleep(self.config.wait.page_ready_delay()).await;

        let input = format_for_input(date);
        tracing::info!("Entering date {}", input);
        let snapshot = page
            .text_content(&source.table_selector)
            .await
            .ok()
            .flatten()
            .unwrap_or_default();
        page.fill(&source.date_input_selector, &input)
            .await
            .context("Date field missing")?;
        if let Some(submit) = &source.date_submit_selector {
            page.click(submit).await.context("Date submit control missing")?;
        }
        if self
            .policy
            .await_change(page, &source.table_selector, &snapshot)
            .await
            == Refresh::TimedOut
        {
            tracing::debug!("Table unchanged after entering {}", input);
        }

        if source.verify_date {
            let shown = page
                .value(&source.displayed_date_selector)
                .await
                .context("Displayed date unreadable")?;
            let displayed = shown.as_deref().and_then(parse_displayed_date);
            if displayed != Some(date) {
                tracing::warn!(
                    "Requested {} but page shows {:?}, abandoning date",
                    date,
                    shown.as_deref().unwrap_or("nothing")
                );
                return Ok(DateOutcome::DateMismatch { displayed });
            }
        }

        let extractor = CategoryExtractor::new(
            page,
            &source.category_selector,
            &source.table_selector,
            self.policy,
        );
        let extracts = extractor.extract_all(&Category::ALL).await;

        let programs = merge_extracts(&extracts);
        if programs.is_empty() {
            return Ok(DateOutcome::NoData);
        }

        let counts: Vec<String> = extracts
            .iter()
            .map(|(category, extract)| format!("{}: {}", category.key(), extract.len()))
            .collect();
        tracing::info!(
            "Merged {} programs for {} ({})",
            programs.len(),
            date,
            counts.join(", ")
        );

        Ok(DateOutcome::Report(DailyReport { date, programs }))
    }

    /// Launch a browser for `date`, scrape it and always close the session
    pub async fn scrape_in_browser(&self, date: NaiveDate) -> Result<DateOutcome> {
        tracing::info!("Starting browser scraping for {}", date);
        let browser = Browser::launch(&self.config.browser).await?;

        let result = async {
            let url = self.config.source.charts_url.as_str();
            tracing::info!("Opening charts page {}", url);
            let page = retry(&RetryConfig::browser(), "Open charts page", || browser.open(url)).await?;
            sleep(self.config.wait.page_ready_delay()).await;
            self.process_date(&page, date).await
        }
        .await;

        browser.close().await?;
        result
    }

    /// Process every target date in order, publishing each report
    pub async fn run(&self, dates: &[NaiveDate], sink: &ReportSink) -> Result<RunSummary> {
        self.run_with(dates, sink, |date| self.scrape_in_browser(date))
            .await
    }

    /// Sequence `dates` through `scrape`, pacing sessions and publishing reports.
    ///
    /// In batch mode a failed date (scrape or local write) is recorded and the
    /// run moves on; with a single date the error is returned.
    pub async fn run_with<F, Fut>(
        &self,
        dates: &[NaiveDate],
        sink: &ReportSink,
        mut scrape: F,
    ) -> Result<RunSummary>
    where
        F: FnMut(NaiveDate) -> Fut,
        Fut: Future<Output = Result<DateOutcome>>,
    {
        let mut summary = RunSummary::new(dates.len());
        let mut pacer = Pacer::new(self.config.run.inter_date_delay());

        for &date in dates {
            pacer.wait().await;

            let result = match scrape(date).await {
                Ok(DateOutcome::Report(report)) => sink
                    .publish(&report)
                    .await
                    .map(|_| DateOutcome::Report(report)),
                other => other,
            };

            match result {
                Ok(DateOutcome::Report(_)) => summary.published.push(date),
                Ok(DateOutcome::NoData) => {
                    tracing::info!("No data found for {}", date);
                    summary.no_data.push(date);
                }
                Ok(DateOutcome::DateMismatch { displayed }) => {
                    tracing::warn!("Skipped {}: page showed {:?}", date, displayed);
                    summary.mismatched.push(date);
                }
                Err(e) if summary.is_batch() => {
                    tracing::error!("Date {} failed: {:#}", date, e);
                    summary.failed.push(date);
                }
                Err(e) => return Err(e.context(format!("Date {} failed", date))),
            }
        }

        Ok(summary)
    }
}

/// Per-date results of one run
#[derive(Debug, Default, PartialEq)]
pub struct RunSummary {
    pub targets: usize,
    pub published: Vec<NaiveDate>,
    pub no_data: Vec<NaiveDate>,
    pub mismatched: Vec<NaiveDate>,
    pub failed: Vec<NaiveDate>,
}

impl RunSummary {
    pub fn new(targets: usize) -> Self {
        Self {
            targets,
            ..Default::default()
        }
    }

    /// More than one date: failures are skipped instead of aborting
    pub fn is_batch(&self) -> bool {
        self.targets > 1
    }

    /// Succeeds when nothing failed hard and, if dates were due, at least
    /// one report was saved
    pub fn into_result(self) -> Result<Self> {
        if !self.failed.is_empty() {
            anyhow::bail!(
                "{} of {} target date(s) failed: {}",
                self.failed.len(),
                self.targets,
                self.failed
                    .iter()
                    .map(|d| d.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        if self.targets > 0 && self.published.is_empty() {
            anyhow::bail!(
                "No usable data for {} target date(s) (no data: {}, date mismatch: {})",
                self.targets,
                self.no_data.len(),
                self.mismatched.len()
            );
        }
        Ok(self)
    }
}
