//! Category extraction over the shared ratings table.
//!
//! The charts page has a single table that is rewritten in place whenever
//! the category `<select>` changes, so there is no load event to wait for.
//! Each category goes through [`Phase`]: the table text is snapshotted,
//! the option is selected, the text is polled until it differs from the
//! snapshot (or the poll times out), and a settle delay lets trailing rows
//! render before the table is parsed.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Result;
use tokio::time::{sleep, Instant};

use super::browser::PageDriver;
use super::parsers::RatingsTableParser;
use crate::config::WaitConfig;
use crate::types::{Category, CategoryExtract};

/// How long to wait for the table to change after a UI action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
    pub settle_delay: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self::from(&WaitConfig::default())
    }
}

impl From<&WaitConfig> for RefreshPolicy {
    fn from(config: &WaitConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            poll_timeout: Duration::from_millis(config.poll_timeout_ms),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
        }
    }
}

/// Result of waiting for a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    Changed,
    TimedOut,
}

impl RefreshPolicy {
    /// Poll `selector`'s text until it differs from `snapshot`, then settle.
    ///
    /// A timeout is not an error: the caller reads whatever is rendered.
    pub async fn await_change<P: PageDriver>(
        &self,
        page: &P,
        selector: &str,
        snapshot: &str,
    ) -> Refresh {
        let deadline = Instant::now() + self.poll_timeout;

        let outcome = loop {
            match page.text_content(selector).await {
                Ok(text) if text.as_deref().unwrap_or_default() != snapshot => {
                    break Refresh::Changed;
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("Polling {} failed: {}", selector, e),
            }

            if Instant::now() >= deadline {
                break Refresh::TimedOut;
            }
            sleep(self.poll_interval).await;
        };

        sleep(self.settle_delay).await;
        outcome
    }
}

/// Per-category state while driving the table
#[derive(Debug)]
enum Phase {
    Idle,
    Selecting { snapshot: String },
    AwaitingRefresh { snapshot: String },
    Parsed(CategoryExtract),
}

/// Drives the category selector and parses each resulting table
pub struct CategoryExtractor<'a, P> {
    page: &'a P,
    category_selector: &'a str,
    table_selector: &'a str,
    policy: RefreshPolicy,
}

impl<'a, P: PageDriver> CategoryExtractor<'a, P> {
    pub fn new(
        page: &'a P,
        category_selector: &'a str,
        table_selector: &'a str,
        policy: RefreshPolicy,
    ) -> Self {
        Self {
            page,
            category_selector,
            table_selector,
            policy,
        }
    }

    /// Extract every category in order.
    ///
    /// A category that fails is recorded as an empty extract.
    pub async fn extract_all(&self, categories: &[Category]) -> BTreeMap<Category, CategoryExtract> {
        let mut extracts = BTreeMap::new();

        for &category in categories {
            tracing::info!("Selecting category: {}", category);
            let extract = match self.extract(category).await {
                Ok(extract) => extract,
                Err(e) => {
                    tracing::warn!("Category {} unavailable: {:#}", category, e);
                    CategoryExtract::new()
                }
            };

            if extract.is_empty() {
                tracing::warn!("No programs found in {}", category);
            } else {
                tracing::info!("Found {} programs in {}", extract.len(), category);
            }
            extracts.insert(category, extract);
        }

        extracts
    }

    /// Run one category through Idle → Selecting → AwaitingRefresh → Parsed
    pub async fn extract(&self, category: Category) -> Result<CategoryExtract> {
        let mut phase = Phase::Idle;

        loop {
            phase = match phase {
                Phase::Idle => Phase::Selecting {
                    snapshot: self.table_text().await,
                },
                Phase::Selecting { snapshot } => {
                    let current = self.page.value(self.category_selector).await.ok().flatten();
                    self.page
                        .select_option(self.category_selector, category.select_value())
                        .await?;

                    if current.as_deref() == Some(category.select_value()) {
                        // Already showing this category; nothing will change
                        sleep(self.policy.settle_delay).await;
                        Phase::Parsed(self.read_table().await?)
                    } else {
                        Phase::AwaitingRefresh { snapshot }
                    }
                }
                Phase::AwaitingRefresh { snapshot } => {
                    let refresh = self
                        .policy
                        .await_change(self.page, self.table_selector, &snapshot)
                        .await;
                    if refresh == Refresh::TimedOut {
                        tracing::warn!(
                            "Table did not change after selecting {} within {:?}, reading it anyway",
                            category,
                            self.policy.poll_timeout
                        );
                    }
                    Phase::Parsed(self.read_table().await?)
                }
                Phase::Parsed(extract) if extract.is_empty() => {
                    // Rows may still be rendering; give it one more settle period
                    tracing::debug!("Empty table for {}, re-reading once", category);
                    sleep(self.policy.settle_delay).await;
                    return self.read_table().await;
                }
                Phase::Parsed(extract) => return Ok(extract),
            };
        }
    }

    async fn table_text(&self) -> String {
        self.page
            .text_content(self.table_selector)
            .await
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    async fn read_table(&self) -> Result<CategoryExtract> {
        let html = self.page.outer_html(self.table_selector).await?;
        Ok(html
            .map(|html| RatingsTableParser::parse(&html))
            .unwrap_or_default())
    }
}
