//! Configuration for the TİAK scraper.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Charts page location and the controls driven on it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_charts_url")]
    pub charts_url: String,
    /// Control that switches the page to the daily tables
    #[serde(default = "default_daily_tables_selector")]
    pub daily_tables_selector: String,
    /// Text field taking the date as DD.MM.YYYY
    #[serde(default = "default_date_input_selector")]
    pub date_input_selector: String,
    /// Rendered element stating the date of the table on screen.
    ///
    /// Must not be the date input: that only echoes what was typed.
    #[serde(default = "default_displayed_date_selector")]
    pub displayed_date_selector: String,
    /// Button to press after entering a date, if the field does not submit on change
    #[serde(default)]
    pub date_submit_selector: Option<String>,
    /// Category `<select>`
    #[serde(default = "default_category_selector")]
    pub category_selector: String,
    /// Container of the ratings table
    #[serde(default = "default_table_selector")]
    pub table_selector: String,
    /// Offset of the source's local time from UTC (Turkey is fixed at +3)
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
    /// Abandon a date when the page shows a different one
    #[serde(default = "default_verify_date")]
    pub verify_date: bool,
}

fn default_charts_url() -> String {
    "https://tiak.com.tr/en/charts".to_string()
}

fn default_daily_tables_selector() -> String {
    "#daily-tables".to_string()
}

fn default_date_input_selector() -> String {
    "#tarih".to_string()
}

fn default_displayed_date_selector() -> String {
    "#tablo caption".to_string()
}

fn default_category_selector() -> String {
    "#kisi".to_string()
}

fn default_table_selector() -> String {
    "#tablo".to_string()
}

fn default_utc_offset_hours() -> i32 {
    3
}

fn default_verify_date() -> bool {
    true
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            charts_url: default_charts_url(),
            daily_tables_selector: default_daily_tables_selector(),
            date_input_selector: default_date_input_selector(),
            displayed_date_selector: default_displayed_date_selector(),
            date_submit_selector: None,
            category_selector: default_category_selector(),
            table_selector: default_table_selector(),
            utc_offset_hours: default_utc_offset_hours(),
            verify_date: default_verify_date(),
        }
    }
}

/// Timings for waiting on the in-place table refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Pause after the page loads and after opening the daily tables
    #[serde(default = "default_page_ready_delay_ms")]
    pub page_ready_delay_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_poll_timeout_ms() -> u64 {
    10_000
}

fn default_settle_delay_ms() -> u64 {
    1_500
}

fn default_page_ready_delay_ms() -> u64 {
    2_000
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            poll_timeout_ms: default_poll_timeout_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            page_ready_delay_ms: default_page_ready_delay_ms(),
        }
    }
}

impl WaitConfig {
    pub fn page_ready_delay(&self) -> Duration {
        Duration::from_millis(self.page_ready_delay_ms)
    }
}

/// Headless Chrome settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_headless")]
    pub headless: bool,
    /// Chrome executable; platform default when unset
    #[serde(default)]
    pub chrome_path: Option<String>,
}

fn default_headless() -> bool {
    true
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            chrome_path: None,
        }
    }
}

/// Outbound API sink
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Push endpoint; pushing is skipped when unset
    #[serde(default)]
    pub url: Option<String>,
    /// Bearer token
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_api_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            timeout_secs: default_api_timeout_secs(),
        }
    }
}

/// Local artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

/// Run sequencing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Pause between consecutive target dates
    #[serde(default = "default_inter_date_delay_ms")]
    pub inter_date_delay_ms: u64,
}

fn default_inter_date_delay_ms() -> u64 {
    5_000
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            inter_date_delay_ms: default_inter_date_delay_ms(),
        }
    }
}

impl RunConfig {
    pub fn inter_date_delay(&self) -> Duration {
        Duration::from_millis(self.inter_date_delay_ms)
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub wait: WaitConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub run: RunConfig,
}

impl AppConfig {
    /// Load configuration from defaults, config file and environment
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Add config file if exists
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables (TIAK_WAIT__SETTLE_DELAY_MS, etc.)
            .add_source(
                config::Environment::with_prefix("TIAK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            // Unprefixed variables used by the deployment workflow
            .set_override_option("api.url", std::env::var("API_URL").ok())?
            .set_override_option("api.token", std::env::var("API_TOKEN").ok())?
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.wait.poll_interval_ms == 0 {
            anyhow::bail!("wait.poll_interval_ms must be greater than 0");
        }
        if !(-12..=14).contains(&self.source.utc_offset_hours) {
            anyhow::bail!(
                "source.utc_offset_hours out of range: {}",
                self.source.utc_offset_hours
            );
        }
        if self.source.verify_date
            && self.source.displayed_date_selector.trim() == self.source.date_input_selector.trim()
        {
            anyhow::bail!(
                "source.displayed_date_selector must differ from the date input ({}), \
                 otherwise the date check only reads back the typed value",
                self.source.date_input_selector
            );
        }
        Ok(())
    }
}
