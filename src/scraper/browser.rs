//! Browser automation using chromiumoxide.

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser as ChromeBrowser, BrowserConfig as ChromeConfig};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::page::Page;
use futures::StreamExt;

use crate::config::BrowserConfig;

/// What the pipeline needs from a rendered page.
///
/// Every selector is a CSS selector. Reads return `None` when nothing matches.
pub trait PageDriver {
    async fn click(&self, selector: &str) -> Result<()>;

    /// Set a text field's value and fire its input/change events
    async fn fill(&self, selector: &str, value: &str) -> Result<()>;

    /// Choose an option of a `<select>` and fire its change event
    async fn select_option(&self, selector: &str, value: &str) -> Result<()>;

    async fn outer_html(&self, selector: &str) -> Result<Option<String>>;

    async fn text_content(&self, selector: &str) -> Result<Option<String>>;

    /// Form value of an input/select, falling back to its text
    async fn value(&self, selector: &str) -> Result<Option<String>>;
}

/// Headless Chrome session; one per target date
pub struct Browser {
    browser: ChromeBrowser,
    handle: tokio::task::JoinHandle<()>,
}

impl Browser {
    /// Launch a new browser instance
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let chrome_path = match &config.chrome_path {
            Some(path) => path.as_str(),
            None if cfg!(target_os = "macos") => {
                "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"
            }
            None if cfg!(target_os = "windows") => {
                "C:\\Program Files\\Google\\Chrome\\Application\\chrome.exe"
            }
            None => "google-chrome",
        };

        let mut builder = ChromeConfig::builder()
            .chrome_executable(chrome_path)
            .no_sandbox()
            .disable_default_args()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--mute-audio")
            .window_size(1920, 1080);
        if config.headless {
            builder = builder.arg("--headless=new");
        } else {
            builder = builder.with_head();
        }
        let chrome_config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;

        let (browser, mut handler) = ChromeBrowser::launch(chrome_config)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to launch browser: {}", e))?;

        // Spawn handler task - must keep running for browser to work
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("CDP handler error: {}", e);
                }
            }
        });

        Ok(Self { browser, handle })
    }

    /// Open `url` in a new tab and wait for navigation to finish
    pub async fn open(&self, url: &str) -> Result<ChromePage> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to open {}: {}", url, e))?;

        page.wait_for_navigation()
            .await
            .map_err(|e| anyhow::anyhow!("Navigation to {} did not finish: {}", url, e))?;

        Ok(ChromePage { page })
    }

    /// Close the browser
    pub async fn close(mut self) -> Result<()> {
        if let Err(e) = self.browser.close().await {
            tracing::debug!("Browser close: {}", e);
        }
        let _ = self.browser.wait().await;
        self.handle.abort();
        Ok(())
    }
}

/// A tab driven through JavaScript evaluation
pub struct ChromePage {
    page: Page,
}

impl ChromePage {
    /// Evaluate `script` and decode its JSON string result
    async fn eval_json<T: serde::de::DeserializeOwned>(&self, script: String) -> Result<T> {
        let mut params = EvaluateParams::new(script);
        params.return_by_value = Some(true);

        // CDP drops `null` results, so scripts always return JSON text
        let json: String = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(|e| anyhow::anyhow!("Script evaluation failed: {}", e))?
            .into_value()
            .context("Script returned no value")?;

        serde_json::from_str(&json).context("Unexpected script result")
    }

    /// Run `body` with `el` bound to the first element matching `selector`
    async fn with_element<T: serde::de::DeserializeOwned>(
        &self,
        selector: &str,
        body: &str,
    ) -> Result<T> {
        let selector_js = serde_json::to_string(selector)?;
        self.eval_json(format!(
            "JSON.stringify((() => {{ const el = document.querySelector({}); {} }})())",
            selector_js, body
        ))
        .await
    }

    async fn expect_element(&self, selector: &str, body: &str) -> Result<()> {
        let found: bool = self
            .with_element(selector, &format!("if (!el) return false; {} return true;", body))
            .await?;
        if !found {
            anyhow::bail!("Element not found: {}", selector);
        }
        Ok(())
    }
}

impl PageDriver for ChromePage {
    async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|e| anyhow::anyhow!("Element not found: {}: {}", selector, e))?;
        element
            .click()
            .await
            .map_err(|e| anyhow::anyhow!("Click on {} failed: {}", selector, e))?;
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        let value_js = serde_json::to_string(value)?;
        self.expect_element(
            selector,
            &format!(
                "el.value = {}; \
                 el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
                 el.dispatchEvent(new Event('change', {{ bubbles: true }}));",
                value_js
            ),
        )
        .await
    }

    async fn select_option(&self, selector: &str, value: &str) -> Result<()> {
        let value_js = serde_json::to_string(value)?;
        self.expect_element(
            selector,
            &format!(
                "el.value = {}; el.dispatchEvent(new Event('change', {{ bubbles: true }}));",
                value_js
            ),
        )
        .await
    }

    async fn outer_html(&self, selector: &str) -> Result<Option<String>> {
        self.with_element(selector, "return el ? el.outerHTML : null;")
            .await
    }

    async fn text_content(&self, selector: &str) -> Result<Option<String>> {
        self.with_element(selector, "return el ? el.textContent : null;")
            .await
    }

    async fn value(&self, selector: &str) -> Result<Option<String>> {
        self.with_element(
            selector,
            "if (!el) return null; return ('value' in el && el.value) ? el.value : el.textContent;",
        )
        .await
    }
}
