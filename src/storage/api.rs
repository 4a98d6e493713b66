//! Client for the ratings API that receives daily reports.

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

use crate::config::ApiConfig;
use crate::retry::{retry, RetryConfig};
use crate::types::DailyReport;

/// Pushes reports with a static bearer token
pub struct ApiClient {
    client: Client,
    url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Build a client, or `None` when no endpoint is configured
    pub fn from_config(config: &ApiConfig) -> Result<Option<Self>> {
        let Some(url) = config.url.clone().filter(|u| !u.trim().is_empty()) else {
            return Ok(None);
        };

        if config.token.is_none() {
            tracing::warn!("API URL set without a token, pushing unauthenticated");
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Some(Self {
            client,
            url,
            token: config.token.clone(),
        }))
    }

    /// POST the report; returns the response body on a 2xx status
    pub async fn push(&self, report: &DailyReport) -> Result<String> {
        retry(&RetryConfig::network(), "API push", || self.push_once(report)).await
    }

    async fn push_once(&self, report: &DailyReport) -> Result<String> {
        let mut request = self.client.post(&self.url).json(report);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.context("Request failed")?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            anyhow::bail!("API error {}: {}", status, body.trim());
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_url_disables_push() {
        let config = ApiConfig::default();
        assert!(ApiClient::from_config(&config).unwrap().is_none());

        let blank = ApiConfig {
            url: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(ApiClient::from_config(&blank).unwrap().is_none());
    }

    #[test]
    fn test_client_keeps_token() {
        let config = ApiConfig {
            url: Some("https://example.com/api/ratings".to_string()),
            token: Some("secret".to_string()),
            timeout_secs: 5,
        };
        let client = ApiClient::from_config(&config).unwrap().unwrap();
        assert_eq!(client.url, "https://example.com/api/ratings");
        assert_eq!(client.token.as_deref(), Some("secret"));
    }
}
