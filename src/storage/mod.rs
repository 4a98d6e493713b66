//! Output sinks for daily reports.
//!
//! The JSON artifact on disk is authoritative; the API push is best effort.

pub mod api;
pub mod artifact;

pub use api::ApiClient;
pub use artifact::ArtifactStore;

use std::path::PathBuf;

use crate::types::DailyReport;

/// Writes each report locally and forwards it to the API when configured
pub struct ReportSink {
    store: ArtifactStore,
    api: Option<ApiClient>,
}

impl ReportSink {
    pub fn new(store: ArtifactStore, api: Option<ApiClient>) -> Self {
        Self { store, api }
    }

    /// Persist and push one report.
    ///
    /// Only a failed local write is an error; push failures are logged.
    pub async fn publish(&self, report: &DailyReport) -> anyhow::Result<PathBuf> {
        let path = self.store.write(report)?;
        tracing::info!("Saved {} programs to {}", report.programs.len(), path.display());

        match &self.api {
            Some(api) => match api.push(report).await {
                Ok(body) => tracing::info!("API accepted {}: {}", report.date, body.trim()),
                Err(e) => tracing::error!("Failed to send {} to API: {:#}", report.date, e),
            },
            None => tracing::info!("No API configured, skipping push"),
        }

        Ok(path)
    }
}
