//! One JSON file per broadcast date.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::types::DailyReport;

/// Directory of `YYYY-MM-DD.json` reports
pub struct ArtifactStore {
    base_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Path of the report for a date
    pub fn path_for(&self, report: &DailyReport) -> PathBuf {
        self.base_dir
            .join(format!("{}.json", report.date.format("%Y-%m-%d")))
    }

    /// Write a report, replacing any earlier one for the same date
    pub fn write(&self, report: &DailyReport) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.base_dir)
            .with_context(|| format!("Failed to create {}", self.base_dir.display()))?;

        let path = self.path_for(report);
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(report)?;

        // Write then rename so readers never see a half-written report
        std::fs::write(&tmp, content)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to move report into {}", path.display()))?;

        Ok(path)
    }

    /// Load a report written by [`ArtifactStore::write`]
    pub fn load(path: &Path) -> Result<DailyReport> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid report: {}", path.display()))
    }
}
