//! Report Snapshots
//!
//! Completed analysis runs are written as one JSON file each, named
//! `<timestamp>-<id>.json`. Saving prunes the directory down to the newest
//! `keep` reports, so history stays a bounded best-effort snapshot.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::OutputConfig;
use crate::types::{AnalysisReport, Result, SeoError, count_actions};

/// Listing entry for a stored report
#[derive(Debug, Clone)]
pub struct ReportSummary {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub path: PathBuf,
    pub url_count: usize,
    pub days: usize,
    pub actions: usize,
    pub failed_batches: usize,
}

impl ReportSummary {
    fn new(report: &AnalysisReport, path: PathBuf) -> Self {
        Self {
            id: report.id,
            created_at: report.created_at,
            path,
            url_count: report.urls.len(),
            days: report.action_plan.len(),
            actions: count_actions(&report.action_plan),
            failed_batches: report.failed_batches,
        }
    }
}

/// File-backed report history
#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: PathBuf,
    keep: usize,
    pretty: bool,
}

impl ReportStore {
    pub fn new(dir: impl Into<PathBuf>, keep: usize) -> Self {
        Self {
            dir: dir.into(),
            keep: keep.max(1),
            pretty: true,
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(&config.directory, config.keep_reports).with_pretty(config.pretty)
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn report_path(&self, report: &AnalysisReport) -> PathBuf {
        self.dir.join(format!(
            "{}-{}.json",
            report.created_at.format("%Y%m%dT%H%M%SZ"),
            report.id
        ))
    }

    /// Write the report, then prune older snapshots
    pub async fn save(&self, report: &AnalysisReport) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.report_path(report);
        let content = if self.pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        tokio::fs::write(&path, &content).await?;
        info!(
            "Saved report {} ({} bytes) to {}",
            report.id,
            content.len(),
            path.display()
        );

        match self.prune().await {
            Ok(0) => {}
            Ok(pruned) => debug!("Pruned {} old reports", pruned),
            Err(e) => warn!("Failed to prune reports in {}: {}", self.dir.display(), e),
        }
        Ok(path)
    }

    /// Load a report by full id or unique id prefix
    pub async fn load(&self, id: &str) -> Result<Option<AnalysisReport>> {
        let matches: Vec<ReportSummary> = self
            .list()
            .await?
            .into_iter()
            .filter(|s| s.id.to_string().starts_with(id))
            .collect();

        match matches.as_slice() {
            [] => Ok(None),
            [only] => Ok(Some(read_report(&only.path).await?)),
            _ => Err(SeoError::Config(format!(
                "Report id '{}' is ambiguous ({} matches)",
                id,
                matches.len()
            ))),
        }
    }

    /// Stored reports, newest first. Unreadable files are skipped.
    pub async fn list(&self) -> Result<Vec<ReportSummary>> {
        let mut summaries = Vec::new();

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(summaries),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            match read_report(&path).await {
                Ok(report) => summaries.push(ReportSummary::new(&report, path)),
                Err(e) => warn!("Skipping unreadable report {}: {}", path.display(), e),
            }
        }

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    /// Delete all but the newest `keep` reports, returning how many went
    pub async fn prune(&self) -> Result<usize> {
        let stale: Vec<PathBuf> = self
            .list()
            .await?
            .into_iter()
            .skip(self.keep)
            .map(|s| s.path)
            .collect();
        Ok(remove_stale(&stale).await)
    }
}

/// Remove each file; failures are logged and left in place
async fn remove_stale(paths: &[PathBuf]) -> usize {
    let mut removed = 0;
    for path in paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove old report {}: {}", path.display(), e),
        }
    }
    removed
}

async fn read_report(path: &Path) -> Result<AnalysisReport> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}
