//! Append-only activity log of pulls, persisted as a JSON array.
//!
//! The file keeps at most `max_entries` records; the oldest are dropped first.
//! Queries return newest first. A corrupt or unreadable file reads as empty so
//! a damaged log never blocks a pull.

use crate::core::error::Result;
use crate::core::pull::{BulkPullReport, PullOutcome};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const ACTIVITY_FILE: &str = "activity_log.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Success,
    Error,
    /// Partially successful bulk operation
    Warning,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Success => "success",
            EntryStatus::Error => "error",
            EntryStatus::Warning => "warning",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntryStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "success" => Ok(EntryStatus::Success),
            "error" => Ok(EntryStatus::Error),
            "warning" => Ok(EntryStatus::Warning),
            other => Err(format!(
                "unknown status '{other}', expected success, error or warning"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: DateTime<Utc>,
    /// `pull`, `pull_all`, `pull_selected` or `pull_group`
    pub operation: String,
    pub repo: String,
    pub status: EntryStatus,
    pub message: Option<String>,
    #[serde(default)]
    pub details: Value,
}

impl ActivityEntry {
    pub fn new(
        operation: impl Into<String>,
        repo: impl Into<String>,
        status: EntryStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: operation.into(),
            repo: repo.into(),
            status,
            message: Some(message.into()),
            details: Value::Object(Default::default()),
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// One summary entry for a bulk pull; `scope` names what was pulled (`all`, a group)
    pub fn bulk(operation: &str, scope: &str, report: &BulkPullReport) -> Self {
        let status = if report.failed == 0 {
            EntryStatus::Success
        } else if report.succeeded == 0 {
            EntryStatus::Error
        } else {
            EntryStatus::Warning
        };
        let failed: Vec<&str> = report
            .results
            .iter()
            .filter(|o| !o.success)
            .map(|o| o.name.as_str())
            .collect();
        Self::new(operation, scope, status, report.summary()).with_details(json!({
            "total": report.total,
            "succeeded": report.succeeded,
            "failed": report.failed,
            "failed_repos": failed,
        }))
    }
}

impl From<&PullOutcome> for ActivityEntry {
    fn from(outcome: &PullOutcome) -> Self {
        let status = if outcome.success {
            EntryStatus::Success
        } else {
            EntryStatus::Error
        };
        Self {
            timestamp: outcome.timestamp,
            operation: "pull".to_string(),
            repo: outcome.name.clone(),
            status,
            message: Some(outcome.message.clone()),
            details: json!({
                "strategy": outcome.strategy,
                "error": outcome.error,
                "updates": outcome.updates,
                "branch": outcome.branch,
            }),
        }
    }
}

/// Filters for [`ActivityLog::get_logs`]
#[derive(Debug, Clone)]
pub struct LogQuery {
    pub limit: usize,
    pub repo: Option<String>,
    pub operation: Option<String>,
    pub status: Option<EntryStatus>,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            limit: 100,
            repo: None,
            operation: None,
            status: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityStats {
    pub total_operations: usize,
    pub successful: usize,
    pub failed: usize,
    pub warnings: usize,
    pub success_rate: f64,
    pub operation_counts: BTreeMap<String, usize>,
    pub repo_counts: BTreeMap<String, usize>,
    pub last_activity: Option<DateTime<Utc>>,
}

pub struct ActivityLog {
    file: PathBuf,
    max_entries: usize,
    // serializes read-modify-write of the file within this process
    lock: Mutex<()>,
}

impl ActivityLog {
    pub fn open(file: impl Into<PathBuf>, max_entries: usize) -> Result<Self> {
        let file = file.into();
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if !file.exists() {
            std::fs::write(&file, "[]")?;
        }
        Ok(Self {
            file,
            max_entries: max_entries.max(1),
            lock: Mutex::new(()),
        })
    }

    /// The log inside `data_dir`
    pub fn in_directory(data_dir: &Path, max_entries: usize) -> Result<Self> {
        Self::open(data_dir.join(ACTIVITY_FILE), max_entries)
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    fn load(&self) -> Vec<ActivityEntry> {
        let content = match std::fs::read_to_string(&self.file) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Cannot read activity log {}: {e}", self.file.display());
                return Vec::new();
            }
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("Ignoring corrupt activity log {}: {e}", self.file.display());
            Vec::new()
        })
    }

    pub fn append(&self, entry: ActivityEntry) -> Result<()> {
        self.append_all(std::iter::once(entry))
    }

    pub fn append_all(&self, entries: impl IntoIterator<Item = ActivityEntry>) -> Result<()> {
        let _guard = self.lock.lock();
        let mut logs = self.load();
        logs.extend(entries);
        if logs.len() > self.max_entries {
            let excess = logs.len() - self.max_entries;
            logs.drain(..excess);
        }
        std::fs::write(&self.file, serde_json::to_string_pretty(&logs)?)?;
        Ok(())
    }

    /// Record one pull
    pub fn record_pull(&self, outcome: &PullOutcome) -> Result<()> {
        self.append(ActivityEntry::from(outcome))
    }

    /// Record every outcome of a bulk pull plus one summary entry
    pub fn record_bulk(&self, operation: &str, scope: &str, report: &BulkPullReport) -> Result<()> {
        let entries = report
            .results
            .iter()
            .map(ActivityEntry::from)
            .chain(std::iter::once(ActivityEntry::bulk(operation, scope, report)));
        self.append_all(entries)
    }

    /// Matching entries, newest first
    pub fn get_logs(&self, query: &LogQuery) -> Vec<ActivityEntry> {
        let mut logs: Vec<ActivityEntry> = self
            .load()
            .into_iter()
            .filter(|e| query.repo.as_deref().map_or(true, |repo| e.repo == repo))
            .filter(|e| query.operation.as_deref().map_or(true, |op| e.operation == op))
            .filter(|e| query.status.map_or(true, |status| e.status == status))
            .collect();
        // stable sort keeps insertion order for equal timestamps, reversed below
        logs.reverse();
        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        logs.truncate(query.limit);
        logs
    }

    pub fn repo_history(&self, repo: &str, limit: usize) -> Vec<ActivityEntry> {
        self.get_logs(&LogQuery {
            limit,
            repo: Some(repo.to_string()),
            ..LogQuery::default()
        })
    }

    pub fn stats(&self) -> ActivityStats {
        let logs = self.load();
        let count = |status: EntryStatus| logs.iter().filter(|e| e.status == status).count();
        let successful = count(EntryStatus::Success);

        let mut operation_counts = BTreeMap::new();
        let mut repo_counts = BTreeMap::new();
        for entry in &logs {
            *operation_counts.entry(entry.operation.clone()).or_insert(0) += 1;
            *repo_counts.entry(entry.repo.clone()).or_insert(0) += 1;
        }

        let success_rate = if logs.is_empty() {
            0.0
        } else {
            (successful as f64 / logs.len() as f64 * 10_000.0).round() / 100.0
        };

        ActivityStats {
            total_operations: logs.len(),
            successful,
            failed: count(EntryStatus::Error),
            warnings: count(EntryStatus::Warning),
            success_rate,
            operation_counts,
            repo_counts,
            last_activity: logs.iter().map(|e| e.timestamp).max(),
        }
    }
}
