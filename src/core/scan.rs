//! Fan-out of status inspection across many repositories.
//!
//! [`ScanOrchestrator`] runs the inspector (through the cache unless a refresh
//! is forced) on a bounded worker pool and always returns one snapshot per
//! requested repository, sorted by name. A failure in one repository becomes an
//! `error` snapshot for that repository; the batch itself never fails.
//!
//! After each batch the group-membership collaborator, if any, is handed the
//! final snapshots.

use crate::core::{
    cache::StatusCache,
    error::{ErrorKind, Result},
    inspector::StatusInspector,
    pool::run_bounded,
    state::{RepoStatus, RepositoryHandle},
    sync_state::SyncState,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Receives the per-repository states after a scan or pull
pub trait GroupSync: Send + Sync {
    /// Update automatic group membership for the reported repositories only
    fn sync_auto_groups(&self, statuses: &[RepoStatus]) -> Result<()>;
}

/// One page of a paginated scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanPage {
    pub repos: Vec<RepoStatus>,
    /// Zero-based page index
    pub batch: usize,
    pub batch_size: usize,
    pub total: usize,
    /// Repositories covered by this page and every page before it
    pub loaded: usize,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetSummary {
    pub total_repos: usize,
    /// Repositories with uncommitted tracked changes
    pub repos_with_changes: usize,
    /// Count per sync state; every state is present, possibly with zero
    pub status_counts: BTreeMap<SyncState, usize>,
}

impl FleetSummary {
    pub fn from_statuses(statuses: &[RepoStatus]) -> Self {
        let mut status_counts: BTreeMap<SyncState, usize> =
            SyncState::ALL.iter().map(|state| (*state, 0)).collect();
        for status in statuses {
            *status_counts.entry(status.state).or_insert(0) += 1;
        }
        Self {
            total_repos: statuses.len(),
            repos_with_changes: statuses.iter().filter(|s| s.is_dirty).count(),
            status_counts,
        }
    }

    pub fn count(&self, state: SyncState) -> usize {
        self.status_counts.get(&state).copied().unwrap_or(0)
    }
}

pub struct ScanOrchestrator<'a> {
    inspector: &'a StatusInspector,
    cache: &'a StatusCache,
    groups: Option<&'a dyn GroupSync>,
}

impl<'a> ScanOrchestrator<'a> {
    pub fn new(inspector: &'a StatusInspector, cache: &'a StatusCache) -> Self {
        Self {
            inspector,
            cache,
            groups: None,
        }
    }

    pub fn with_groups(mut self, groups: &'a dyn GroupSync) -> Self {
        self.groups = Some(groups);
        self
    }

    /// Status of one repository; `use_cache = false` inspects and refreshes the cached entry
    pub fn status(&self, handle: &RepositoryHandle, use_cache: bool) -> RepoStatus {
        if use_cache {
            self.cache
                .get(&handle.name, || self.inspector.inspect(handle))
        } else {
            let status = self.inspector.inspect(handle);
            self.cache.insert(&handle.name, status.clone());
            status
        }
    }

    /// One snapshot per handle, sorted by name
    pub fn scan_all(
        &self,
        handles: Vec<RepositoryHandle>,
        force_refresh: bool,
        concurrency: usize,
    ) -> Vec<RepoStatus> {
        let count = handles.len();
        log::info!(
            "Scanning {count} repositories ({} workers{})",
            concurrency.max(1),
            if force_refresh { ", forced refresh" } else { "" }
        );

        let results = run_bounded(
            handles,
            concurrency,
            |handle| self.status(&handle, !force_refresh),
            |handle, message| {
                RepoStatus::failed_with_message(
                    &handle,
                    ErrorKind::InspectionError,
                    format!("Inspection panicked: {message}"),
                )
            },
        );
        let mut statuses: Vec<RepoStatus> = results.into_iter().map(|(_, status)| status).collect();
        statuses.sort_by(|a, b| a.name.cmp(&b.name));

        let failures = statuses.iter().filter(|s| s.is_error()).count();
        if failures > 0 {
            log::warn!("{failures} of {count} repositories could not be inspected");
        }
        self.notify_groups(&statuses);
        statuses
    }

    /// Scan only the `batch`-th page of `batch_size` handles
    pub fn scan_page(
        &self,
        handles: Vec<RepositoryHandle>,
        batch: usize,
        batch_size: usize,
        force_refresh: bool,
        concurrency: usize,
    ) -> ScanPage {
        let batch_size = batch_size.max(1);
        let total = handles.len();
        let start = batch.saturating_mul(batch_size).min(total);
        let end = start.saturating_add(batch_size).min(total);

        let page: Vec<RepositoryHandle> = handles.into_iter().skip(start).take(end - start).collect();
        let repos = if page.is_empty() {
            Vec::new()
        } else {
            self.scan_all(page, force_refresh, concurrency)
        };

        ScanPage {
            repos,
            batch,
            batch_size,
            total,
            loaded: end,
            has_more: end < total,
        }
    }

    pub fn notify_groups(&self, statuses: &[RepoStatus]) {
        if let Some(groups) = self.groups {
            if let Err(e) = groups.sync_auto_groups(statuses) {
                log::warn!("Failed to update automatic groups: {e}");
            }
        }
    }
}
