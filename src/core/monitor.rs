//! [`RepoMonitor`] ties the locator, inspector, cache, scanner and pull
//! executor together for one base directory.
//!
//! One monitor (and so one cache) exists per process. Pulls bypass the cache,
//! then drop the repository's entry and store the post-pull snapshot so the
//! next read is consistent with what the pull did.

use crate::core::{
    cache::{CacheStats, StatusCache},
    config::Settings,
    error::{GitFleetError, Result},
    git::GitRepo,
    inspector::StatusInspector,
    locator,
    pool::DEFAULT_CONCURRENCY,
    pull::{BulkPullReport, PullExecutor, PullOutcome, PullStrategy},
    scan::{FleetSummary, GroupSync, ScanOrchestrator, ScanPage},
    state::{CommitInfo, RepoStatus, RepositoryHandle},
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub struct RepoMonitor {
    base_path: PathBuf,
    inspector: StatusInspector,
    executor: PullExecutor,
    cache: StatusCache,
    concurrency: usize,
    batch_size: usize,
    groups: Option<Arc<dyn GroupSync>>,
}

impl RepoMonitor {
    pub fn new(base_path: impl Into<PathBuf>, cache_ttl: Duration, git_timeout: Duration) -> Self {
        let inspector = StatusInspector::new(git_timeout);
        Self {
            base_path: base_path.into(),
            executor: PullExecutor::new(inspector.clone()),
            inspector,
            cache: StatusCache::new(cache_ttl),
            concurrency: DEFAULT_CONCURRENCY,
            batch_size: 10,
            groups: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.base_path(), settings.cache_ttl(), settings.git_timeout())
            .with_concurrency(settings.parallel_workers)
            .with_batch_size(settings.batch_size)
    }

    /// Replace the cache, e.g. with one driven by a test clock
    pub fn with_cache(mut self, cache: StatusCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_groups(mut self, groups: Arc<dyn GroupSync>) -> Self {
        self.groups = Some(groups);
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn orchestrator(&self) -> ScanOrchestrator<'_> {
        let orchestrator = ScanOrchestrator::new(&self.inspector, &self.cache);
        match &self.groups {
            Some(groups) => orchestrator.with_groups(groups.as_ref()),
            None => orchestrator,
        }
    }

    pub fn locate_repositories(&self) -> Result<Vec<RepositoryHandle>> {
        locator::locate_repositories(&self.base_path)
    }

    /// Handle for a repository directly under the base path
    pub fn handle(&self, name: &str) -> Result<RepositoryHandle> {
        if !RepositoryHandle::is_valid_name(name) {
            return Err(GitFleetError::not_found(format!(
                "'{name}' is not a repository name"
            )));
        }
        let handle = RepositoryHandle::in_base(&self.base_path, name);
        if !handle.path.join(".git").exists() {
            return Err(GitFleetError::not_found(format!(
                "Repository '{name}' not found in {}",
                self.base_path.display()
            )));
        }
        Ok(handle)
    }

    /// Handles for `names`, in the order given; unknown names are an error
    pub fn handles(&self, names: &[String]) -> Result<Vec<RepositoryHandle>> {
        names.iter().map(|name| self.handle(name)).collect()
    }

    pub fn get_status(&self, handle: &RepositoryHandle, use_cache: bool) -> RepoStatus {
        self.orchestrator().status(handle, use_cache)
    }

    pub fn scan_handles(&self, handles: Vec<RepositoryHandle>, force_refresh: bool) -> Vec<RepoStatus> {
        self.orchestrator()
            .scan_all(handles, force_refresh, self.concurrency)
    }

    /// Locate and inspect every repository under the base path
    pub fn scan_all(&self, force_refresh: bool) -> Result<Vec<RepoStatus>> {
        let handles = self.locate_repositories()?;
        Ok(self.scan_handles(handles, force_refresh))
    }

    pub fn scan_page(
        &self,
        batch: usize,
        batch_size: Option<usize>,
        force_refresh: bool,
    ) -> Result<ScanPage> {
        let handles = self.locate_repositories()?;
        Ok(self.orchestrator().scan_page(
            handles,
            batch,
            batch_size.unwrap_or(self.batch_size),
            force_refresh,
            self.concurrency,
        ))
    }

    pub fn summary(&self, force_refresh: bool) -> Result<FleetSummary> {
        Ok(FleetSummary::from_statuses(&self.scan_all(force_refresh)?))
    }

    /// Pull one repository and refresh its cached status
    pub fn pull(&self, handle: &RepositoryHandle, strategy: Option<PullStrategy>) -> PullOutcome {
        let outcome = self.executor.pull(handle, strategy);
        self.after_pull(std::slice::from_ref(&outcome));
        outcome
    }

    /// Pull many repositories on the worker pool; duplicates are pulled once
    pub fn pull_many(
        &self,
        handles: Vec<RepositoryHandle>,
        strategy: Option<PullStrategy>,
    ) -> BulkPullReport {
        let mut seen = HashSet::new();
        let unique: Vec<RepositoryHandle> = handles
            .into_iter()
            .filter(|handle| seen.insert(handle.name.clone()))
            .collect();

        let report = self.executor.pull_many(unique, strategy, self.concurrency);
        self.after_pull(&report.results);
        log::info!("{}", report.summary());
        report
    }

    pub fn pull_all(&self, strategy: Option<PullStrategy>) -> Result<BulkPullReport> {
        let handles = self.locate_repositories()?;
        Ok(self.pull_many(handles, strategy))
    }

    fn after_pull(&self, outcomes: &[PullOutcome]) {
        let mut refreshed = Vec::new();
        for outcome in outcomes {
            // a failed pull may still have moved refs (fetch) or left a conflict behind
            self.cache.invalidate(&outcome.name);
            if let Some(status) = &outcome.status {
                self.cache.insert(&outcome.name, status.clone());
                refreshed.push(status.clone());
            }
        }
        if !refreshed.is_empty() {
            self.orchestrator().notify_groups(&refreshed);
        }
    }

    pub fn commit_history(&self, handle: &RepositoryHandle, limit: usize) -> Result<Vec<CommitInfo>> {
        GitRepo::open(&handle.path)?.commit_history(limit)
    }

    pub fn invalidate_cache(&self, name: &str) -> bool {
        self.cache.invalidate(name)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn set_cache_ttl(&self, ttl: Duration) {
        self.cache.set_ttl(ttl);
    }
}
