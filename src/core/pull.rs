//! Fetch-then-reconcile pulls for a single working copy, and bulk pulls.
//!
//! # Public API
//! - [`PullStrategy`]: merge, rebase or hard reset to the upstream tip
//! - [`PullExecutor`]: runs one pull and reports a [`PullOutcome`]
//! - [`BulkPullReport`]: tally of a pull over many repositories
//!
//! # Semantics
//! 1. Fetch the configured remote. Failures are classified and nothing else runs.
//! 2. If the upstream has nothing new, succeed without touching the working tree.
//! 3. Resolve the strategy: the caller's choice, else `merge`. A diverged
//!    repository without an explicit strategy fails with "strategy required".
//! 4. Reconcile. Conflicts leave the repository as git left it (mid-merge or
//!    mid-rebase); nothing is aborted or rolled back.
//! 5. Re-inspect and return the fresh snapshot.
//!
//! Failures never surface as `Err`: a [`PullOutcome`] always comes back so bulk
//! callers can tally without per-item error handling.

use crate::core::{
    error::{ErrorKind, GitFleetError, Result},
    git::{run_git, GitOutput, GitRepo, Upstream},
    inspector::StatusInspector,
    pool::run_bounded,
    state::{RepoStatus, RepositoryHandle},
    sync_state::SyncState,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullStrategy {
    /// Fast-forward when possible, otherwise create a merge commit
    Merge,
    /// Replay local commits onto the upstream tip
    Rebase,
    /// Hard reset to the upstream tip, discarding local commits and changes
    Reset,
}

impl PullStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PullStrategy::Merge => "merge",
            PullStrategy::Rebase => "rebase",
            PullStrategy::Reset => "reset",
        }
    }

    /// Strategy to use when the caller did not pick one.
    ///
    /// Diverged histories never get a default; unattended pulls must not guess.
    pub fn resolve(
        requested: Option<PullStrategy>,
        state: SyncState,
        repo: &str,
    ) -> Result<PullStrategy> {
        match (requested, state) {
            (Some(strategy), _) => Ok(strategy),
            (None, SyncState::Diverged) => Err(GitFleetError::strategy_required(repo)),
            (None, _) => Ok(PullStrategy::Merge),
        }
    }
}

impl fmt::Display for PullStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PullStrategy {
    type Err = GitFleetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" | "ff" | "fast-forward" => Ok(PullStrategy::Merge),
            "rebase" => Ok(PullStrategy::Rebase),
            "reset" | "hard-reset" => Ok(PullStrategy::Reset),
            _ => Err(GitFleetError::unknown_strategy(s)),
        }
    }
}

/// Result of one pull
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullOutcome {
    pub name: String,
    pub success: bool,
    /// Strategy that was applied; `None` when nothing needed reconciling or the
    /// pull failed before a strategy was chosen
    pub strategy: Option<PullStrategy>,
    pub error: Option<ErrorKind>,
    pub message: String,
    /// Commits the upstream had that the local branch did not, before reconciling
    pub updates: usize,
    pub branch: Option<String>,
    /// Snapshot taken after a successful pull
    pub status: Option<RepoStatus>,
    pub timestamp: DateTime<Utc>,
}

impl PullOutcome {
    fn succeeded(
        handle: &RepositoryHandle,
        strategy: Option<PullStrategy>,
        message: String,
        updates: usize,
        branch: Option<String>,
    ) -> Self {
        Self {
            name: handle.name.clone(),
            success: true,
            strategy,
            error: None,
            message,
            updates,
            branch,
            status: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(handle: &RepositoryHandle, error: &GitFleetError) -> Self {
        Self::failed_during(handle, None, None, error)
    }

    /// Failure after the branch and possibly the strategy were known
    pub fn failed_during(
        handle: &RepositoryHandle,
        strategy: Option<PullStrategy>,
        branch: Option<String>,
        error: &GitFleetError,
    ) -> Self {
        Self {
            name: handle.name.clone(),
            success: false,
            strategy,
            error: Some(error.kind()),
            message: error.to_string(),
            updates: 0,
            branch,
            status: None,
            timestamp: Utc::now(),
        }
    }
}

/// Error of a pull plus what had been settled before it happened
struct PullFailure {
    error: GitFleetError,
    strategy: Option<PullStrategy>,
    branch: Option<String>,
}

impl PullFailure {
    fn new(error: GitFleetError, strategy: Option<PullStrategy>, branch: &str) -> Self {
        Self {
            error,
            strategy,
            branch: Some(branch.to_string()),
        }
    }
}

impl From<GitFleetError> for PullFailure {
    fn from(error: GitFleetError) -> Self {
        Self {
            error,
            strategy: None,
            branch: None,
        }
    }
}

/// Everything known about the local branch after fetching
struct PullTarget {
    remote: String,
    branch: String,
    upstream: Upstream,
    ahead: usize,
    behind: usize,
    dirty: bool,
}

#[derive(Debug, Clone)]
pub struct PullExecutor {
    inspector: StatusInspector,
}

impl PullExecutor {
    pub fn new(inspector: StatusInspector) -> Self {
        Self { inspector }
    }

    fn timeout(&self) -> Duration {
        self.inspector.timeout()
    }

    /// Pull one repository; failures are reported in the outcome
    pub fn pull(&self, handle: &RepositoryHandle, strategy: Option<PullStrategy>) -> PullOutcome {
        log::info!(
            "Pulling {} (strategy: {})",
            handle.name,
            strategy.map_or("default", |s| s.as_str())
        );
        let mut outcome = match self.try_pull(handle, strategy) {
            Ok(outcome) => outcome,
            Err(failure) => {
                log::warn!("Pull of {} failed: {}", handle.name, failure.error);
                return PullOutcome::failed_during(
                    handle,
                    failure.strategy,
                    failure.branch,
                    &failure.error,
                );
            }
        };

        let status = self.inspector.inspect(handle);
        if status.is_error() {
            log::warn!(
                "{} pulled but could not be re-inspected: {}",
                handle.name,
                status.error.as_deref().unwrap_or("unknown error")
            );
        }
        outcome.status = Some(status);
        outcome
    }

    fn try_pull(
        &self,
        handle: &RepositoryHandle,
        requested: Option<PullStrategy>,
    ) -> std::result::Result<PullOutcome, PullFailure> {
        let remote = {
            let repo = GitRepo::open(&handle.path)?;
            repo.remote_name()?
                .ok_or_else(|| GitFleetError::not_found("No remote configured"))?
        };

        self.fetch(handle, &remote)?;
        let target = self.target_after_fetch(handle, remote)?;

        if target.behind == 0 {
            log::info!("{} is already up to date with {}", handle.name, target.upstream.short_name);
            return Ok(PullOutcome::succeeded(
                handle,
                None,
                format!("{} is already up to date", handle.name),
                0,
                Some(target.branch),
            ));
        }

        let state = SyncState::classify(target.ahead, target.behind);
        let strategy = PullStrategy::resolve(requested, state, &handle.name)
            .map_err(|e| PullFailure::new(e, None, &target.branch))?;
        if target.dirty && strategy == PullStrategy::Rebase {
            return Err(PullFailure::new(
                GitFleetError::dirty_working_tree(
                    "rebase",
                    "commit or stash local changes first, or pull with the reset strategy",
                ),
                Some(strategy),
                &target.branch,
            ));
        }

        self.reconcile(handle, &target, strategy)
            .map_err(|e| PullFailure::new(e, Some(strategy), &target.branch))?;
        log::info!(
            "Pulled {} new commit(s) into {}/{} with {}",
            target.behind,
            handle.name,
            target.branch,
            strategy
        );
        Ok(PullOutcome::succeeded(
            handle,
            Some(strategy),
            format!(
                "Pulled {} commit(s) from {} into {} using {}",
                target.behind, target.upstream.short_name, target.branch, strategy
            ),
            target.behind,
            Some(target.branch),
        ))
    }

    fn fetch(&self, handle: &RepositoryHandle, remote: &str) -> Result<()> {
        let output = run_git(
            &handle.path,
            &["fetch", "--prune", remote],
            self.timeout(),
        )?;
        if output.success {
            return Ok(());
        }
        Err(classify_fetch_failure(&output))
    }

    fn target_after_fetch(&self, handle: &RepositoryHandle, remote: String) -> Result<PullTarget> {
        // reopened so refs updated by the fetch are read from disk
        let repo = GitRepo::open(&handle.path)?;
        let branch = repo.current_branch()?.ok_or_else(|| {
            GitFleetError::inspection("Repository is in detached HEAD state or has no commits")
        })?;
        let upstream = repo
            .upstream(&branch)?
            .ok_or_else(|| GitFleetError::not_found(format!("Branch '{branch}' has no upstream")))?;
        let (ahead, behind) = repo.ahead_behind(upstream.oid)?;
        Ok(PullTarget {
            remote,
            branch,
            ahead,
            behind,
            dirty: repo.is_dirty()?,
            upstream,
        })
    }

    fn reconcile(
        &self,
        handle: &RepositoryHandle,
        target: &PullTarget,
        strategy: PullStrategy,
    ) -> Result<()> {
        let upstream = target.upstream.ref_name.as_str();
        let args: Vec<&str> = match strategy {
            PullStrategy::Merge => vec!["merge", "--ff", "--no-edit", upstream],
            PullStrategy::Rebase => vec!["rebase", upstream],
            PullStrategy::Reset => vec!["reset", "--hard", upstream],
        };
        log::debug!(
            "Reconciling {} with {} from {}",
            handle.name,
            strategy,
            target.remote
        );

        let output = run_git(&handle.path, &args, self.timeout())?;
        if output.success {
            return Ok(());
        }
        Err(classify_reconcile_failure(strategy, &output))
    }

    /// Pull many repositories on a bounded pool; one failure never stops the rest
    pub fn pull_many(
        &self,
        handles: Vec<RepositoryHandle>,
        strategy: Option<PullStrategy>,
        concurrency: usize,
    ) -> BulkPullReport {
        let results = run_bounded(
            handles,
            concurrency,
            |handle| self.pull(&handle, strategy),
            |handle, message| {
                PullOutcome::failed(&handle, &GitFleetError::inspection(format!("pull panicked: {message}")))
            },
        );
        let mut outcomes: Vec<PullOutcome> = results.into_iter().map(|(_, outcome)| outcome).collect();
        outcomes.sort_by(|a, b| a.name.cmp(&b.name));
        BulkPullReport::from_outcomes(outcomes)
    }
}

/// Tally of a bulk pull
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkPullReport {
    pub success: bool,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<PullOutcome>,
}

impl BulkPullReport {
    pub fn from_outcomes(results: Vec<PullOutcome>) -> Self {
        let succeeded = results.iter().filter(|o| o.success).count();
        let failed = results.len() - succeeded;
        Self {
            success: failed == 0,
            total: results.len(),
            succeeded,
            failed,
            results,
        }
    }

    pub fn summary(&self) -> String {
        format!("Pulled {}/{} repositories", self.succeeded, self.total)
    }
}

/// Map a failed `git fetch` to the error taxonomy
pub fn classify_fetch_failure(output: &GitOutput) -> GitFleetError {
    let text = output.combined();
    let lower = text.to_lowercase();
    let message = first_line(&text);

    const AUTH: &[&str] = &[
        "authentication failed",
        "permission denied",
        "could not read username",
        "could not read password",
        "terminal prompts disabled",
        "invalid username or password",
        "access denied",
        "http basic: access denied",
        "returned error: 403",
        "returned error: 401",
    ];
    const NOT_FOUND: &[&str] = &[
        "repository not found",
        "does not appear to be a git repository",
        "not found",
        "no such remote",
        "does not exist",
        "returned error: 404",
    ];
    const NETWORK: &[&str] = &[
        "could not resolve host",
        "could not resolve hostname",
        "name or service not known",
        "connection refused",
        "connection timed out",
        "operation timed out",
        "network is unreachable",
        "no route to host",
        "unable to access",
        "could not connect",
        "connection reset",
        "early eof",
        "the remote end hung up",
        "ssl certificate problem",
        "gnutls",
    ];

    if AUTH.iter().any(|needle| lower.contains(needle)) {
        GitFleetError::auth(message)
    } else if NOT_FOUND.iter().any(|needle| lower.contains(needle)) {
        GitFleetError::not_found(message)
    } else if NETWORK.iter().any(|needle| lower.contains(needle)) {
        GitFleetError::network(message)
    } else {
        GitFleetError::command_failed("fetch", message)
    }
}

/// Map a failed merge, rebase or reset to the error taxonomy
pub fn classify_reconcile_failure(strategy: PullStrategy, output: &GitOutput) -> GitFleetError {
    let text = output.combined();
    let lower = text.to_lowercase();
    let operation = strategy.as_str();

    if lower.contains("would be overwritten")
        || lower.contains("uncommitted changes")
        || lower.contains("unstaged changes")
        || lower.contains("please commit or stash")
    {
        GitFleetError::dirty_working_tree(operation, first_line(&text))
    } else if lower.contains("conflict")
        || lower.contains("automatic merge failed")
        || lower.contains("could not apply")
        || lower.contains("unmerged files")
    {
        let conflict_line = text
            .lines()
            .find(|line| line.to_lowercase().contains("conflict"))
            .unwrap_or(&text);
        GitFleetError::conflict(operation, conflict_line.trim())
    } else {
        GitFleetError::command_failed(operation, first_line(&text))
    }
}

fn first_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("no output from git")
        .trim_start_matches("fatal: ")
        .trim_start_matches("error: ")
        .to_string()
}
