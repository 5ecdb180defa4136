//! Common assertion helpers for test output validation
//!
//! Provides predicates for CLI output and checks on status snapshots.

#![allow(dead_code)]

use git_fleet::{RepoStatus, SyncState};
use predicates::prelude::*;
use std::path::Path;

/// JSON output contains a repository in the given state
pub fn has_json_state(name: &str, state: SyncState) -> impl Predicate<str> {
    predicates::str::contains(format!("\"name\": \"{name}\""))
        .and(predicates::str::contains(format!("\"state\": \"{}\"", state.as_str())))
}

/// Error output for a diverged pull without a strategy
pub fn strategy_required() -> impl Predicate<str> {
    predicates::str::contains("strategy is required")
        .or(predicates::str::contains("unknown_strategy_error"))
}

pub fn repo_not_found() -> impl Predicate<str> {
    predicates::str::contains("not found")
}

/// Snapshot has the expected state and counts
pub fn assert_state(status: &RepoStatus, state: SyncState, ahead: usize, behind: usize) {
    assert_eq!(
        (status.state, status.ahead, status.behind),
        (state, ahead, behind),
        "unexpected status for {}: {:?}",
        status.name,
        status.error
    );
}

/// Working copy is stopped in the middle of a merge
pub fn is_mid_merge(path: &Path) -> bool {
    path.join(".git/MERGE_HEAD").exists()
}

/// Working copy is stopped in the middle of a rebase
pub fn is_mid_rebase(path: &Path) -> bool {
    path.join(".git/rebase-merge").exists() || path.join(".git/rebase-apply").exists()
}
