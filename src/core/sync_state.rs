//! Type-safe repository synchronization state.
//!
//! This module defines [`SyncState`], the closed set of states a repository can be
//! in relative to its upstream. Classification from ahead/behind counts lives here
//! so that the invariants between counts and state are enforced in one place.
//!
//! # Public API
//! - [`SyncState`]: Main enumeration for all synchronization states
//!
//! # Key Features
//! - **Exhaustiveness**: adding a state forces every `match` to handle it
//! - **Classification**: [`SyncState::classify`] maps ahead/behind counts to a state
//! - **Display formatting**: snake_case names shared by JSON output and the terminal

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Relationship between a working copy and its upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Tracking branch exists and both sides point at the same history
    UpToDate,
    /// Remote has commits the local branch does not
    Behind,
    /// Local branch has commits the remote does not
    Ahead,
    /// Both sides have commits the other lacks
    Diverged,
    /// No remote configured
    NoRemote,
    /// Remote exists but the current branch has no upstream
    NoTracking,
    /// Inspection itself failed
    Error,
    /// Detached HEAD or unborn branch
    Unknown,
}

impl SyncState {
    /// All states, in display order
    pub const ALL: [SyncState; 8] = [
        SyncState::UpToDate,
        SyncState::Behind,
        SyncState::Ahead,
        SyncState::Diverged,
        SyncState::NoRemote,
        SyncState::NoTracking,
        SyncState::Error,
        SyncState::Unknown,
    ];

    /// Classify a tracked branch from its ahead/behind counts
    pub fn classify(ahead: usize, behind: usize) -> SyncState {
        match (ahead > 0, behind > 0) {
            (true, true) => SyncState::Diverged,
            (false, true) => SyncState::Behind,
            (true, false) => SyncState::Ahead,
            (false, false) => SyncState::UpToDate,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::UpToDate => "up_to_date",
            SyncState::Behind => "behind",
            SyncState::Ahead => "ahead",
            SyncState::Diverged => "diverged",
            SyncState::NoRemote => "no_remote",
            SyncState::NoTracking => "no_tracking",
            SyncState::Error => "error",
            SyncState::Unknown => "unknown",
        }
    }

    /// Get human-readable description for state
    pub fn description(&self) -> &'static str {
        match self {
            SyncState::UpToDate => "up to date",
            SyncState::Behind => "behind",
            SyncState::Ahead => "ahead",
            SyncState::Diverged => "diverged",
            SyncState::NoRemote => "no remote",
            SyncState::NoTracking => "no tracking branch",
            SyncState::Error => "error",
            SyncState::Unknown => "unknown",
        }
    }

    /// Whether this state came from comparing against a tracking branch
    pub fn is_tracked(&self) -> bool {
        matches!(
            self,
            SyncState::UpToDate | SyncState::Behind | SyncState::Ahead | SyncState::Diverged
        )
    }

    /// Whether a pull could bring in new commits
    pub fn needs_pull(&self) -> bool {
        matches!(self, SyncState::Behind | SyncState::Diverged)
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        SyncState::ALL
            .iter()
            .copied()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| format!("unknown sync state '{s}'"))
    }
}
