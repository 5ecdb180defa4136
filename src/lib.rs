//! git-fleet - keep a directory full of git repositories in sync with their remotes.
//!
//! The library discovers working copies under a base directory, inspects each
//! one's relationship to its upstream (ahead/behind, dirty, diverged), caches
//! those snapshots with a TTL, scans many repositories in parallel, and pulls
//! with an explicit merge, rebase or reset strategy.
//!
//! # Public API
//! The main public interface is re-exported from the [`core`] module:
//! - [`RepoMonitor`]: facade over discovery, scanning, caching and pulls
//! - [`RepoStatus`] and [`SyncState`]: status snapshots
//! - [`PullStrategy`], [`PullOutcome`], [`BulkPullReport`]: pull results
//! - [`GitFleetError`] and [`ErrorKind`]: error handling

pub mod commands;
pub mod core;

pub use core::{
    locate_repositories,
    ActivityLog,
    BulkPullReport,
    CacheStats,
    // Error handling
    ErrorKind,
    FleetSummary,
    GitFleetError,
    GroupStore,
    PullOutcome,
    PullStrategy,
    // Engine
    RepoMonitor,
    RepoStatus,
    RepositoryHandle,
    Result,
    ScanPage,
    Settings,
    StatusCache,
    SyncState,
};
