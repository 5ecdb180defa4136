//! Core functionality for git-fleet.
//!
//! This module provides the building blocks for watching a directory of git
//! repositories: discovery, status inspection, cached and parallel scans, pulls,
//! and the persistent stores and output helpers used by the CLI.

pub mod activity;
pub mod cache;
pub mod colors;
pub mod command_init;
pub mod config;
pub mod dirs;
pub mod error;
pub mod git;
pub mod groups;
pub mod inspector;
pub mod locator;
pub mod monitor;
pub mod output;
pub mod pool;
pub mod pull;
pub mod scan;
pub mod state;
pub mod sync_state;

// === Error handling ===
pub use error::{ErrorKind, GitFleetError, Result};

// === Repository model ===
// Handles, snapshots and the closed set of sync states
pub use state::{CommitInfo, RepoStatus, RepositoryHandle};
pub use sync_state::SyncState;

// === Git access ===
pub use git::{run_git, GitOutput, GitRepo};

// === Engine ===
// Locator -> scanner (through the cache) -> inspector; pulls go straight to the executor
pub use cache::{CacheStats, Clock, StatusCache, SystemClock};
pub use inspector::StatusInspector;
pub use locator::locate_repositories;
pub use monitor::RepoMonitor;
pub use pull::{BulkPullReport, PullExecutor, PullOutcome, PullStrategy};
pub use scan::{FleetSummary, GroupSync, ScanOrchestrator, ScanPage};

// === Settings and stores ===
pub use activity::{ActivityEntry, ActivityLog, ActivityStats, EntryStatus, LogQuery};
pub use command_init::{FleetContext, GlobalOptions};
pub use config::Settings;
pub use groups::{Group, GroupStore, GroupUpdate};

// === Output formatting ===
pub use colors::{format_counts, format_repo_line, get_state_badge, get_state_color_style};
pub use output::{
    print_error, print_failure, print_info, print_json, print_section_header, print_success,
    print_warning,
};
