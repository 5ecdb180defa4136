//! Domain-specific error types and error handling utilities.
//!
//! This module defines [`GitFleetError`] which covers every failure mode of the
//! repository status engine, and [`ErrorKind`], the serializable classification
//! that callers (activity log, JSON output, bulk pull reports) attach to results.
//!
//! # Public API
//! - [`GitFleetError`]: Main error enum covering all failure modes
//! - [`ErrorKind`]: Coarse, stable classification of an error
//! - [`Result<T>`]: Type alias for `std::result::Result<T, GitFleetError>`
//!
//! # Error Categories
//! - **Discovery**: unreadable base directory
//! - **Remote access**: authentication, network, missing repository or remote
//! - **Reconciliation**: conflicts, dirty working tree, missing or unknown strategy
//! - **Inspection**: git2 failures, timeouts, anything else while reading status

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Domain-specific error types for git-fleet
#[derive(Error, Debug)]
pub enum GitFleetError {
    // Discovery errors
    #[error("Cannot read repository directory '{path}': {source}")]
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },

    // Remote access errors
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Timed out after {seconds}s: {operation}")]
    Timeout { operation: String, seconds: u64 },

    // Reconciliation errors
    #[error("Conflict during {operation}: {message}")]
    Conflict { operation: String, message: String },

    #[error("Uncommitted changes block {operation}: {message}")]
    DirtyWorkingTree { operation: String, message: String },

    #[error("Unknown pull strategy '{strategy}'. Use one of: merge, rebase, reset")]
    UnknownStrategy { strategy: String },

    #[error("Repository '{repo}' has diverged from its upstream; a pull strategy is required")]
    StrategyRequired { repo: String },

    // Inspection errors
    #[error("Inspection failed: {message}")]
    Inspection { message: String },

    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Git repository error: {0}")]
    GitRepo(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration and stores
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Group '{group}' does not exist")]
    GroupNotFound { group: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Results using GitFleetError
pub type Result<T> = std::result::Result<T, GitFleetError>;

/// Stable classification of a [`GitFleetError`], suitable for serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DirectoryError,
    TimeoutError,
    AuthError,
    NetworkError,
    NotFoundError,
    ConflictError,
    DirtyWorkingTreeError,
    UnknownStrategyError,
    InspectionError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::DirectoryError => "directory_error",
            ErrorKind::TimeoutError => "timeout_error",
            ErrorKind::AuthError => "auth_error",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::NotFoundError => "not_found_error",
            ErrorKind::ConflictError => "conflict_error",
            ErrorKind::DirtyWorkingTreeError => "dirty_working_tree_error",
            ErrorKind::UnknownStrategyError => "unknown_strategy_error",
            ErrorKind::InspectionError => "inspection_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl GitFleetError {
    /// Classify this error for callers that only care about the category
    pub fn kind(&self) -> ErrorKind {
        match self {
            GitFleetError::Directory { .. } => ErrorKind::DirectoryError,
            GitFleetError::Auth { .. } => ErrorKind::AuthError,
            GitFleetError::Network { .. } => ErrorKind::NetworkError,
            GitFleetError::NotFound { .. } | GitFleetError::GroupNotFound { .. } => {
                ErrorKind::NotFoundError
            }
            GitFleetError::Timeout { .. } => ErrorKind::TimeoutError,
            GitFleetError::Conflict { .. } => ErrorKind::ConflictError,
            GitFleetError::DirtyWorkingTree { .. } => ErrorKind::DirtyWorkingTreeError,
            GitFleetError::UnknownStrategy { .. } | GitFleetError::StrategyRequired { .. } => {
                ErrorKind::UnknownStrategyError
            }
            GitFleetError::Inspection { .. }
            | GitFleetError::CommandFailed { .. }
            | GitFleetError::GitRepo(_)
            | GitFleetError::Io(_)
            | GitFleetError::Config { .. }
            | GitFleetError::Json(_) => ErrorKind::InspectionError,
        }
    }

    /// Create a directory error for an unreadable base path
    pub fn directory(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Directory {
            path: path.into(),
            source,
        }
    }

    /// Create an authentication error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, seconds: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            seconds,
        }
    }

    /// Create a conflict error
    pub fn conflict(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a dirty working tree error
    pub fn dirty_working_tree(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DirtyWorkingTree {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create an unknown strategy error
    pub fn unknown_strategy(strategy: impl Into<String>) -> Self {
        Self::UnknownStrategy {
            strategy: strategy.into(),
        }
    }

    /// Create a strategy required error for a diverged repository
    pub fn strategy_required(repo: impl Into<String>) -> Self {
        Self::StrategyRequired { repo: repo.into() }
    }

    /// Create a generic inspection error
    pub fn inspection(message: impl Into<String>) -> Self {
        Self::Inspection {
            message: message.into(),
        }
    }

    /// Create a failed git command error
    pub fn command_failed(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a group not found error
    pub fn group_not_found(group: impl Into<String>) -> Self {
        Self::GroupNotFound {
            group: group.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GitFleetError::unknown_strategy("squash");
        assert_eq!(
            err.to_string(),
            "Unknown pull strategy 'squash'. Use one of: merge, rebase, reset"
        );
    }

    #[test]
    fn test_directory_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = GitFleetError::directory("/srv/git", io_err);
        assert!(err.to_string().contains("/srv/git"));
        assert!(err.to_string().contains("denied"));
        assert_eq!(err.kind(), ErrorKind::DirectoryError);
    }

    #[test]
    fn test_strategy_required_is_unknown_strategy_kind() {
        let err = GitFleetError::strategy_required("backend");
        assert!(err.to_string().contains("backend"));
        assert_eq!(err.kind(), ErrorKind::UnknownStrategyError);
    }

    #[test]
    fn test_timeout_error() {
        let err = GitFleetError::timeout("git fetch origin", 30);
        assert_eq!(err.to_string(), "Timed out after 30s: git fetch origin");
        assert_eq!(err.kind(), ErrorKind::TimeoutError);
    }

    #[test]
    fn test_catch_all_kinds() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        assert_eq!(GitFleetError::Io(io_err).kind(), ErrorKind::InspectionError);
        assert_eq!(
            GitFleetError::command_failed("status", "fatal").kind(),
            ErrorKind::InspectionError
        );
        assert_eq!(
            GitFleetError::group_not_found("web").kind(),
            ErrorKind::NotFoundError
        );
    }

    #[test]
    fn test_error_kind_serialization() -> Result<()> {
        let json = serde_json::to_string(&ErrorKind::DirtyWorkingTreeError)?;
        assert_eq!(json, "\"dirty_working_tree_error\"");
        assert_eq!(ErrorKind::ConflictError.to_string(), "conflict_error");
        Ok(())
    }
}
