//! Repository identity and status snapshot data structures.
//!
//! # Public API
//! - [`RepositoryHandle`]: Name and path of one working copy
//! - [`CommitInfo`]: Summary of a single commit for display
//! - [`RepoStatus`]: Value snapshot of a repository's state relative to its upstream
//!
//! Snapshots are never mutated after being produced by the inspector; a newer
//! inspection supersedes the old value entirely.

use crate::core::{
    error::{ErrorKind, GitFleetError},
    sync_state::SyncState,
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One working copy under the base directory
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryHandle {
    pub name: String,
    pub path: PathBuf,
}

impl RepositoryHandle {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Handle for `name` inside `base`, without checking that it exists
    pub fn in_base(base: &Path, name: &str) -> Self {
        Self::new(name, base.join(name))
    }

    /// A single path component naming a directory directly under the base path
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains('/')
            && !name.contains('\\')
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub hash: String,
    pub message: String,
    pub author: String,
    pub date: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoStatus {
    pub name: String,
    pub path: PathBuf,
    pub current_branch: Option<String>,
    pub is_dirty: bool,
    pub remote_url: Option<String>,
    pub local_branches: Vec<String>,
    pub remote_branches: Vec<String>,
    pub ahead: usize,
    pub behind: usize,
    pub state: SyncState,
    pub last_commit: Option<CommitInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Classification of `error`, e.g. `timeout_error` for a hung inspection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl RepoStatus {
    /// Empty snapshot in the `unknown` state
    pub fn unknown(handle: &RepositoryHandle) -> Self {
        Self {
            name: handle.name.clone(),
            path: handle.path.clone(),
            current_branch: None,
            is_dirty: false,
            remote_url: None,
            local_branches: Vec::new(),
            remote_branches: Vec::new(),
            ahead: 0,
            behind: 0,
            state: SyncState::Unknown,
            last_commit: None,
            error: None,
            error_kind: None,
        }
    }

    /// Snapshot for a repository whose inspection failed
    pub fn failed(handle: &RepositoryHandle, error: &GitFleetError) -> Self {
        Self::failed_with_message(handle, error.kind(), error.to_string())
    }

    pub fn failed_with_message(
        handle: &RepositoryHandle,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            state: SyncState::Error,
            error: Some(message.into()),
            error_kind: Some(kind),
            ..Self::unknown(handle)
        }
    }

    pub fn is_error(&self) -> bool {
        self.state == SyncState::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_in_base() {
        let handle = RepositoryHandle::in_base(Path::new("/srv/git"), "api");
        assert_eq!(handle.name, "api");
        assert_eq!(handle.path, PathBuf::from("/srv/git/api"));
    }

    #[test]
    fn test_valid_names_are_single_components() {
        assert!(RepositoryHandle::is_valid_name("api"));
        assert!(RepositoryHandle::is_valid_name(".dotfiles"));
        for name in ["", ".", "..", "../elsewhere", "a/b", "a\\b", "/etc"] {
            assert!(!RepositoryHandle::is_valid_name(name), "{name}");
        }
    }

    #[test]
    fn test_failed_status_overrides_state() {
        let handle = RepositoryHandle::new("broken", "/tmp/broken");
        let status = RepoStatus::failed(&handle, &GitFleetError::inspection("HEAD is missing"));

        assert_eq!(status.state, SyncState::Error);
        assert!(status.is_error());
        assert_eq!(status.ahead, 0);
        assert_eq!(status.behind, 0);
        assert!(status.error.as_deref().unwrap().contains("HEAD is missing"));
        assert_eq!(status.error_kind, Some(ErrorKind::InspectionError));
    }

    #[test]
    fn test_timed_out_status_is_classified() -> crate::core::error::Result<()> {
        let handle = RepositoryHandle::new("slow", "/srv/git/slow");
        let status = RepoStatus::failed(&handle, &GitFleetError::timeout("status of slow", 60));
        assert_eq!(status.error_kind, Some(ErrorKind::TimeoutError));

        let json = serde_json::to_string(&status)?;
        assert!(json.contains("\"error_kind\":\"timeout_error\""));
        Ok(())
    }

    #[test]
    fn test_status_serialization_skips_empty_error() -> crate::core::error::Result<()> {
        let handle = RepositoryHandle::new("api", "/srv/git/api");
        let status = RepoStatus::unknown(&handle);

        let json = serde_json::to_string(&status)?;
        assert!(!json.contains("\"error\""));
        assert!(!json.contains("error_kind"));
        assert!(json.contains("\"state\":\"unknown\""));

        let deserialized: RepoStatus = serde_json::from_str(&json)?;
        assert_eq!(status, deserialized);
        Ok(())
    }
}
