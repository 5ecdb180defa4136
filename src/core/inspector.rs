//! Status inspection for a single working copy.
//!
//! [`StatusInspector::inspect`] is total: every failure, including a timeout or a
//! panic inside libgit2, comes back as a [`RepoStatus`] in the `error` state with
//! a message, so callers iterating over many repositories never short-circuit.
//!
//! The inspector never fetches. Ahead/behind counts reflect the remote-tracking
//! refs as they were last fetched.

use crate::core::{
    error::Result,
    git::GitRepo,
    pool::call_with_timeout,
    state::{RepoStatus, RepositoryHandle},
    sync_state::SyncState,
};
use std::time::Duration;

pub const DEFAULT_GIT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct StatusInspector {
    timeout: Duration,
}

impl Default for StatusInspector {
    fn default() -> Self {
        Self::new(DEFAULT_GIT_TIMEOUT)
    }
}

impl StatusInspector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Compute a fresh snapshot; never fails
    pub fn inspect(&self, handle: &RepositoryHandle) -> RepoStatus {
        let owned = handle.clone();
        let operation = format!("status of {}", handle.name);
        match call_with_timeout(&operation, self.timeout, move || read_status(&owned)) {
            Ok(status) => {
                log::debug!(
                    "{}: {} (ahead {}, behind {})",
                    status.name,
                    status.state,
                    status.ahead,
                    status.behind
                );
                status
            }
            Err(e) => {
                log::warn!("Inspection of {} failed: {e}", handle.name);
                RepoStatus::failed(handle, &e)
            }
        }
    }
}

/// Read everything the snapshot needs from the repository at `handle.path`
pub fn read_status(handle: &RepositoryHandle) -> Result<RepoStatus> {
    let repo = GitRepo::open(&handle.path)?;
    let mut status = RepoStatus::unknown(handle);

    status.current_branch = repo.current_branch()?;
    status.is_dirty = repo.is_dirty()?;
    status.local_branches = repo.local_branches()?;
    status.remote_branches = repo.remote_branches()?;
    status.last_commit = repo.last_commit()?;

    let remote = match repo.remote_name()? {
        Some(remote) => remote,
        None => {
            status.state = SyncState::NoRemote;
            return Ok(status);
        }
    };
    status.remote_url = repo.remote_url(&remote)?;
    if status.remote_url.is_none() {
        status.state = SyncState::NoRemote;
        return Ok(status);
    }

    // detached HEAD or unborn branch: relationship to upstream is undefined
    let Some(branch) = status.current_branch.clone() else {
        status.state = SyncState::Unknown;
        return Ok(status);
    };
    if status.last_commit.is_none() {
        status.state = SyncState::Unknown;
        return Ok(status);
    }

    let Some(upstream) = repo.upstream(&branch)? else {
        status.state = SyncState::NoTracking;
        return Ok(status);
    };

    let (ahead, behind) = repo.ahead_behind(upstream.oid)?;
    status.ahead = ahead;
    status.behind = behind;
    status.state = SyncState::classify(ahead, behind);
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{error::ErrorKind, git::run_git};
    use std::path::Path;
    use tempfile::TempDir;

    fn git(dir: &Path, args: &[&str]) {
        let output = run_git(dir, args, Duration::from_secs(30)).expect("git should run");
        assert!(output.success, "git {:?} failed: {}", args, output.stderr);
    }

    fn init_repo(dir: &Path) {
        std::fs::create_dir_all(dir).expect("create repo dir");
        git(dir, &["init", "-b", "main"]);
        git(dir, &["config", "user.name", "Test User"]);
        git(dir, &["config", "user.email", "test@example.com"]);
        git(dir, &["config", "commit.gpgsign", "false"]);
    }

    fn commit(dir: &Path, file: &str, message: &str) {
        std::fs::write(dir.join(file), message).expect("write file");
        git(dir, &["add", file]);
        git(dir, &["commit", "-m", message]);
    }

    #[test]
    fn test_non_repository_is_error_state() {
        let temp_dir = TempDir::new().unwrap();
        let handle = RepositoryHandle::new("plain", temp_dir.path());

        let status = StatusInspector::default().inspect(&handle);
        assert_eq!(status.state, SyncState::Error);
        assert_eq!(status.error_kind, Some(ErrorKind::NotFoundError));
        assert!(status.error.unwrap().contains("not a git repository"));
    }

    #[test]
    fn test_missing_directory_is_error_state() {
        let handle = RepositoryHandle::new("ghost", "/definitely/not/here/ghost");
        let status = StatusInspector::default().inspect(&handle);
        assert!(status.is_error());
        assert_eq!(status.name, "ghost");
    }

    #[test]
    fn test_no_remote() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("C");
        init_repo(&path);
        commit(&path, "a.txt", "first");

        let status = StatusInspector::default().inspect(&RepositoryHandle::new("C", &path));
        assert_eq!(status.state, SyncState::NoRemote);
        assert_eq!(status.remote_url, None);
        assert_eq!((status.ahead, status.behind), (0, 0));
        assert_eq!(status.current_branch.as_deref(), Some("main"));
        assert_eq!(status.last_commit.unwrap().message, "first");
    }

    #[test]
    fn test_remote_without_tracking_branch() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("local");
        init_repo(&path);
        commit(&path, "a.txt", "first");
        git(&path, &["remote", "add", "origin", "https://example.com/repo.git"]);

        let status = StatusInspector::default().inspect(&RepositoryHandle::new("local", &path));
        assert_eq!(status.state, SyncState::NoTracking);
        assert_eq!(
            status.remote_url.as_deref(),
            Some("https://example.com/repo.git")
        );
    }

    #[test]
    fn test_unborn_branch_is_unknown() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty");
        init_repo(&path);
        git(&path, &["remote", "add", "origin", "https://example.com/repo.git"]);

        let status = StatusInspector::default().inspect(&RepositoryHandle::new("empty", &path));
        assert_eq!(status.state, SyncState::Unknown);
        assert_eq!(status.current_branch, None);
        assert_eq!(status.last_commit, None);
    }

    #[test]
    fn test_detached_head_is_unknown() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("detached");
        init_repo(&path);
        commit(&path, "a.txt", "first");
        commit(&path, "b.txt", "second");
        git(&path, &["remote", "add", "origin", "https://example.com/repo.git"]);
        git(&path, &["checkout", "--detach", "HEAD~1"]);

        let status = StatusInspector::default().inspect(&RepositoryHandle::new("detached", &path));
        assert_eq!(status.state, SyncState::Unknown);
        assert_eq!(status.current_branch, None);
        assert_eq!(status.last_commit.unwrap().message, "first");
    }

    #[test]
    fn test_ahead_and_behind_against_local_remote() {
        let temp_dir = TempDir::new().unwrap();
        let remote = temp_dir.path().join("remote.git");
        std::fs::create_dir_all(&remote).unwrap();
        git(&remote, &["init", "--bare", "-b", "main"]);

        let seed = temp_dir.path().join("seed");
        init_repo(&seed);
        commit(&seed, "a.txt", "first");
        git(&seed, &["remote", "add", "origin", remote.to_str().unwrap()]);
        git(&seed, &["push", "-u", "origin", "main"]);

        let clone = temp_dir.path().join("clone");
        git(
            temp_dir.path(),
            &["clone", remote.to_str().unwrap(), clone.to_str().unwrap()],
        );
        git(&clone, &["config", "user.name", "Test User"]);
        git(&clone, &["config", "user.email", "test@example.com"]);

        commit(&seed, "b.txt", "second");
        git(&seed, &["push", "origin", "main"]);
        commit(&clone, "c.txt", "local work");
        git(&clone, &["fetch", "origin"]);

        let status = StatusInspector::default().inspect(&RepositoryHandle::new("clone", &clone));
        assert_eq!(status.state, SyncState::Diverged);
        assert_eq!((status.ahead, status.behind), (1, 1));
        assert_eq!(status.remote_branches, vec!["origin/main".to_string()]);
        assert!(!status.is_dirty);
    }
}
