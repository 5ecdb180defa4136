//! Git repository access for status reads and pull commands.
//!
//! This module provides [`GitRepo`], a thin wrapper over `git2` for the read-only
//! queries the inspector needs, and a timed runner for the `git` CLI, which is
//! used for everything that touches the network or rewrites the working tree
//! (fetch, merge, rebase, reset) so the user's credential helpers and SSH setup
//! apply unchanged.
//!
//! # Public API
//! - [`GitRepo`]: Branch, remote, upstream, ahead/behind and commit queries
//! - [`Upstream`]: Resolved tracking reference of a local branch
//! - [`GitOutput`]: Captured result of a `git` CLI invocation
//! - [`run_git`]: Run `git` in a directory with a hard timeout

use crate::core::{
    error::{GitFleetError, Result},
    state::CommitInfo,
};
use chrono::{DateTime, FixedOffset, Utc};
use git2::{BranchType, ErrorCode, Repository, StatusOptions};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const PREFERRED_REMOTE: &str = "origin";

pub struct GitRepo {
    repo: Repository,
}

/// Tracking reference of a local branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    /// Full reference name, e.g. `refs/remotes/origin/main`
    pub ref_name: String,
    /// Short name, e.g. `origin/main`
    pub short_name: String,
    pub oid: git2::Oid,
}

/// Output of a finished `git` invocation
#[derive(Debug, Clone)]
pub struct GitOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl GitOutput {
    /// stdout and stderr joined, for error classification
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stdout.trim(), self.stderr.trim())
            .trim()
            .to_string()
    }
}

impl GitRepo {
    /// Open the working copy at exactly `path`; parent directories are not searched
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::open(path).map_err(|e| match e.code() {
            ErrorCode::NotFound => {
                GitFleetError::not_found(format!("'{}' is not a git repository", path.display()))
            }
            _ => GitFleetError::GitRepo(e),
        })?;
        if repo.is_bare() {
            return Err(GitFleetError::inspection("Repository has no working directory"));
        }
        Ok(GitRepo { repo })
    }

    pub fn workdir(&self) -> &Path {
        // open() rejects bare repositories
        self.repo.workdir().unwrap_or_else(|| self.repo.path())
    }

    /// Current branch name, or `None` for a detached HEAD or an unborn branch
    pub fn current_branch(&self) -> Result<Option<String>> {
        if self.repo.head_detached()? {
            return Ok(None);
        }
        match self.repo.head() {
            Ok(head) if head.is_branch() => Ok(head.shorthand().map(str::to_string)),
            Ok(_) => Ok(None),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// True when tracked files differ from HEAD, in the index or the working tree
    pub fn is_dirty(&self) -> Result<bool> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(false);
        opts.include_ignored(false);
        opts.exclude_submodules(true);

        let statuses = self.repo.statuses(Some(&mut opts))?;
        Ok(statuses
            .iter()
            .any(|entry| entry.status() != git2::Status::CURRENT))
    }

    /// `origin` when configured, otherwise the first configured remote
    pub fn remote_name(&self) -> Result<Option<String>> {
        let remotes = self.repo.remotes()?;
        let names: Vec<&str> = remotes.iter().flatten().collect();
        if names.contains(&PREFERRED_REMOTE) {
            return Ok(Some(PREFERRED_REMOTE.to_string()));
        }
        Ok(names.first().map(|name| name.to_string()))
    }

    pub fn remote_url(&self, remote: &str) -> Result<Option<String>> {
        let remote = self.repo.find_remote(remote)?;
        Ok(remote.url().map(str::to_string))
    }

    /// Upstream of a local branch, or `None` when none is configured or resolvable
    pub fn upstream(&self, branch: &str) -> Result<Option<Upstream>> {
        let local = match self.repo.find_branch(branch, BranchType::Local) {
            Ok(local) => local,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let upstream = match local.upstream() {
            Ok(upstream) => upstream,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let reference = upstream.get();
        let (Some(ref_name), Some(oid)) = (reference.name(), reference.target()) else {
            return Ok(None);
        };
        Ok(Some(Upstream {
            ref_name: ref_name.to_string(),
            short_name: reference.shorthand().unwrap_or(ref_name).to_string(),
            oid,
        }))
    }

    /// Commits only on HEAD and only on `upstream`, relative to their merge base
    pub fn ahead_behind(&self, upstream: git2::Oid) -> Result<(usize, usize)> {
        let head = self
            .repo
            .head()?
            .target()
            .ok_or_else(|| GitFleetError::inspection("HEAD does not point at a commit"))?;
        Ok(self.repo.graph_ahead_behind(head, upstream)?)
    }

    pub fn local_branches(&self) -> Result<Vec<String>> {
        self.branch_names(BranchType::Local)
    }

    /// Remote-tracking branches as `remote/branch`, without symbolic `HEAD` entries
    pub fn remote_branches(&self) -> Result<Vec<String>> {
        let mut names = self.branch_names(BranchType::Remote)?;
        names.retain(|name| !name.ends_with("/HEAD"));
        Ok(names)
    }

    fn branch_names(&self, kind: BranchType) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for branch in self.repo.branches(Some(kind))? {
            let (branch, _) = branch?;
            if let Some(name) = branch.name()? {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Most recent commit on HEAD, `None` on an unborn branch
    pub fn last_commit(&self) -> Result<Option<CommitInfo>> {
        Ok(self.commit_history(1)?.into_iter().next())
    }

    /// Up to `limit` commits reachable from HEAD, newest first
    pub fn commit_history(&self, limit: usize) -> Result<Vec<CommitInfo>> {
        match self.repo.head() {
            Ok(_) => {}
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                return Ok(Vec::new())
            }
            Err(e) => return Err(e.into()),
        }

        let mut walk = self.repo.revwalk()?;
        walk.push_head()?;
        walk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)?;

        let mut commits = Vec::new();
        for oid in walk.take(limit) {
            let commit = self.repo.find_commit(oid?)?;
            commits.push(commit_info(&commit)?);
        }
        Ok(commits)
    }
}

fn commit_info(commit: &git2::Commit<'_>) -> Result<CommitInfo> {
    let time = commit.time();
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60)
        .ok_or_else(|| GitFleetError::inspection("Commit has an invalid timezone offset"))?;
    let date = DateTime::<Utc>::from_timestamp(time.seconds(), 0)
        .ok_or_else(|| GitFleetError::inspection("Commit has an invalid timestamp"))?
        .with_timezone(&offset);

    let hash = commit.id().to_string();
    Ok(CommitInfo {
        hash: hash[..7].to_string(),
        message: commit.summary().unwrap_or("").to_string(),
        author: commit.author().name().unwrap_or("unknown").to_string(),
        date,
    })
}

/// Run `git <args>` in `workdir`, killing it when `timeout` elapses.
///
/// A non-zero exit status is not an error here; callers classify the output.
/// Terminal prompts are disabled so a missing credential fails instead of hanging.
pub fn run_git(workdir: &Path, args: &[&str], timeout: Duration) -> Result<GitOutput> {
    let command_line = format!("git {}", args.join(" "));
    log::debug!("Running '{}' in {}", command_line, workdir.display());

    let mut child = Command::new("git")
        .args(args)
        .current_dir(workdir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    // Drain both pipes on their own threads so a chatty command cannot block on a full pipe
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let start = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if start.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            log::warn!(
                "'{}' in {} timed out after {:?}",
                command_line,
                workdir.display(),
                timeout
            );
            return Err(GitFleetError::timeout(command_line, timeout.as_secs()));
        }
        thread::sleep(POLL_INTERVAL);
    };

    let output = GitOutput {
        success: status.success(),
        stdout: stdout.map(collect).unwrap_or_default(),
        stderr: stderr.map(collect).unwrap_or_default(),
    };
    if !output.success {
        log::debug!("'{}' exited with {}: {}", command_line, status, output.stderr.trim());
    }
    Ok(output)
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn collect(handle: thread::JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}
