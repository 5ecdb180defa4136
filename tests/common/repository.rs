//! Git repository management and setup utilities
//!
//! A [`TestFleet`] is a scratch directory laid out like a real setup: bare
//! "remote" repositories, a seed clone per remote used to publish upstream
//! commits, and the base directory of working copies that git-fleet watches.
//! Everything is driven through the `git` CLI.

#![allow(dead_code)]

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Run `git` in `dir`, failing on a non-zero exit
pub fn git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .with_context(|| format!("spawning git {args:?}"))?;
    if !output.status.success() {
        bail!(
            "git {:?} failed in {}: {}",
            args,
            dir.display(),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Set an identity so commits work without global git config
pub fn configure_identity(dir: &Path) -> Result<()> {
    git(dir, &["config", "user.name", "Test User"])?;
    git(dir, &["config", "user.email", "test@example.com"])?;
    git(dir, &["config", "commit.gpgsign", "false"])?;
    Ok(())
}

pub fn create_file(dir: &Path, name: &str, content: &str) -> Result<()> {
    fs::write(dir.join(name), content)?;
    Ok(())
}

pub fn commit_file(dir: &Path, name: &str, content: &str, message: &str) -> Result<()> {
    create_file(dir, name, content)?;
    git(dir, &["add", name])?;
    git(dir, &["commit", "-m", message])?;
    Ok(())
}

/// `count` commits, each adding its own file
pub fn commit_many(dir: &Path, prefix: &str, count: usize) -> Result<()> {
    for i in 1..=count {
        commit_file(
            dir,
            &format!("{prefix}-{i}.txt"),
            &format!("{prefix} {i}\n"),
            &format!("{prefix} commit {i}"),
        )?;
    }
    Ok(())
}

pub struct TestFleet {
    pub temp_dir: TempDir,
    /// Directory of working copies that git-fleet scans
    pub base: PathBuf,
    remotes: PathBuf,
    seeds: PathBuf,
}

impl TestFleet {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().to_path_buf();
        let fleet = Self {
            base: root.join("repos"),
            remotes: root.join("remotes"),
            seeds: root.join("seeds"),
            temp_dir,
        };
        for dir in [&fleet.base, &fleet.remotes, &fleet.seeds] {
            fs::create_dir_all(dir)?;
        }
        Ok(fleet)
    }

    pub fn repo_path(&self, name: &str) -> PathBuf {
        self.base.join(name)
    }

    pub fn remote_path(&self, name: &str) -> PathBuf {
        self.remotes.join(format!("{name}.git"))
    }

    pub fn seed_path(&self, name: &str) -> PathBuf {
        self.seeds.join(name)
    }

    /// Bare remote with one commit on `main`, plus a seed clone that can push to it
    pub fn create_remote(&self, name: &str) -> Result<PathBuf> {
        let remote = self.remote_path(name);
        fs::create_dir_all(&remote)?;
        git(&remote, &["init", "--bare", "-b", "main"])?;

        let seed = self.seed_path(name);
        fs::create_dir_all(&seed)?;
        git(&seed, &["init", "-b", "main"])?;
        configure_identity(&seed)?;
        commit_file(&seed, "README.md", &format!("# {name}\n"), "Initial commit")?;
        git(&seed, &["remote", "add", "origin", path_str(&remote)?])?;
        git(&seed, &["push", "-u", "origin", "main"])?;
        Ok(remote)
    }

    /// Clone the remote `name` into the base directory
    pub fn clone_into_base(&self, name: &str) -> Result<PathBuf> {
        let target = self.repo_path(name);
        git(
            &self.base,
            &["clone", path_str(&self.remote_path(name))?, path_str(&target)?],
        )?;
        configure_identity(&target)?;
        Ok(target)
    }

    /// Remote plus a tracking clone in the base directory, both at the same commit
    pub fn tracked_repo(&self, name: &str) -> Result<PathBuf> {
        self.create_remote(name)?;
        self.clone_into_base(name)
    }

    /// Publish `count` new commits to the remote of `name`
    pub fn push_upstream(&self, name: &str, count: usize) -> Result<()> {
        let seed = self.seed_path(name);
        commit_many(&seed, "upstream", count)?;
        git(&seed, &["push", "origin", "main"])?;
        Ok(())
    }

    /// Publish a commit that edits `file` on the remote of `name`
    pub fn push_upstream_edit(&self, name: &str, file: &str, content: &str) -> Result<()> {
        let seed = self.seed_path(name);
        commit_file(&seed, file, content, &format!("Upstream edit of {file}"))?;
        git(&seed, &["push", "origin", "main"])?;
        Ok(())
    }

    /// Fetch in the working copy so its tracking refs see the remote's commits
    pub fn fetch(&self, name: &str) -> Result<()> {
        git(&self.repo_path(name), &["fetch", "origin"])?;
        Ok(())
    }

    /// Working copy with commits but no remote
    pub fn local_only_repo(&self, name: &str) -> Result<PathBuf> {
        let path = self.repo_path(name);
        fs::create_dir_all(&path)?;
        git(&path, &["init", "-b", "main"])?;
        configure_identity(&path)?;
        commit_file(&path, "README.md", "local only\n", "Initial commit")?;
        Ok(path)
    }

    /// Directory without `.git`; invisible to discovery
    pub fn plain_dir(&self, name: &str) -> Result<PathBuf> {
        let path = self.repo_path(name);
        fs::create_dir_all(&path)?;
        create_file(&path, "notes.txt", "not a repository")?;
        Ok(path)
    }

    /// Directory with an empty `.git`; discovered but cannot be inspected
    pub fn broken_repo(&self, name: &str) -> Result<PathBuf> {
        let path = self.repo_path(name);
        fs::create_dir_all(path.join(".git"))?;
        Ok(path)
    }

    /// Settings file pointing at this fleet, with stores inside the temp dir
    pub fn write_settings(&self, extra: serde_json::Value) -> Result<PathBuf> {
        let mut settings = serde_json::json!({
            "git_path": path_str(&self.base)?,
            "data_dir": path_str(&self.temp_dir.path().join("data"))?,
            "git_timeout_seconds": 30,
        });
        if let (Some(settings), Some(extra)) = (settings.as_object_mut(), extra.as_object()) {
            for (key, value) in extra {
                settings.insert(key.clone(), value.clone());
            }
        }
        let file = self.temp_dir.path().join("settings.json");
        fs::write(&file, serde_json::to_string_pretty(&settings)?)?;
        Ok(file)
    }
}

pub fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .with_context(|| format!("non UTF-8 path {}", path.display()))
}

/// Current HEAD commit hash of a working copy
pub fn head(dir: &Path) -> Result<String> {
    git(dir, &["rev-parse", "HEAD"])
}
