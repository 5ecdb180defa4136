//! Predefined fleet scenarios
//!
//! Each scenario builds one working copy in a known relationship to its
//! remote. Tracking refs are fetched so the state is visible without a pull.

#![allow(dead_code)]

use super::repository::*;
use anyhow::Result;
use std::path::PathBuf;

/// Scenario A: clean clone, 3 commits behind
pub fn behind_repo(fleet: &TestFleet, name: &str) -> Result<PathBuf> {
    let path = fleet.tracked_repo(name)?;
    fleet.push_upstream(name, 3)?;
    fleet.fetch(name)?;
    Ok(path)
}

/// Scenario B: 2 local commits, 2 upstream commits
pub fn diverged_repo(fleet: &TestFleet, name: &str) -> Result<PathBuf> {
    let path = fleet.tracked_repo(name)?;
    commit_many(&path, "local", 2)?;
    fleet.push_upstream(name, 2)?;
    fleet.fetch(name)?;
    Ok(path)
}

/// Scenario C: commits but no remote
pub fn no_remote_repo(fleet: &TestFleet, name: &str) -> Result<PathBuf> {
    fleet.local_only_repo(name)
}

pub fn up_to_date_repo(fleet: &TestFleet, name: &str) -> Result<PathBuf> {
    fleet.tracked_repo(name)
}

pub fn ahead_repo(fleet: &TestFleet, name: &str) -> Result<PathBuf> {
    let path = fleet.tracked_repo(name)?;
    commit_many(&path, "local", 1)?;
    Ok(path)
}

/// Local and upstream commits both edit `shared.txt`
pub fn conflicting_repo(fleet: &TestFleet, name: &str) -> Result<PathBuf> {
    let path = fleet.tracked_repo(name)?;
    commit_file(&path, "shared.txt", "local version\n", "Local edit")?;
    fleet.push_upstream_edit(name, "shared.txt", "upstream version\n")?;
    fleet.fetch(name)?;
    Ok(path)
}

/// Behind, diverged, no-remote, up-to-date and one broken directory
pub fn mixed_fleet() -> Result<TestFleet> {
    let fleet = TestFleet::new()?;
    behind_repo(&fleet, "alpha")?;
    diverged_repo(&fleet, "bravo")?;
    no_remote_repo(&fleet, "charlie")?;
    up_to_date_repo(&fleet, "delta")?;
    fleet.broken_repo("echo")?;
    fleet.plain_dir("notes")?;
    Ok(fleet)
}
