//! Named repository groups, persisted as JSON.
//!
//! Groups are addressed by id or, when no id matches, by name. Two groups are
//! maintained automatically from scan and pull results: [`BEHIND_GROUP`] and
//! [`DIVERGED_GROUP`]. Free-form repository tags live in the same file.
//!
//! Saves go through a temporary file and a rename so a crash mid-write never
//! leaves a truncated store behind.

use crate::core::error::{GitFleetError, Result};
use crate::core::scan::GroupSync;
use crate::core::state::{RepoStatus, RepositoryHandle};
use crate::core::sync_state::SyncState;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub const GROUPS_FILE: &str = "repo_groups.json";
pub const BEHIND_GROUP: &str = "Behind";
pub const DIVERGED_GROUP: &str = "Diverged";
const DEFAULT_COLOR: &str = "#3B82F6";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub repos: Vec<String>,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

/// Fields to change on an existing group; `None` leaves the field alone
#[derive(Debug, Clone, Default)]
pub struct GroupUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
    pub repos: Option<Vec<String>>,
}

impl GroupUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.color.is_none() && self.repos.is_none()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct GroupsFile {
    #[serde(default)]
    groups: BTreeMap<String, Group>,
    /// Repository name to its tags, in the order they were added
    #[serde(default)]
    tags: BTreeMap<String, Vec<String>>,
}

pub struct GroupStore {
    file: PathBuf,
    data: Mutex<GroupsFile>,
}

impl GroupStore {
    /// Open the store at `file`; a missing or corrupt file starts empty
    pub fn open(file: impl Into<PathBuf>) -> Self {
        let file = file.into();
        let data = match std::fs::read_to_string(&file) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("Ignoring corrupt group store {}: {e}", file.display());
                GroupsFile::default()
            }),
            Err(_) => GroupsFile::default(),
        };
        Self {
            file,
            data: Mutex::new(data),
        }
    }

    pub fn in_directory(data_dir: &Path) -> Self {
        Self::open(data_dir.join(GROUPS_FILE))
    }

    fn save(&self, data: &GroupsFile) -> Result<()> {
        if let Some(parent) = self.file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut temp = self.file.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        std::fs::write(&temp, serde_json::to_string_pretty(data)?)?;
        std::fs::rename(&temp, &self.file)?;
        Ok(())
    }

    /// Groups sorted by name
    pub fn list(&self) -> Vec<Group> {
        let mut groups: Vec<Group> = self.data.lock().groups.values().cloned().collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        groups
    }

    pub fn get(&self, group: &str) -> Result<Group> {
        let data = self.data.lock();
        find_id(&data, group)
            .and_then(|id| data.groups.get(&id).cloned())
            .ok_or_else(|| GitFleetError::group_not_found(group))
    }

    pub fn create(&self, name: &str, repos: Vec<String>, color: Option<String>) -> Result<Group> {
        let name = group_name(name)?;
        let repos = unique_repos(repos)?;
        let mut data = self.data.lock();

        let mut stamp = Utc::now().timestamp_millis();
        while data.groups.contains_key(&format!("group_{stamp}")) {
            stamp += 1;
        }
        let group = Group {
            id: format!("group_{stamp}"),
            name,
            repos,
            color: color.unwrap_or_else(default_color),
        };
        data.groups.insert(group.id.clone(), group.clone());
        self.save(&data)?;
        log::info!("Created group '{}' ({})", group.name, group.id);
        Ok(group)
    }

    /// Rename, recolor or replace the members of a group
    pub fn update(&self, group: &str, changes: GroupUpdate) -> Result<Group> {
        let name = changes.name.as_deref().map(group_name).transpose()?;
        let repos = changes.repos.map(unique_repos).transpose()?;

        let mut data = self.data.lock();
        let id = find_id(&data, group).ok_or_else(|| GitFleetError::group_not_found(group))?;
        let entry = data
            .groups
            .get_mut(&id)
            .ok_or_else(|| GitFleetError::group_not_found(group))?;
        if let Some(name) = name {
            entry.name = name;
        }
        if let Some(color) = changes.color {
            entry.color = color;
        }
        if let Some(repos) = repos {
            entry.repos = repos;
        }
        let updated = entry.clone();
        self.save(&data)?;
        log::info!("Updated group '{}' ({})", updated.name, updated.id);
        Ok(updated)
    }

    pub fn delete(&self, group: &str) -> Result<Group> {
        let mut data = self.data.lock();
        let id = find_id(&data, group).ok_or_else(|| GitFleetError::group_not_found(group))?;
        let removed = data
            .groups
            .remove(&id)
            .ok_or_else(|| GitFleetError::group_not_found(group))?;
        self.save(&data)?;
        Ok(removed)
    }

    /// Add `repo` to a group; returns false when it was already a member
    pub fn add_repo(&self, group: &str, repo: &str) -> Result<bool> {
        check_repo_name(repo)?;
        self.modify(group, |g| {
            if g.repos.iter().any(|r| r == repo) {
                return false;
            }
            g.repos.push(repo.to_string());
            true
        })
    }

    /// Remove `repo` from a group; returns false when it was not a member
    pub fn remove_repo(&self, group: &str, repo: &str) -> Result<bool> {
        self.modify(group, |g| {
            let before = g.repos.len();
            g.repos.retain(|r| r != repo);
            g.repos.len() != before
        })
    }

    fn modify<F: FnOnce(&mut Group) -> bool>(&self, group: &str, change: F) -> Result<bool> {
        let mut data = self.data.lock();
        let id = find_id(&data, group).ok_or_else(|| GitFleetError::group_not_found(group))?;
        let changed = match data.groups.get_mut(&id) {
            Some(entry) => change(entry),
            None => return Err(GitFleetError::group_not_found(group)),
        };
        if changed {
            self.save(&data)?;
        }
        Ok(changed)
    }

    /// Names of the groups containing `repo`
    pub fn groups_for_repo(&self, repo: &str) -> Vec<String> {
        self.list()
            .into_iter()
            .filter(|g| g.repos.iter().any(|r| r == repo))
            .map(|g| g.name)
            .collect()
    }

    /// Tag `repo`; returns false when it already carried the tag
    pub fn add_tag(&self, repo: &str, tag: &str) -> Result<bool> {
        check_repo_name(repo)?;
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(GitFleetError::config_error("Tag cannot be empty"));
        }
        let mut data = self.data.lock();
        let tags = data.tags.entry(repo.to_string()).or_default();
        if tags.iter().any(|t| t == tag) {
            return Ok(false);
        }
        tags.push(tag.to_string());
        self.save(&data)?;
        Ok(true)
    }

    /// Drop a tag from `repo`; returns false when it did not carry the tag
    pub fn remove_tag(&self, repo: &str, tag: &str) -> Result<bool> {
        let mut data = self.data.lock();
        let Some(tags) = data.tags.get_mut(repo) else {
            return Ok(false);
        };
        let before = tags.len();
        tags.retain(|t| t != tag.trim());
        if tags.len() == before {
            return Ok(false);
        }
        if tags.is_empty() {
            data.tags.remove(repo);
        }
        self.save(&data)?;
        Ok(true)
    }

    pub fn tags_for_repo(&self, repo: &str) -> Vec<String> {
        self.data.lock().tags.get(repo).cloned().unwrap_or_default()
    }

    /// Every tag in use, sorted and without duplicates
    pub fn all_tags(&self) -> Vec<String> {
        let data = self.data.lock();
        let unique: BTreeSet<&String> = data.tags.values().flatten().collect();
        unique.into_iter().cloned().collect()
    }

    fn sync_auto_group(data: &mut GroupsFile, name: &str, state: SyncState, statuses: &[RepoStatus]) -> bool {
        let id = match find_id(data, name) {
            Some(id) => id,
            None if statuses.iter().any(|s| s.state == state) => {
                let id = format!("auto_{}", name.to_lowercase());
                let color = match state {
                    SyncState::Diverged => "#EF4444",
                    _ => "#F59E0B",
                };
                data.groups.insert(
                    id.clone(),
                    Group {
                        id: id.clone(),
                        name: name.to_string(),
                        repos: Vec::new(),
                        color: color.to_string(),
                    },
                );
                id
            }
            None => return false,
        };
        let Some(group) = data.groups.get_mut(&id) else {
            return false;
        };

        let mut changed = false;
        for status in statuses {
            // errors say nothing about the repository's real state; keep membership as is
            if status.is_error() {
                continue;
            }
            let member = group.repos.iter().any(|r| r == &status.name);
            if status.state == state && !member {
                group.repos.push(status.name.clone());
                changed = true;
            } else if status.state != state && member {
                group.repos.retain(|r| r != &status.name);
                changed = true;
            }
        }
        if changed {
            group.repos.sort();
        }
        changed
    }
}

impl GroupSync for GroupStore {
    fn sync_auto_groups(&self, statuses: &[RepoStatus]) -> Result<()> {
        let mut data = self.data.lock();
        let behind = Self::sync_auto_group(&mut data, BEHIND_GROUP, SyncState::Behind, statuses);
        let diverged = Self::sync_auto_group(&mut data, DIVERGED_GROUP, SyncState::Diverged, statuses);
        if behind || diverged {
            self.save(&data)?;
            log::debug!("Updated automatic groups from {} statuses", statuses.len());
        }
        Ok(())
    }
}

fn group_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GitFleetError::config_error("Group name cannot be empty"));
    }
    Ok(name.to_string())
}

/// Members must name a directory directly under the base path
fn check_repo_name(repo: &str) -> Result<()> {
    if RepositoryHandle::is_valid_name(repo) {
        Ok(())
    } else {
        Err(GitFleetError::config_error(format!(
            "'{repo}' is not a repository name"
        )))
    }
}

fn unique_repos(repos: Vec<String>) -> Result<Vec<String>> {
    let mut unique = Vec::new();
    for repo in repos {
        check_repo_name(&repo)?;
        if !unique.contains(&repo) {
            unique.push(repo);
        }
    }
    Ok(unique)
}

/// Id of the group matching `key` by id, falling back to a case-insensitive name match
fn find_id(data: &GroupsFile, key: &str) -> Option<String> {
    if data.groups.contains_key(key) {
        return Some(key.to_string());
    }
    data.groups
        .values()
        .find(|g| g.name.eq_ignore_ascii_case(key))
        .map(|g| g.id.clone())
}
