//! Persistent settings for git-fleet.
//!
//! Settings are a JSON document at `<config dir>/git-fleet/settings.json`. Keys
//! missing from the file take their defaults, so older files keep loading as new
//! keys are added. A missing file is created with the defaults on first load.
//! Single keys are changed with [`Settings::set`]; [`Settings::reset`] writes
//! the defaults back.

use crate::core::dirs::{default_git_path, expand_home, get_config_directory, get_data_directory};
use crate::core::error::{GitFleetError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const SETTINGS_FILE: &str = "settings.json";

/// Keys accepted by [`Settings::set`]
pub const SETTING_KEYS: &[&str] = &[
    "git_path",
    "cache_ttl_seconds",
    "parallel_workers",
    "batch_size",
    "git_timeout_seconds",
    "max_activity_log_entries",
    "data_dir",
];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Base directory scanned for repositories; `~` is expanded
    pub git_path: String,
    pub cache_ttl_seconds: u64,
    pub parallel_workers: usize,
    pub batch_size: usize,
    pub git_timeout_seconds: u64,
    pub max_activity_log_entries: usize,
    /// Directory for the activity log and group store; platform data dir when unset
    pub data_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            git_path: default_git_path().to_string_lossy().into_owned(),
            cache_ttl_seconds: 600,
            parallel_workers: 10,
            batch_size: 10,
            git_timeout_seconds: 60,
            max_activity_log_entries: 1000,
            data_dir: None,
        }
    }
}

impl Settings {
    pub fn default_file() -> Result<PathBuf> {
        Ok(get_config_directory()?.join(SETTINGS_FILE))
    }

    /// Load settings from `path` (or the default location), writing defaults if the file is absent
    pub fn load_or_create(path: Option<&Path>) -> Result<Self> {
        let config_file = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_file()?,
        };

        if config_file.exists() {
            let content = std::fs::read_to_string(&config_file)?;
            let settings: Settings = serde_json::from_str(&content).map_err(|e| {
                GitFleetError::config_error(format!("{}: {e}", config_file.display()))
            })?;
            settings.validate()?;
            log::debug!("Loaded settings from {}", config_file.display());
            Ok(settings)
        } else {
            let settings = Self::default();
            settings.save_to(&config_file)?;
            log::info!("Created default settings at {}", config_file.display());
            Ok(settings)
        }
    }

    /// Overwrite `config_file` with the defaults
    pub fn reset(config_file: &Path) -> Result<Self> {
        let settings = Self::default();
        settings.save_to(config_file)?;
        log::info!("Reset settings at {}", config_file.display());
        Ok(settings)
    }

    /// Change one key from its command-line form; nothing changes unless the result is valid
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut updated = self.clone();
        match key {
            "git_path" => {
                if !expand_home(value).is_dir() {
                    return Err(GitFleetError::config_error(format!(
                        "git_path does not exist: {value}"
                    )));
                }
                updated.git_path = value.to_string();
            }
            "cache_ttl_seconds" => updated.cache_ttl_seconds = parse_value(key, value)?,
            "parallel_workers" => updated.parallel_workers = parse_value(key, value)?,
            "batch_size" => updated.batch_size = parse_value(key, value)?,
            "git_timeout_seconds" => updated.git_timeout_seconds = parse_value(key, value)?,
            "max_activity_log_entries" => {
                updated.max_activity_log_entries = parse_value(key, value)?
            }
            // empty falls back to the platform data directory
            "data_dir" => {
                updated.data_dir = match value.trim() {
                    "" => None,
                    dir => Some(expand_home(dir)),
                }
            }
            _ => {
                return Err(GitFleetError::config_error(format!(
                    "Unknown setting '{key}' (expected one of: {})",
                    SETTING_KEYS.join(", ")
                )))
            }
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    pub fn save_to(&self, config_file: &Path) -> Result<()> {
        if let Some(parent) = config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_file, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.parallel_workers == 0 {
            return Err(GitFleetError::config_error("parallel_workers must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(GitFleetError::config_error("batch_size must be at least 1"));
        }
        if self.git_timeout_seconds == 0 {
            return Err(GitFleetError::config_error("git_timeout_seconds must be at least 1"));
        }
        Ok(())
    }

    pub fn base_path(&self) -> PathBuf {
        expand_home(&self.git_path)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.git_timeout_seconds)
    }

    pub fn data_directory(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => get_data_directory(),
        }
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| GitFleetError::config_error(format!("Invalid value for {key}: {e}")))
}
