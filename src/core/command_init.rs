//! Shared setup for every CLI command.
//!
//! [`FleetContext::initialize`] loads the settings, applies command-line
//! overrides, and opens the group store and activity log, wiring the group
//! store into the monitor so scans and pulls keep the automatic groups current.
//!
//! # Initialization Steps
//! 1. **Settings**: `--config` file or the default location, created if missing
//! 2. **Overrides**: `--path` replaces the configured base directory
//! 3. **Stores**: group store and activity log under the data directory
//! 4. **Monitor**: cache, inspector and pull executor from the settings

use crate::core::{
    activity::ActivityLog, config::Settings, error::Result, groups::GroupStore,
    monitor::RepoMonitor, scan::GroupSync,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Options every command accepts
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub path: Option<PathBuf>,
    pub json: bool,
}

impl GlobalOptions {
    /// `--config`, or the default settings location
    pub fn config_file(&self) -> Result<PathBuf> {
        match &self.config {
            Some(file) => Ok(file.clone()),
            None => Settings::default_file(),
        }
    }
}

pub struct FleetContext {
    pub settings: Settings,
    pub monitor: RepoMonitor,
    pub groups: Arc<GroupStore>,
    pub activity: ActivityLog,
    pub json: bool,
}

impl FleetContext {
    pub fn initialize(options: &GlobalOptions) -> Result<Self> {
        let mut settings = Settings::load_or_create(options.config.as_deref())?;
        if let Some(path) = &options.path {
            settings.git_path = path.to_string_lossy().into_owned();
        }
        log::debug!("Using repositories under {}", settings.base_path().display());

        let data_dir = settings.data_directory()?;
        let groups = Arc::new(GroupStore::in_directory(&data_dir));
        let activity = ActivityLog::in_directory(&data_dir, settings.max_activity_log_entries)?;

        let sync: Arc<dyn GroupSync> = groups.clone();
        let monitor = RepoMonitor::from_settings(&settings).with_groups(sync);

        Ok(Self {
            settings,
            monitor,
            groups,
            activity,
            json: options.json,
        })
    }
}
