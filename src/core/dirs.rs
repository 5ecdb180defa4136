use crate::core::error::{GitFleetError, Result};
use std::path::PathBuf;

const APP_DIR: &str = "git-fleet";

fn home() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| GitFleetError::config_error("Cannot determine home directory"))
}

/// Where `settings.json` lives
pub fn get_config_directory() -> Result<PathBuf> {
    let base = match std::env::consts::OS {
        "linux" | "freebsd" | "netbsd" | "openbsd" => match std::env::var("XDG_CONFIG_HOME") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => home()?.join(".config"),
        },
        "macos" => home()?.join("Library/Application Support"),
        _ => dirs::config_dir()
            .ok_or_else(|| GitFleetError::config_error("Cannot determine config directory"))?,
    };

    Ok(base.join(APP_DIR))
}

/// Where the activity log and group store live
pub fn get_data_directory() -> Result<PathBuf> {
    let base = match std::env::consts::OS {
        "linux" | "freebsd" | "netbsd" | "openbsd" => match std::env::var("XDG_DATA_HOME") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => home()?.join(".local/share"),
        },
        "macos" => home()?.join("Library/Application Support"),
        _ => dirs::data_dir()
            .ok_or_else(|| GitFleetError::config_error("Cannot determine data directory"))?,
    };

    Ok(base.join(APP_DIR))
}

/// `~/git`, the default base directory for repositories
pub fn default_git_path() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join("git")
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => {
            let home = dirs::home_dir().unwrap_or_default();
            home.join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(path),
    }
}
