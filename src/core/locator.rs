//! Discovery of working copies one level below a base directory.

use crate::core::{
    error::{GitFleetError, Result},
    state::RepositoryHandle,
};
use std::fs;
use std::path::Path;

const GIT_DIR: &str = ".git";

/// Immediate subdirectories of `base` that contain a `.git` entry, sorted by name.
///
/// Entries that cannot be read, are not directories, or have non-UTF-8 names are
/// skipped. Only an unreadable `base` is an error.
pub fn locate_repositories(base: &Path) -> Result<Vec<RepositoryHandle>> {
    let entries = fs::read_dir(base).map_err(|e| GitFleetError::directory(base, e))?;

    let mut handles = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("Skipping unreadable entry in {}: {e}", base.display());
                continue;
            }
        };

        // symlinked entries are excluded
        match entry.file_type() {
            Ok(file_type) if file_type.is_dir() => {}
            _ => continue,
        }

        let path = entry.path();
        if fs::metadata(path.join(GIT_DIR)).is_err() {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) => handles.push(RepositoryHandle::new(name, path)),
            Err(raw) => log::debug!("Skipping repository with non UTF-8 name {raw:?}"),
        }
    }

    handles.sort_by(|a, b| a.name.cmp(&b.name));
    log::debug!(
        "Located {} repositories under {}",
        handles.len(),
        base.display()
    );
    Ok(handles)
}
