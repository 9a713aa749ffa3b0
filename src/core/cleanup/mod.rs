//! # Cleanup Module
//!
//! Deletes intermediate results after archiving. Errors are logged and
//! swallowed; cleanup never aborts a run.

use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Delete a file or a directory tree
///
/// Returns true if something was deleted.
pub fn remove_path(path: &Path) -> bool {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else if path.is_file() {
        fs::remove_file(path)
    } else {
        warn!("nothing to delete at {}", path.display());
        return false;
    };

    match result {
        Ok(()) => {
            info!("deleted {}", path.display());
            true
        }
        Err(e) => {
            warn!("failed to delete {}: {}", path.display(), e);
            false
        }
    }
}

/// Delete a directory's contents but keep the directory itself
pub fn clear_directory(path: &Path) -> bool {
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("cannot read {}: {}", path.display(), e);
            return false;
        }
    };

    let mut cleared = true;
    for entry in entries.flatten() {
        if !remove_path(&entry.path()) {
            cleared = false;
        }
    }
    cleared
}
