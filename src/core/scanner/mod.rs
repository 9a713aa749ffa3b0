//! # Scanner Module
//!
//! Discovers image files beneath a directory.
//!
//! The scan is extension-based only; no decoding happens here. A single
//! file path is accepted as a one-element scan so the CLI can point at one
//! image directly.

use crate::error::ScanError;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// File extensions treated as images
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Configuration for the directory scanner
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to descend into subdirectories
    pub recursive: bool,
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            follow_symlinks: false,
        }
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Collect image files under `root`, sorted for deterministic processing
///
/// `root` may also be a single image file. Unreadable entries are logged
/// and skipped; a missing root is an error.
pub fn scan_images(root: &Path, config: &ScanConfig) -> Result<Vec<PathBuf>, ScanError> {
    if !root.exists() {
        return Err(ScanError::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }

    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let max_depth = if config.recursive { usize::MAX } else { 1 };
    let mut images = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(config.follow_symlinks)
        .max_depth(max_depth)
        .sort_by_file_name()
    {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if entry.file_type().is_file() && is_image(path) {
                    images.push(path.to_path_buf());
                }
            }
            Err(e) => {
                warn!("skipping unreadable entry under {}: {}", root.display(), e);
            }
        }
    }

    Ok(images)
}
