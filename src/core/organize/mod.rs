//! # Organize Module
//!
//! Moves or copies classified files into one folder per classification.
//!
//! Missing sources and per-file transfer failures are logged and skipped;
//! a partially organized tree is acceptable because the persisted state,
//! not the folder layout, is the source of truth for what was processed.

use crate::core::classifier::ProcessedReport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Operation mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OperationMode {
    /// Move files to destination
    #[default]
    Move,
    /// Copy files to destination (keep originals)
    Copy,
}

/// Per-classification transfer results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizeSummary {
    /// Destination paths actually transferred, keyed by classification
    pub transferred: BTreeMap<String, Vec<PathBuf>>,
    /// Sources skipped because they no longer exist
    pub skipped: usize,
    /// Per-file errors (logged, non-fatal)
    pub errors: Vec<String>,
}

impl OrganizeSummary {
    pub fn files_transferred(&self) -> usize {
        self.transferred.values().map(Vec::len).sum()
    }
}

/// Create one destination folder per classification under `base`
///
/// Returns the folders that exist afterwards; creation failures are logged
/// and skipped.
pub fn create_class_folders(names: impl IntoIterator<Item = String>, base: &Path) -> Vec<PathBuf> {
    let mut created = Vec::new();
    for name in names {
        let folder = base.join(&name);
        match fs::create_dir_all(&folder) {
            Ok(()) => created.push(folder),
            Err(e) => warn!("failed to create folder {}: {}", folder.display(), e),
        }
    }
    created
}

/// Move or copy every classified file into `<base>/<classification>/`
pub fn organize(report: &ProcessedReport, base: &Path, mode: OperationMode) -> OrganizeSummary {
    let mut summary = OrganizeSummary::default();

    for record in &report.results {
        let target_folder = base.join(&record.classification);
        if let Err(e) = fs::create_dir_all(&target_folder) {
            let message = format!("failed to create {}: {}", target_folder.display(), e);
            warn!("{message}");
            summary.errors.push(message);
            continue;
        }

        let transferred = summary
            .transferred
            .entry(record.classification.clone())
            .or_default();

        for source in &record.files {
            if !source.is_file() {
                warn!("file not found, skipping: {}", source.display());
                summary.skipped += 1;
                continue;
            }

            let Some(name) = source.file_name() else {
                summary.skipped += 1;
                continue;
            };
            let target = target_folder.join(name);
            if target.exists() {
                debug!(
                    "{} already exists, overwriting with {}",
                    target.display(),
                    source.display()
                );
            }

            match transfer(source, &target, mode) {
                Ok(()) => transferred.push(target),
                Err(e) => {
                    let message = format!("failed to transfer {}: {}", source.display(), e);
                    warn!("{message}");
                    summary.errors.push(message);
                }
            }
        }
    }

    summary
}

fn transfer(source: &Path, target: &Path, mode: OperationMode) -> std::io::Result<()> {
    match mode {
        OperationMode::Copy => fs::copy(source, target).map(|_| ()),
        OperationMode::Move => fs::rename(source, target).or_else(|_| {
            // rename fails across filesystems, fall back to copy + delete
            fs::copy(source, target)?;
            fs::remove_file(source)
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classifier::ClassificationRecord;
    use crate::core::hasher::ContentHash;
    use tempfile::TempDir;

    fn report_for(files: Vec<PathBuf>, classification: &str) -> ProcessedReport {
        ProcessedReport {
            results: vec![ClassificationRecord {
                hash: ContentHash::of_bytes(b"x"),
                files,
                distinct_classes: vec![],
                classification: classification.to_string(),
            }],
            metadata: Default::default(),
        }
    }

    #[test]
    fn copy_keeps_the_original() {
        let src_dir = TempDir::new().unwrap();
        let dest_dir = TempDir::new().unwrap();
        let source = src_dir.path().join("cat.jpg");
        fs::write(&source, b"cat bytes").unwrap();

        let report = report_for(vec![source.clone()], "cat");
        let summary = organize(&report, dest_dir.path(), OperationMode::Copy);

        assert_eq!(summary.files_transferred(), 1);
        assert!(source.exists());
        assert!(dest_dir.path().join("cat/cat.jpg").exists());
    }

    #[test]
    fn move_removes_the_original() {
        let src_dir = TempDir::new().unwrap();
        let dest_dir = TempDir::new().unwrap();
        let source = src_dir.path().join("dog.jpg");
        fs::write(&source, b"dog bytes").unwrap();

        let report = report_for(vec![source.clone()], "dog");
        let summary = organize(&report, dest_dir.path(), OperationMode::Move);

        assert_eq!(summary.files_transferred(), 1);
        assert!(!source.exists());
        assert!(dest_dir.path().join("dog/dog.jpg").exists());
    }

    #[test]
    fn colliding_basenames_overwrite_within_a_class_folder() {
        let src_a = TempDir::new().unwrap();
        let src_b = TempDir::new().unwrap();
        let dest_dir = TempDir::new().unwrap();
        let first = src_a.path().join("cat.jpg");
        let second = src_b.path().join("cat.jpg");
        fs::write(&first, b"first").unwrap();
        fs::write(&second, b"second").unwrap();

        let report = report_for(vec![first, second], "cat");
        let summary = organize(&report, dest_dir.path(), OperationMode::Copy);

        // Last transfer wins; both count as transferred, none as errors.
        assert_eq!(summary.files_transferred(), 2);
        assert!(summary.errors.is_empty());
        assert_eq!(
            fs::read(dest_dir.path().join("cat/cat.jpg")).unwrap(),
            b"second"
        );
    }

    #[test]
    fn missing_sources_are_skipped_not_fatal() {
        let dest_dir = TempDir::new().unwrap();
        let report = report_for(vec![PathBuf::from("/no/such/photo.jpg")], "others");

        let summary = organize(&report, dest_dir.path(), OperationMode::Move);

        assert_eq!(summary.files_transferred(), 0);
        assert_eq!(summary.skipped, 1);
        assert!(summary.errors.is_empty());
    }

    #[test]
    fn creates_folders_for_all_names() {
        let base = TempDir::new().unwrap();
        let created = create_class_folders(
            ["person".to_string(), "others".to_string()],
            base.path(),
        );

        assert_eq!(created.len(), 2);
        assert!(base.path().join("person").is_dir());
        assert!(base.path().join("others").is_dir());
    }
}
