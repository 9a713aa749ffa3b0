//! # Reconcile Module
//!
//! Merges a fresh directory scan against previously persisted state.
//!
//! File paths are not stable identity - users rename and reorganize folders
//! between runs - so identity is content-derived. Reconciliation decides
//! which scanned files are genuinely new (need detection), which are
//! renamed/moved survivors of known content, and which are extra copies of
//! content that still exists elsewhere. Re-running on an unchanged tree
//! yields identical state and an empty pending list.

use crate::core::hasher::ContentHash;
use crate::core::state::{HashEntry, PersistedState};
use crate::error::HashError;
use std::path::PathBuf;
use tracing::debug;

/// What a reconciliation pass decided
#[derive(Debug, Clone, Default)]
pub struct ReconcileOutcome {
    /// Paths whose content has never been seen; these need detection
    pub pending: Vec<PathBuf>,
    /// Known hashes whose only surviving path is a new one (rename/move)
    pub renamed: usize,
    /// New paths added alongside still-existing ones (copies)
    pub copied: usize,
}

/// Merge `scanned` into `state`
///
/// For each scanned file:
/// - known hash, none of its recorded files still on disk: the file is the
///   sole survivor, the old path list is replaced with it
/// - known hash, some recorded file still on disk: the file is an extra
///   copy and joins the list (if not already present)
/// - unseen hash: a fresh entry with empty detections; the path is returned
///   as pending
///
/// Entries whose files are all gone and never replaced are left alone -
/// detection history is kept, not pruned.
///
/// Hashing failures abort the pass; a half-merged state is never saved by
/// the caller in that case.
pub fn reconcile(
    state: &mut PersistedState,
    scanned: &[PathBuf],
) -> Result<ReconcileOutcome, HashError> {
    let mut outcome = ReconcileOutcome::default();

    for path in scanned {
        let hash = ContentHash::of_file(path)?;

        if !state.contains(&hash) {
            state.insert(
                hash,
                HashEntry {
                    files: vec![path.clone()],
                    detections: Vec::new(),
                },
            );
            outcome.pending.push(path.clone());
            continue;
        }

        let entry = state.entry_mut(&hash);
        let any_survivor = entry.files.iter().any(|old| old.exists());

        if !any_survivor {
            debug!(
                "content {} reappeared as {} (rename/move)",
                hash,
                path.display()
            );
            entry.files = vec![path.clone()];
            outcome.renamed += 1;
        } else if !entry.files.contains(path) {
            debug!("content {} copied to {}", hash, path.display());
            entry.files.push(path.clone());
            outcome.copied += 1;
        }
    }

    // Defensive: collapse any accidental repeats from older state files.
    state.dedupe_files();

    Ok(outcome)
}
