//! # Classifier Module
//!
//! Assigns a single classification label per content hash from its
//! accumulated detections, and flags cross-hash path collisions.
//!
//! ## Classification rule
//! 1. Any `"person"` detection wins outright
//! 2. Otherwise the most frequent label wins; ties are broken by a uniform
//!    random choice among the tied labels (genuinely nondeterministic, so
//!    the RNG is injected and tests can seed it)
//! 3. No detections at all classifies as `"others"`
//!
//! A path claimed by two different hashes during one pass signals stale
//! state, not a legitimate copy; both hashes land in the duplicate set.
//!
//! The whole pass threads an explicit accumulator through a fold over the
//! entries, so it is re-entrant and testable in isolation.

use crate::core::hasher::ContentHash;
use crate::core::state::{HashEntry, PersistedState};
use crate::error::StateError;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// Label that takes absolute priority when present
pub const PERSON_LABEL: &str = "person";

/// Classification for hashes with no detections at all
pub const FALLBACK_LABEL: &str = "others";

/// One classified hash, recomputed fully on every pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub hash: ContentHash,
    pub files: Vec<PathBuf>,
    /// Distinct detected labels, in first-detection order
    #[serde(rename = "class")]
    pub distinct_classes: Vec<String>,
    pub classification: String,
}

/// Pass-level metadata emitted alongside the records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Every file path seen across all entries
    pub all_files: BTreeSet<PathBuf>,
    /// Hashes flagged because a path was claimed by more than one hash
    pub duplicates: BTreeSet<ContentHash>,
    /// Distinct classifications encountered; destination folders to create
    pub folder_names: BTreeSet<String>,
}

/// Full output of a classification pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessedReport {
    pub results: Vec<ClassificationRecord>,
    pub metadata: ReportMetadata,
}

impl ProcessedReport {
    /// Write the report as pretty JSON
    pub fn save_json(&self, path: &Path) -> Result<(), StateError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| StateError::SerializationFailed(e.to_string()))?;
        fs::write(path, json).map_err(|source| StateError::WriteFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read a report written by [`ProcessedReport::save_json`]
    pub fn load_json(path: &Path) -> Result<Self, StateError> {
        let text = fs::read_to_string(path).map_err(|source| StateError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|e| StateError::SerializationFailed(e.to_string()))
    }
}

/// Accumulator threaded through the classification fold
#[derive(Default)]
struct ClassifyAccumulator {
    path_owners: HashMap<PathBuf, ContentHash>,
    metadata: ReportMetadata,
    results: Vec<ClassificationRecord>,
}

impl ClassifyAccumulator {
    fn observe<R: Rng + ?Sized>(
        mut self,
        hash: &ContentHash,
        entry: &HashEntry,
        rng: &mut R,
    ) -> Self {
        for file in &entry.files {
            if let Some(owner) = self.path_owners.get(file) {
                if owner != hash {
                    self.metadata.duplicates.insert(owner.clone());
                    self.metadata.duplicates.insert(hash.clone());
                }
            }
            self.path_owners.insert(file.clone(), hash.clone());
            self.metadata.all_files.insert(file.clone());
        }

        let (distinct_classes, classification) = classify_detections(entry, rng);
        self.metadata.folder_names.insert(classification.clone());
        self.results.push(ClassificationRecord {
            hash: hash.clone(),
            files: entry.files.clone(),
            distinct_classes,
            classification,
        });
        self
    }

    fn finish(self) -> ProcessedReport {
        ProcessedReport {
            results: self.results,
            metadata: self.metadata,
        }
    }
}

/// Classify every entry in `state`
///
/// Entries are visited in hash order, so with a seeded RNG the whole pass
/// is reproducible.
pub fn classify<R: Rng + ?Sized>(state: &PersistedState, rng: &mut R) -> ProcessedReport {
    state
        .iter()
        .fold(ClassifyAccumulator::default(), |acc, (hash, entry)| {
            acc.observe(hash, entry, rng)
        })
        .finish()
}

fn classify_detections<R: Rng + ?Sized>(entry: &HashEntry, rng: &mut R) -> (Vec<String>, String) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut distinct: Vec<String> = Vec::new();
    let mut person_found = false;

    for detection in &entry.detections {
        let label = detection.class_label.as_str();
        if label == PERSON_LABEL {
            person_found = true;
        }
        let count = counts.entry(label).or_insert(0);
        if *count == 0 {
            distinct.push(label.to_string());
        }
        *count += 1;
    }

    let classification = if person_found {
        PERSON_LABEL.to_string()
    } else if let Some(&max_count) = counts.values().max() {
        let mut tied: Vec<&str> = counts
            .iter()
            .filter(|(_, &count)| count == max_count)
            .map(|(&label, _)| label)
            .collect();
        // Sorted candidates so a seeded RNG pins the choice.
        tied.sort_unstable();
        tied.choose(rng)
            .expect("tied labels are non-empty when counts are")
            .to_string()
    } else {
        FALLBACK_LABEL.to_string()
    };

    (distinct, classification)
}
