//! # State Module
//!
//! The durable cross-run snapshot: one [`HashEntry`] per content hash,
//! persisted as bincode and written atomically (temp file + rename) so a
//! crash mid-write never leaves a truncated state file.
//!
//! Entries whose files have all disappeared are kept: detection history is
//! never evicted unless a new file with the same content shows up and
//! replaces the stale path list.

use crate::core::detector::DetectionRecord;
use crate::core::hasher::ContentHash;
use crate::error::StateError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Everything known about one content hash
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HashEntry {
    /// Paths currently believed to contain this content (no duplicates)
    pub files: Vec<PathBuf>,
    /// Accumulated detections; populated exactly once per hash
    pub detections: Vec<DetectionRecord>,
}

/// The persisted hash → entry mapping
///
/// Backed by a `BTreeMap` so iteration, serialization, and exports are
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersistedState {
    entries: BTreeMap<ContentHash, HashEntry>,
}

impl PersistedState {
    /// Empty state (first run)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.entries.contains_key(hash)
    }

    pub fn get(&self, hash: &ContentHash) -> Option<&HashEntry> {
        self.entries.get(hash)
    }

    pub fn get_mut(&mut self, hash: &ContentHash) -> Option<&mut HashEntry> {
        self.entries.get_mut(hash)
    }

    /// The entry for `hash`, created empty if absent
    pub fn entry_mut(&mut self, hash: &ContentHash) -> &mut HashEntry {
        self.entries.entry(hash.clone()).or_default()
    }

    pub fn insert(&mut self, hash: ContentHash, entry: HashEntry) {
        self.entries.insert(hash, entry);
    }

    pub fn remove(&mut self, hash: &ContentHash) -> Option<HashEntry> {
        self.entries.remove(hash)
    }

    /// Iterate entries in hash order
    pub fn iter(&self) -> impl Iterator<Item = (&ContentHash, &HashEntry)> {
        self.entries.iter()
    }

    /// Collapse any accidental repeats in every entry's file list,
    /// preserving first-seen order
    pub fn dedupe_files(&mut self) {
        for entry in self.entries.values_mut() {
            let mut seen = HashSet::new();
            entry.files.retain(|path| seen.insert(path.clone()));
        }
    }

    /// Load state from `path`
    ///
    /// A missing file is a normal first run and yields empty state. A
    /// corrupt file also yields empty state with a warning - availability
    /// over strictness, since detections are still recoverable from the
    /// cache.
    pub fn load(path: &Path) -> Self {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::new(),
            Err(e) => {
                warn!("cannot read state file {}: {}", path.display(), e);
                return Self::new();
            }
        };
        match bincode::deserialize(&bytes) {
            Ok(state) => state,
            Err(e) => {
                warn!(
                    "state file {} is unreadable ({}), starting empty",
                    path.display(),
                    e
                );
                Self::new()
            }
        }
    }

    /// Persist state to `path` atomically
    ///
    /// Serializes to a sibling temp file and renames it over the target, so
    /// readers never observe a partially written file.
    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StateError::WriteFailed {
                    path: path.to_path_buf(),
                    source,
                })?;
            }
        }

        let bytes = bincode::serialize(self)
            .map_err(|e| StateError::SerializationFailed(e.to_string()))?;

        let tmp = temp_sibling(path);
        fs::write(&tmp, bytes).map_err(|source| StateError::WriteFailed {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, path).map_err(|source| StateError::WriteFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Export the full state as pretty JSON, losslessly
    ///
    /// Same schema as the binary file: an object keyed by hash, each value
    /// holding `files` and `detections`. For inspection and downstream
    /// tooling.
    pub fn export_json(&self, path: &Path) -> Result<(), StateError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| StateError::SerializationFailed(e.to_string()))?;
        fs::write(path, json).map_err(|source| StateError::WriteFailed {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(label: &str) -> DetectionRecord {
        DetectionRecord {
            bounding_box: [0.0, 1.0, 2.0, 3.0],
            class_label: label.to_string(),
            confidence: 0.5,
        }
    }

    fn sample_state() -> PersistedState {
        let mut state = PersistedState::new();
        state.insert(
            ContentHash::of_bytes(b"one"),
            HashEntry {
                files: vec![PathBuf::from("img/a.jpg"), PathBuf::from("img/b.jpg")],
                detections: vec![record("cat"), record("cat"), record("dog")],
            },
        );
        state.insert(
            ContentHash::of_bytes(b"two"),
            HashEntry {
                files: vec![PathBuf::from("img/c.jpg")],
                detections: vec![],
            },
        );
        state
    }

    #[test]
    fn save_then_load_round_trips() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("detections.bin");
        let state = sample_state();

        state.save(&path).unwrap();
        let loaded = PersistedState::load(&path);

        assert_eq!(loaded, state);
    }

    #[test]
    fn load_of_missing_file_is_empty() {
        let state = PersistedState::load(Path::new("/no/such/state.bin"));
        assert!(state.is_empty());
    }

    #[test]
    fn load_of_corrupt_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("detections.bin");
        fs::write(&path, b"garbage").unwrap();

        let state = PersistedState::load(&path);
        assert!(state.is_empty());
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("detections.bin");
        sample_state().save(&path).unwrap();

        assert!(path.exists());
        assert!(!temp_sibling(&path).exists());
    }

    #[test]
    fn stray_temp_file_does_not_affect_saved_state() {
        // Simulates a crash after the temp file was written but before the
        // rename: the original file must stay untouched and valid.
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("detections.bin");
        let state = sample_state();
        state.save(&path).unwrap();

        fs::write(temp_sibling(&path), b"half-written junk").unwrap();

        let loaded = PersistedState::load(&path);
        assert_eq!(loaded, state);
    }

    #[test]
    fn dedupe_files_preserves_first_seen_order() {
        let mut state = PersistedState::new();
        let hash = ContentHash::of_bytes(b"x");
        state.insert(
            hash.clone(),
            HashEntry {
                files: vec![
                    PathBuf::from("a.jpg"),
                    PathBuf::from("b.jpg"),
                    PathBuf::from("a.jpg"),
                ],
                detections: vec![],
            },
        );

        state.dedupe_files();
        assert_eq!(
            state.get(&hash).unwrap().files,
            vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg")]
        );
    }

    #[test]
    fn json_export_matches_state_schema() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("detections.json");
        let state = sample_state();
        state.export_json(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 2);

        let entry = &object[ContentHash::of_bytes(b"one").as_str()];
        assert_eq!(entry["files"].as_array().unwrap().len(), 2);
        assert_eq!(entry["detections"][0]["class_label"], "cat");
    }
}
