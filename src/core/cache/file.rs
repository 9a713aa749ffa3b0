//! File-backed cache: a bincode map rewritten in full on every write.

use super::CacheStore;
use crate::core::detector::DetectionRecord;
use crate::core::hasher::ContentHash;
use crate::error::CacheError;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

type CacheMap = BTreeMap<ContentHash, Vec<DetectionRecord>>;

/// Disk-backed detection cache
///
/// Every operation loads the entire map, mutates it, and rewrites the whole
/// file. Simple and atomic from a single process's point of view; not safe
/// for concurrent writers.
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    /// Create a cache backed by the file at `path`
    ///
    /// The file is created lazily on the first `set`; a missing file reads
    /// as an empty cache.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<CacheMap, CacheError> {
        if !self.path.exists() {
            return Ok(CacheMap::new());
        }
        let bytes = fs::read(&self.path).map_err(|source| CacheError::ReadFailed {
            path: self.path.clone(),
            source,
        })?;
        match bincode::deserialize(&bytes) {
            Ok(map) => Ok(map),
            Err(e) => {
                // Favor availability: a corrupt cache only costs re-detection.
                warn!(
                    "cache file {} is unreadable ({}), starting empty",
                    self.path.display(),
                    e
                );
                Ok(CacheMap::new())
            }
        }
    }

    fn store(&self, map: &CacheMap) -> Result<(), CacheError> {
        let bytes = bincode::serialize(map)
            .map_err(|e| CacheError::SerializationFailed(e.to_string()))?;
        fs::write(&self.path, bytes).map_err(|source| CacheError::WriteFailed {
            path: self.path.clone(),
            source,
        })
    }
}

impl CacheStore for FileCache {
    fn get(&self, hash: &ContentHash) -> Result<Option<Vec<DetectionRecord>>, CacheError> {
        Ok(self.load()?.remove(hash))
    }

    fn set(&self, hash: &ContentHash, detections: &[DetectionRecord]) -> Result<(), CacheError> {
        let mut map = self.load()?;
        map.insert(hash.clone(), detections.to_vec());
        self.store(&map)
    }
}
