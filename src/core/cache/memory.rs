//! In-memory cache backend for testing.

use super::CacheStore;
use crate::core::detector::DetectionRecord;
use crate::core::hasher::ContentHash;
use crate::error::CacheError;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// In-memory cache backend
///
/// Useful for testing and scenarios where persistence isn't needed.
#[derive(Default)]
pub struct InMemoryCache {
    entries: RwLock<BTreeMap<ContentHash, Vec<DetectionRecord>>>,
}

impl InMemoryCache {
    /// Create a new empty in-memory cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached hashes
    pub fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for InMemoryCache {
    fn get(&self, hash: &ContentHash) -> Result<Option<Vec<DetectionRecord>>, CacheError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| CacheError::SerializationFailed("cache lock poisoned".to_string()))?;
        Ok(entries.get(hash).cloned())
    }

    fn set(&self, hash: &ContentHash, detections: &[DetectionRecord]) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| CacheError::SerializationFailed("cache lock poisoned".to_string()))?;
        entries.insert(hash.clone(), detections.to_vec());
        Ok(())
    }
}
