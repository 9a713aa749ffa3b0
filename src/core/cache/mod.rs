//! # Cache Module
//!
//! Persists per-hash detection results so identical content is never
//! re-inferred, even across process runs.
//!
//! ## Backends
//! - `FileCache` - whole-file bincode store on disk
//! - `InMemoryCache` - for testing
//!
//! ## Limitations
//! The file backend is a full load / mutate / rewrite on every `set`.
//! Readers never see partial state, but there is no cross-process locking:
//! concurrent writers against the same cache file can lose updates. One
//! process per cache file is assumed.

mod file;
mod memory;

pub use file::FileCache;
pub use memory::InMemoryCache;

use crate::core::detector::DetectionRecord;
use crate::core::hasher::ContentHash;
use crate::error::CacheError;

/// Trait for detection-cache backends
pub trait CacheStore: Send + Sync {
    /// Get the cached detections for a hash, if any
    fn get(&self, hash: &ContentHash) -> Result<Option<Vec<DetectionRecord>>, CacheError>;

    /// Store detections for a hash, unconditionally overwriting any prior value
    fn set(&self, hash: &ContentHash, detections: &[DetectionRecord]) -> Result<(), CacheError>;
}
