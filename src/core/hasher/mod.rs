//! # Hasher Module
//!
//! Content hashing for file identity.
//!
//! A [`ContentHash`] is a blake3 digest of a file's raw bytes, hex-encoded.
//! Two byte-identical files always share one hash regardless of path or
//! name - this is the sole mechanism for detecting renames, moves, and
//! copies across runs.

use crate::error::HashError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

/// A stable identity key for a file's content
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Hash the full content of the file at `path`
    ///
    /// Streams the file through blake3, so large images don't need to be
    /// held in memory.
    pub fn of_file(path: &Path) -> Result<Self, HashError> {
        let file = File::open(path).map_err(|source| HashError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);
        let mut hasher = blake3::Hasher::new();
        io::copy(&mut reader, &mut hasher).map_err(|source| HashError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self(hasher.finalize().to_hex().to_string()))
    }

    /// Hash a byte slice directly (used by tests and tooling)
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    /// The lowercase hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn identical_content_hashes_equal_across_paths() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("original.jpg");
        let b = temp.path().join("renamed copy.jpg");
        fs::write(&a, b"jpeg bytes").unwrap();
        fs::write(&b, b"jpeg bytes").unwrap();

        assert_eq!(
            ContentHash::of_file(&a).unwrap(),
            ContentHash::of_file(&b).unwrap()
        );
    }

    #[test]
    fn different_content_hashes_differ() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.jpg");
        let b = temp.path().join("b.jpg");
        fs::write(&a, b"one").unwrap();
        fs::write(&b, b"two").unwrap();

        assert_ne!(
            ContentHash::of_file(&a).unwrap(),
            ContentHash::of_file(&b).unwrap()
        );
    }

    #[test]
    fn file_hash_matches_byte_hash() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.jpg");
        fs::write(&a, b"payload").unwrap();

        assert_eq!(
            ContentHash::of_file(&a).unwrap(),
            ContentHash::of_bytes(b"payload")
        );
    }

    #[test]
    fn missing_file_returns_io_error() {
        let result = ContentHash::of_file(Path::new("/nonexistent/photo.jpg"));
        assert!(matches!(result, Err(HashError::Io { .. })));
    }
}
