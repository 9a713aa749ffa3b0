//! # Error Module
//!
//! Typed errors for the photo sorter.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Stage-fatal vs. per-item** - I/O and state errors abort a stage;
//!   per-file detection and transfer errors are logged and skipped

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum SorterError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Detection error: {0}")]
    Detection(#[from] DetectionError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),
}

/// Errors that occur while scanning for image files
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while computing content hashes
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the detection model wrapper
///
/// A failed detection is never cached; partial model output is discarded.
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Model invocation failed for {path}: {reason}")]
    ModelFailed { path: PathBuf, reason: String },

    #[error("Model produced unparseable output for {path}: {reason}")]
    InvalidOutput { path: PathBuf, reason: String },

    #[error("No model command configured")]
    NoModel,
}

/// Errors that occur with the detection cache
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to read cache file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write cache file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize cache data: {0}")]
    SerializationFailed(String),
}

/// Errors that occur with the persisted detection state
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Missing {path}. Run the {stage} stage first.")]
    MissingInput { path: PathBuf, stage: &'static str },

    #[error("Failed to read state file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write state file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize state: {0}")]
    SerializationFailed(String),
}

/// Errors that occur while creating or extracting archives
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Failed to create archive {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Zip error for {path}: {reason}")]
    Zip { path: PathBuf, reason: String },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, SorterError>;
