//! # Core Module
//!
//! The CLI-agnostic detection and sorting engine.
//!
//! ## Modules
//! - `scanner` - Discovers image files in directories
//! - `hasher` - Computes content hashes (file identity)
//! - `cache` - Persists per-hash detection results
//! - `detector` - Wraps the black-box model, consulting the cache
//! - `state` - The durable hash → {files, detections} mapping
//! - `reconcile` - Merges a fresh scan against persisted state
//! - `classifier` - Assigns one label per hash from its detections
//! - `organize` - Moves/copies files into per-class folders
//! - `archive` - Zips output directories
//! - `cleanup` - Deletes intermediate results

pub mod archive;
pub mod cache;
pub mod classifier;
pub mod cleanup;
pub mod detector;
pub mod hasher;
pub mod organize;
pub mod reconcile;
pub mod scanner;
pub mod state;

// Re-export commonly used types
pub use classifier::{ClassificationRecord, ProcessedReport};
pub use detector::{DetectionModel, DetectionRecord, Detector};
pub use hasher::ContentHash;
pub use organize::OperationMode;
pub use state::{HashEntry, PersistedState};
