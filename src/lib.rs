//! # Photo Sorter
//!
//! Batch object detection over a folder of photos, with content-addressed
//! caching so identical images are never inferred twice.
//!
//! ## Core Philosophy
//! - **Content is identity** - files are keyed by a digest of their bytes,
//!   so renames, moves, and copies never trigger re-detection
//! - **Idempotent runs** - re-running on an unchanged folder does no work
//! - **Crash-safe state** - detection state is written atomically
//!
//! ## Architecture
//! The library is split into a core engine and a thin CLI:
//! - `core` - hashing, caching, reconciliation, classification, organizing
//! - `error` - typed error taxonomy per subsystem
//! - `cli` lives next to the binary entry point

pub mod core;
pub mod error;

// Re-export commonly used types at the crate root
pub use error::{Result, SorterError};

/// Initialize tracing for the library
///
/// This should be called once by the application entry point.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
