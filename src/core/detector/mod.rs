//! # Detector Module
//!
//! Wraps the black-box object-detection model and consults the cache so
//! identical content is never inferred twice.
//!
//! ## Model seam
//! The model is fully opaque: anything implementing [`DetectionModel`]
//! (one `infer` call producing boxes, labels, and scores) is substitutable.
//! - `CommandModel` - spawns an external command per image and parses its
//!   JSON output; wraps any real vision model behind a script
//! - `StaticModel` - canned detections with an invocation counter, for tests

mod model;

pub use model::{CommandModel, DetectionModel, RawDetection, StaticModel};

use crate::core::cache::CacheStore;
use crate::core::hasher::ContentHash;
use crate::core::state::PersistedState;
use crate::error::SorterError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One detected object, immutable once produced for a given hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    /// Bounding box as [x1, y1, x2, y2]
    pub bounding_box: [f32; 4],
    /// Detected class label (e.g. "person", "car")
    pub class_label: String,
    /// Model confidence in [0, 1]
    pub confidence: f32,
}

impl DetectionRecord {
    fn from_raw(raw: RawDetection) -> Self {
        Self {
            bounding_box: raw.bounding_box,
            class_label: raw.label,
            confidence: raw.score.clamp(0.0, 1.0),
        }
    }
}

/// Result of detecting one image
#[derive(Debug, Clone)]
pub struct DetectionOutcome {
    pub hash: ContentHash,
    pub detections: Vec<DetectionRecord>,
    pub cache_hit: bool,
}

/// Summary of a batch detection pass
#[derive(Debug, Clone, Default)]
pub struct DetectionSummary {
    /// Files whose detections were produced or served from cache
    pub processed: usize,
    /// Of those, how many were cache hits
    pub cache_hits: usize,
    /// Files skipped because the model failed on them
    pub failed: usize,
}

/// Cache-aware detector
pub struct Detector {
    model: Box<dyn DetectionModel>,
    cache: Box<dyn CacheStore>,
}

impl Detector {
    pub fn new(model: Box<dyn DetectionModel>, cache: Box<dyn CacheStore>) -> Self {
        Self { model, cache }
    }

    /// Detect objects in one image, consulting the cache first
    ///
    /// On a cache miss the model runs and its output is cached keyed by the
    /// image's content hash. A failed model call caches nothing.
    pub fn detect(&self, image: &Path) -> Result<DetectionOutcome> {
        let hash = ContentHash::of_file(image)?;
        self.detect_hashed(image, hash)
    }

    fn detect_hashed(&self, image: &Path, hash: ContentHash) -> Result<DetectionOutcome> {
        if let Some(detections) = self.cache.get(&hash)? {
            debug!("cache hit for {}", image.display());
            return Ok(DetectionOutcome {
                hash,
                detections,
                cache_hit: true,
            });
        }

        let raw = self.model.infer(image)?;
        let detections: Vec<DetectionRecord> =
            raw.into_iter().map(DetectionRecord::from_raw).collect();
        self.cache.set(&hash, &detections)?;
        debug!(
            "computed and cached {} detections for {}",
            detections.len(),
            image.display()
        );

        Ok(DetectionOutcome {
            hash,
            detections,
            cache_hit: false,
        })
    }

    /// Run detection for every pending path and fold results into `state`
    ///
    /// Detections for a hash are filled in only once; later files with the
    /// same content just join the hash's file list. A model failure on one
    /// file is logged and skipped so the rest of the batch completes, and
    /// the entry reconciliation created for that hash is dropped from the
    /// state so the next run treats the content as unseen and retries it.
    /// (A successful detection with zero objects is cached and kept; only
    /// failures stay pending.)
    pub fn detect_batch<F>(
        &self,
        state: &mut PersistedState,
        pending: &[PathBuf],
        mut on_progress: F,
    ) -> Result<DetectionSummary>
    where
        F: FnMut(usize, usize, &Path),
    {
        let mut summary = DetectionSummary::default();

        for (i, path) in pending.iter().enumerate() {
            on_progress(i + 1, pending.len(), path);

            if !path.exists() {
                warn!("{} vanished before detection, skipping", path.display());
                continue;
            }

            let hash = ContentHash::of_file(path)?;
            let outcome = match self.detect_hashed(path, hash.clone()) {
                Ok(outcome) => outcome,
                Err(SorterError::Detection(e)) => {
                    warn!("detection failed for {}: {}", path.display(), e);
                    summary.failed += 1;
                    // Don't persist a detection-less entry for the failed
                    // hash; the next run must re-detect this content.
                    if state.get(&hash).is_some_and(|entry| entry.detections.is_empty()) {
                        state.remove(&hash);
                    }
                    continue;
                }
                Err(e) => return Err(e),
            };

            let entry = state.entry_mut(&outcome.hash);
            if entry.detections.is_empty() {
                entry.detections = outcome.detections;
            }
            if !entry.files.contains(path) {
                entry.files.push(path.clone());
            }

            summary.processed += 1;
            if outcome.cache_hit {
                summary.cache_hits += 1;
            }
        }

        info!(
            "detection batch done: {} processed ({} cache hits), {} failed",
            summary.processed, summary.cache_hits, summary.failed
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::InMemoryCache;
    use std::fs;
    use tempfile::TempDir;

    fn raw(label: &str, score: f32) -> RawDetection {
        RawDetection {
            bounding_box: [0.0, 0.0, 5.0, 5.0],
            label: label.to_string(),
            score,
        }
    }

    #[test]
    fn second_detection_of_same_content_hits_cache() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.jpg");
        let b = temp.path().join("b.jpg");
        fs::write(&a, b"same bytes").unwrap();
        fs::write(&b, b"same bytes").unwrap();

        let model = StaticModel::new(vec![raw("cat", 0.8)]);
        let calls = model.call_counter();
        let detector = Detector::new(Box::new(model), Box::new(InMemoryCache::new()));

        let first = detector.detect(&a).unwrap();
        let second = detector.detect(&b).unwrap();

        assert!(!first.cache_hit);
        assert!(second.cache_hit);
        assert_eq!(first.hash, second.hash);
        assert_eq!(first.detections, second.detections);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn confidence_is_clamped_to_unit_interval() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.jpg");
        fs::write(&a, b"bytes").unwrap();

        let model = StaticModel::new(vec![raw("cat", 1.7), raw("dog", -0.2)]);
        let detector = Detector::new(Box::new(model), Box::new(InMemoryCache::new()));

        let outcome = detector.detect(&a).unwrap();
        assert_eq!(outcome.detections[0].confidence, 1.0);
        assert_eq!(outcome.detections[1].confidence, 0.0);
    }

    #[test]
    fn model_failure_caches_nothing() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.jpg");
        fs::write(&a, b"bytes").unwrap();

        let cache = InMemoryCache::new();
        let detector = Detector::new(Box::new(StaticModel::failing()), Box::new(cache));

        let result = detector.detect(&a);
        assert!(matches!(result, Err(SorterError::Detection(_))));
    }

    #[test]
    fn batch_skips_failing_files_and_continues() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.jpg");
        fs::write(&a, b"bytes").unwrap();

        let detector = Detector::new(
            Box::new(StaticModel::failing()),
            Box::new(InMemoryCache::new()),
        );
        let mut state = PersistedState::new();
        let summary = detector
            .detect_batch(&mut state, &[a], |_, _, _| {})
            .unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.processed, 0);
        assert_eq!(state.len(), 0);
    }

    #[test]
    fn batch_drops_the_failed_entry_so_the_content_stays_unseen() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.jpg");
        fs::write(&a, b"bytes").unwrap();
        let hash = ContentHash::of_file(&a).unwrap();

        // Reconciliation has already registered the hash with empty
        // detections, as it does for every unseen file.
        let mut state = PersistedState::new();
        state.entry_mut(&hash).files.push(a.clone());

        let detector = Detector::new(
            Box::new(StaticModel::failing()),
            Box::new(InMemoryCache::new()),
        );
        let summary = detector
            .detect_batch(&mut state, &[a], |_, _, _| {})
            .unwrap();

        assert_eq!(summary.failed, 1);
        assert!(
            !state.contains(&hash),
            "a failed detection must not leave a detection-less entry behind"
        );
    }

    #[test]
    fn batch_fills_detections_only_once_per_hash() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.jpg");
        let b = temp.path().join("b.jpg");
        fs::write(&a, b"same").unwrap();
        fs::write(&b, b"same").unwrap();

        let detector = Detector::new(
            Box::new(StaticModel::new(vec![raw("cat", 0.9)])),
            Box::new(InMemoryCache::new()),
        );
        let mut state = PersistedState::new();
        let summary = detector
            .detect_batch(&mut state, &[a.clone(), b.clone()], |_, _, _| {})
            .unwrap();

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.cache_hits, 1);
        assert_eq!(state.len(), 1);

        let hash = ContentHash::of_file(&a).unwrap();
        let entry = state.get(&hash).unwrap();
        assert_eq!(entry.files, vec![a, b]);
        assert_eq!(entry.detections.len(), 1);
    }
}
