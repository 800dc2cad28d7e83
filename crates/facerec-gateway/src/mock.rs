//! Deterministic in-process gateways for tests.
//!
//! The mocks never spawn a program. `MockGalleryWriter` produces a JSON
//! artifact (a straight copy of the exported records) which `MockMatcher`
//! and [`read_json_gallery`] can read back, so the whole registration and
//! matching flow can be exercised end to end.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use facerec_core::{BiometricVector, GalleryEntry, UserId};

use crate::error::{GatewayError, GatewayResult};
use crate::parse::parse_vector_output;
use crate::provider::{FeatureExtractor, GalleryMatcher, GalleryWriter};

/// Extractor that maps exact image bytes to vectors.
///
/// Images without a registered mapping are parsed as a JSON float array,
/// so a test can upload `b"[1.0, 2.0]"` as the "image" itself.
#[derive(Default)]
pub struct MockExtractor {
    images: RwLock<HashMap<Vec<u8>, BiometricVector>>,
    calls: AtomicUsize,
}

impl MockExtractor {
    /// Program name reported in errors.
    pub const PROGRAM: &'static str = "mock-extractor";

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a mapping (builder pattern).
    #[must_use]
    pub fn with_image(self, bytes: impl Into<Vec<u8>>, vector: BiometricVector) -> Self {
        self.register_image(bytes, vector);
        self
    }

    /// Registers a mapping on a shared instance.
    pub fn register_image(&self, bytes: impl Into<Vec<u8>>, vector: BiometricVector) {
        self.images.write().insert(bytes.into(), vector);
    }

    /// Number of `extract` calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector_for(&self, bytes: &[u8]) -> GatewayResult<BiometricVector> {
        if let Some(vector) = self.images.read().get(bytes) {
            return Ok(vector.clone());
        }
        parse_vector_output(Self::PROGRAM, &String::from_utf8_lossy(bytes))
    }
}

#[async_trait]
impl FeatureExtractor for MockExtractor {
    async fn extract(&self, image: &Path) -> GatewayResult<BiometricVector> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let bytes = tokio::fs::read(image).await?;
        self.vector_for(&bytes)
    }
}

/// Gallery writer that copies the JSON record set to the destination.
#[derive(Default)]
pub struct MockGalleryWriter {
    failing: AtomicBool,
    partial_write: AtomicBool,
    writes: AtomicUsize,
}

impl MockGalleryWriter {
    /// Program name reported in errors.
    pub const PROGRAM: &'static str = "mock-gallery-writer";

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent writes fail with a non-zero "exit".
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// When failing, leave a truncated file at the destination first,
    /// like a writer that dies halfway through.
    pub fn set_partial_write(&self, partial: bool) {
        self.partial_write.store(partial, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GalleryWriter for MockGalleryWriter {
    async fn write_gallery(&self, records: &Path, destination: &Path) -> GatewayResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            if self.partial_write.load(Ordering::SeqCst) {
                tokio::fs::write(destination, b"[{\"user_id\": ").await?;
            }
            return Err(GatewayError::ExternalProcess {
                program: Self::PROGRAM.to_string(),
                status: "exit status: 1".to_string(),
                output: "simulated writer failure".to_string(),
            });
        }

        tokio::fs::copy(records, destination).await?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Nearest-neighbour matcher over a JSON gallery.
///
/// The probe vector comes from a shared [`MockExtractor`], so a test
/// controls which stored vector an image resolves to.
pub struct MockMatcher {
    extractor: Arc<MockExtractor>,
    threshold: f64,
    calls: AtomicUsize,
}

impl MockMatcher {
    /// Same acceptance radius as the reference matcher.
    pub const DEFAULT_THRESHOLD: f64 = 0.6;

    #[must_use]
    pub fn new(extractor: Arc<MockExtractor>) -> Self {
        Self {
            extractor,
            threshold: Self::DEFAULT_THRESHOLD,
            calls: AtomicUsize::new(0),
        }
    }

    /// Sets the maximum accepted Euclidean distance.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Number of `find_match` calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GalleryMatcher for MockMatcher {
    async fn find_match(&self, probe: &Path, gallery: &Path) -> GatewayResult<Option<UserId>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let probe = self.extractor.extract(probe).await?;
        let entries = read_json_gallery(gallery).await?;

        let best = entries
            .iter()
            .filter_map(|entry| {
                probe
                    .euclidean_distance(&entry.embedding)
                    .map(|distance| (entry.user_id, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1));

        Ok(best
            .filter(|(_, distance)| *distance <= self.threshold)
            .map(|(user_id, _)| user_id))
    }
}

/// Reads a gallery artifact produced by [`MockGalleryWriter`].
///
/// # Errors
///
/// Returns `GatewayError::Io` when the file cannot be read and
/// `GatewayError::MalformedOutput` when it is not a JSON record array.
pub async fn read_json_gallery(path: &Path) -> GatewayResult<Vec<GalleryEntry>> {
    let contents = tokio::fs::read_to_string(path).await?;
    serde_json::from_str(&contents).map_err(|e| {
        GatewayError::malformed(MockGalleryWriter::PROGRAM, e.to_string(), contents.clone())
    })
}
