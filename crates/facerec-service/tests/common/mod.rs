#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use facerec_core::{BiometricVector, GalleryEntry, IdentityStore};
use facerec_gateway::{
    read_json_gallery, GalleryMatcher, GalleryWriter, MockExtractor, MockGalleryWriter,
    MockMatcher,
};
use facerec_service::{FaceService, GalleryExporter, StagingArea, StagingKind};
use facerec_store::{create_sqlite_pool, run_sqlite_migrations, SqliteIdentityStore};
use tempfile::TempDir;

/// Service wired to a throw-away SQLite store and mock gateways.
pub struct TestContext {
    pub service: FaceService,
    pub store: Arc<SqliteIdentityStore>,
    pub extractor: Arc<MockExtractor>,
    pub writer: Arc<MockGalleryWriter>,
    pub exporter: Arc<GalleryExporter>,
    pub staging: StagingArea,
    pub dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::build(mock_matcher, None).await
    }

    pub async fn with_matcher(matcher: Arc<dyn GalleryMatcher>) -> Self {
        Self::build(|_| matcher, None).await
    }

    pub async fn with_writer(writer: Arc<dyn GalleryWriter>) -> Self {
        Self::build(mock_matcher, Some(writer)).await
    }

    async fn build(
        matcher: impl FnOnce(Arc<MockExtractor>) -> Arc<dyn GalleryMatcher>,
        writer_override: Option<Arc<dyn GalleryWriter>>,
    ) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let url = format!("sqlite://{}", dir.path().join("users.db").display());
        let pool = create_sqlite_pool(&url, 4).await.expect("sqlite pool");
        run_sqlite_migrations(&pool).await.expect("migrations");
        let store = Arc::new(SqliteIdentityStore::new(pool));

        let staging = StagingArea::new(dir.path().join("staging"));
        staging.ensure_dirs().await.expect("staging dirs");

        let extractor = Arc::new(MockExtractor::new());
        let writer = Arc::new(MockGalleryWriter::new());
        let exporter = Arc::new(GalleryExporter::new(
            store.clone(),
            writer_override.unwrap_or_else(|| writer.clone() as Arc<dyn GalleryWriter>),
            staging.clone(),
            dir.path().join("gallery.json"),
        ));

        let service = FaceService::new(
            store.clone(),
            extractor.clone(),
            matcher(extractor.clone()),
            staging.clone(),
            exporter.clone(),
        );

        Self {
            service,
            store,
            extractor,
            writer,
            exporter,
            staging,
            dir,
        }
    }

    pub fn gallery_path(&self) -> PathBuf {
        self.dir.path().join("gallery.json")
    }

    pub async fn gallery(&self) -> Vec<GalleryEntry> {
        read_json_gallery(&self.gallery_path()).await.expect("readable gallery")
    }

    /// The store contents in the shape the gallery holds them.
    pub async fn store_entries(&self) -> Vec<GalleryEntry> {
        self.store
            .list_all()
            .await
            .expect("list users")
            .into_iter()
            .map(GalleryEntry::from)
            .collect()
    }

    pub fn staged_files(&self, kind: StagingKind) -> usize {
        count_entries(&self.staging.dir(kind))
    }
}

fn mock_matcher(extractor: Arc<MockExtractor>) -> Arc<dyn GalleryMatcher> {
    Arc::new(MockMatcher::new(extractor))
}

pub fn vector(values: &[f64]) -> BiometricVector {
    BiometricVector::new(values.to_vec()).expect("valid vector")
}

pub fn count_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

pub fn assert_same_entries(actual: &[GalleryEntry], expected: &[GalleryEntry]) {
    assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
    for (a, e) in actual.iter().zip(expected) {
        assert_eq!(a.user_id, e.user_id);
        assert!(a.embedding.approx_eq(&e.embedding, 1e-6), "{a:?} vs {e:?}");
    }
}
