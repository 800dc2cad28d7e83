//! Rebuilds the gallery artifact read by the external matcher.
//!
//! Every export is a full rebuild from the identity store. The record set
//! is staged as JSON, converted by the [`GalleryWriter`] into a hidden
//! sibling of the artifact and then renamed over it, so readers see either
//! the previous artifact or the new one and a failed export leaves the
//! previous artifact in place.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::Mutex;

use facerec_core::{CoreError, GalleryEntry, IdentityStore};
use facerec_gateway::{GalleryWriter, GatewayError};

use crate::error::{ServiceError, ServiceResult};
use crate::staging::{StagingArea, StagingKind};

/// Outcome of a successful export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    /// Number of user records in the published artifact.
    pub records: usize,
    /// Location of the published artifact.
    pub path: PathBuf,
}

/// Serializes "scan store, write artifact" and publishes atomically.
pub struct GalleryExporter {
    store: Arc<dyn IdentityStore>,
    writer: Arc<dyn GalleryWriter>,
    staging: StagingArea,
    gallery_path: PathBuf,
    export_lock: Mutex<()>,
    published: RwLock<Option<usize>>,
}

impl GalleryExporter {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        writer: Arc<dyn GalleryWriter>,
        staging: StagingArea,
        gallery_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            writer,
            staging,
            gallery_path: gallery_path.into(),
            export_lock: Mutex::new(()),
            published: RwLock::new(None),
        }
    }

    /// Path of the published artifact.
    #[must_use]
    pub fn gallery_path(&self) -> &Path {
        &self.gallery_path
    }

    /// Record count of the last artifact this exporter published, if any.
    #[must_use]
    pub fn published_records(&self) -> Option<usize> {
        *self.published.read()
    }

    /// Whether there is a non-empty artifact to match against.
    ///
    /// False when the last export in this process had no records, or when
    /// no artifact exists on disk.
    pub async fn has_entries(&self) -> bool {
        if self.published_records() == Some(0) {
            return false;
        }
        tokio::fs::try_exists(&self.gallery_path)
            .await
            .unwrap_or(false)
    }

    /// Rebuilds the artifact from the full contents of the store.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Export`] wrapping the failing step. The
    /// previously published artifact is untouched in that case.
    #[tracing::instrument(skip(self), fields(gallery = %self.gallery_path.display()))]
    pub async fn export(&self) -> ServiceResult<ExportSummary> {
        let _guard = self.export_lock.lock().await;
        self.remove_stale_siblings().await;

        let records = self.store.list_all().await.map_err(ServiceError::export)?;
        let entries: Vec<GalleryEntry> = records.into_iter().map(GalleryEntry::from).collect();
        let json = serde_json::to_vec(&entries)
            .map_err(|e| ServiceError::export(CoreError::from(e)))?;

        let staged = self
            .staging
            .acquire(StagingKind::Embeddings, &json)
            .await
            .map_err(|e| ServiceError::export(ServiceError::Io(e)))?;

        let sibling = PendingArtifact::new(&self.gallery_path);
        tracing::debug!(
            records = entries.len(),
            staged = %staged.path().display(),
            pending = %sibling.path.display(),
            "writing gallery"
        );

        self.writer
            .write_gallery(staged.path(), &sibling.path)
            .await
            .map_err(ServiceError::export)?;

        match tokio::fs::metadata(&sibling.path).await {
            Ok(meta) if meta.is_file() => {}
            _ => {
                return Err(ServiceError::export(GatewayError::malformed(
                    "gallery writer",
                    "reported success without producing the artifact",
                    sibling.path.display().to_string(),
                )));
            }
        }

        tokio::fs::rename(&sibling.path, &self.gallery_path)
            .await
            .map_err(|e| ServiceError::export(ServiceError::Io(e)))?;
        sibling.published();

        *self.published.write() = Some(entries.len());
        tracing::info!(records = entries.len(), "gallery exported");

        Ok(ExportSummary {
            records: entries.len(),
            path: self.gallery_path.clone(),
        })
    }

    /// Removes pending artifacts left behind by earlier exports. A writer
    /// outlives a cancelled export and may create its sibling after the
    /// export gave up on it.
    async fn remove_stale_siblings(&self) {
        let dir = match self.gallery_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "skipping stale sibling sweep");
                return;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "stale sibling sweep interrupted");
                    break;
                }
            };
            if !is_pending_artifact(&self.gallery_path, &entry.file_name()) {
                continue;
            }
            let path = entry.path();
            match tokio::fs::remove_file(&path).await {
                Ok(()) => tracing::debug!(path = %path.display(), "removed stale pending artifact"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to remove stale pending artifact");
                }
            }
        }
    }
}

fn artifact_stem(target: &Path) -> String {
    target
        .file_stem()
        .map_or_else(|| "gallery".into(), |s| s.to_string_lossy().into_owned())
}

/// Whether `name` has the shape of a [`PendingArtifact`] for `target`:
/// `.{stem}-{32 hex digits}` plus the target's extension.
fn is_pending_artifact(target: &Path, name: &OsStr) -> bool {
    let Some(name) = name.to_str() else {
        return false;
    };
    let Some(rest) = name.strip_prefix(&format!(".{}-", artifact_stem(target))) else {
        return false;
    };
    let id = match target.extension() {
        Some(ext) => {
            let suffix = format!(".{}", ext.to_string_lossy());
            match rest.strip_suffix(suffix.as_str()) {
                Some(id) => id,
                None => return false,
            }
        }
        None => rest,
    };
    id.len() == 32 && id.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Hidden sibling of the artifact that the writer fills in. Removed on
/// drop unless it was renamed into place.
struct PendingArtifact {
    path: PathBuf,
    published: bool,
}

impl PendingArtifact {
    fn new(target: &Path) -> Self {
        let stem = artifact_stem(target);

        let mut name = OsString::from(format!(".{stem}-{}", uuid::Uuid::new_v4().simple()));
        if let Some(ext) = target.extension() {
            name.push(".");
            name.push(ext);
        }

        Self {
            path: target.with_file_name(name),
            published: false,
        }
    }

    fn published(mut self) {
        self.published = true;
    }
}

impl Drop for PendingArtifact {
    fn drop(&mut self) {
        if !self.published {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;

    use super::*;

    #[test]
    fn pending_artifact_keeps_directory_and_extension() {
        let pending = PendingArtifact::new(Path::new("/srv/data/gallery_embeddings.npy"));
        let name = pending.path.file_name().unwrap().to_string_lossy().into_owned();

        assert_eq!(pending.path.parent(), Some(Path::new("/srv/data")));
        assert!(name.starts_with(".gallery_embeddings-"), "{name}");
        assert!(name.ends_with(".npy"), "{name}");
    }

    #[test]
    fn pending_artifact_for_relative_target() {
        let pending = PendingArtifact::new(Path::new("gallery.json"));
        assert_eq!(pending.path.parent(), Some(Path::new("")));
        assert!(pending.path.to_string_lossy().ends_with(".json"));
    }

    #[test]
    fn unpublished_sibling_is_removed() {
        let dir = tempfile::TempDir::new().unwrap();
        let pending = PendingArtifact::new(&dir.path().join("gallery.npy"));
        std::fs::write(&pending.path, b"partial").unwrap();
        let path = pending.path.clone();

        drop(pending);
        assert!(!path.exists());
    }

    #[test]
    fn pending_artifact_names_are_recognized() {
        let target = Path::new("/srv/data/gallery.npy");
        let pending = PendingArtifact::new(target);
        let own = pending.path.file_name().unwrap();

        assert!(is_pending_artifact(target, own));
        assert!(!is_pending_artifact(target, OsStr::new("gallery.npy")));
        assert!(!is_pending_artifact(target, OsStr::new(".gallery-notes.npy")));
        assert!(!is_pending_artifact(
            target,
            OsStr::new(".gallery-0123456789abcdef0123456789abcdef.json")
        ));
        assert!(!is_pending_artifact(Path::new("/srv/data/other.npy"), own));
    }

    #[tokio::test]
    async fn export_sweeps_leftover_siblings_only() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("gallery.json");
        let stale = dir
            .path()
            .join(".gallery-0123456789abcdef0123456789abcdef.json");
        let unrelated = dir.path().join(".gallery-keep.json");
        std::fs::write(&stale, b"[]").unwrap();
        std::fs::write(&unrelated, b"keep").unwrap();

        let store: Arc<dyn IdentityStore> = Arc::new(EmptyStore);
        let writer: Arc<dyn GalleryWriter> = Arc::new(facerec_gateway::MockGalleryWriter::new());
        let staging = StagingArea::new(dir.path().join("staging"));
        staging.ensure_dirs().await.unwrap();
        let exporter = GalleryExporter::new(store, writer, staging, &target);

        let summary = exporter.export().await.unwrap();

        assert_eq!(summary.records, 0);
        assert!(target.exists());
        assert!(!stale.exists());
        assert!(unrelated.exists());
    }

    struct EmptyStore;

    #[async_trait::async_trait]
    impl IdentityStore for EmptyStore {
        async fn create(
            &self,
            _vector: &facerec_core::BiometricVector,
            _email: &str,
        ) -> facerec_core::CoreResult<facerec_core::UserId> {
            Err(CoreError::persistence("read-only store"))
        }

        async fn list_all(&self) -> facerec_core::CoreResult<Vec<facerec_core::UserRecord>> {
            Ok(Vec::new())
        }

        async fn get_by_id(
            &self,
            user_id: facerec_core::UserId,
        ) -> facerec_core::CoreResult<facerec_core::UserRecord> {
            Err(CoreError::not_found("user", user_id.to_string()))
        }
    }
}
