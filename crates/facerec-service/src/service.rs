//! Registration and match workflows.

use std::sync::Arc;

use serde::Serialize;

use facerec_core::{BiometricVector, CoreError, IdentityStore, UserId};
use facerec_gateway::{FeatureExtractor, GalleryMatcher};

use crate::error::{ServiceError, ServiceResult};
use crate::gallery::{ExportSummary, GalleryExporter};
use crate::staging::{StagingArea, StagingKind};

/// Result of a completed registration.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    #[serde(skip)]
    pub user_id: UserId,
    pub biometric_id: BiometricVector,
}

/// Identity resolved from a probe image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedUser {
    pub user_id: UserId,
    pub email: String,
}

/// Composes staging, the gateways, the identity store and the gallery
/// exporter into the two user-facing workflows.
///
/// Built once at startup and shared by every request.
pub struct FaceService {
    store: Arc<dyn IdentityStore>,
    extractor: Arc<dyn FeatureExtractor>,
    matcher: Arc<dyn GalleryMatcher>,
    staging: StagingArea,
    exporter: Arc<GalleryExporter>,
}

impl FaceService {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        extractor: Arc<dyn FeatureExtractor>,
        matcher: Arc<dyn GalleryMatcher>,
        staging: StagingArea,
        exporter: Arc<GalleryExporter>,
    ) -> Self {
        Self {
            store,
            extractor,
            matcher,
            staging,
            exporter,
        }
    }

    #[must_use]
    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    #[must_use]
    pub fn exporter(&self) -> &GalleryExporter {
        &self.exporter
    }

    /// Rebuilds the gallery from the store.
    pub async fn export_gallery(&self) -> ServiceResult<ExportSummary> {
        self.exporter.export().await
    }

    /// Registers a face under `email`.
    ///
    /// The record is persisted and the gallery re-exported before this
    /// returns. If the export fails the error is returned even though the
    /// record stays in the store; the next successful export picks it up.
    ///
    /// # Errors
    ///
    /// `Validation` for a missing image or email, before anything is
    /// staged. Otherwise the error of the failing stage.
    #[tracing::instrument(skip(self, image, email), fields(image_bytes = image.map(<[u8]>::len)))]
    pub async fn register(&self, image: Option<&[u8]>, email: Option<&str>) -> ServiceResult<Registration> {
        tracing::debug!(stage = "received", "registration");
        let image = require_image(image)?;
        let email = email.map(str::trim).unwrap_or_default();
        if email.is_empty() {
            return Err(ServiceError::validation("missing `email` field"));
        }

        let staged = self
            .staging
            .acquire(StagingKind::Images, image)
            .await
            .map_err(ServiceError::Io)?;

        let vector = self.extractor.extract(staged.path()).await?;
        tracing::debug!(stage = "extracted", dimension = vector.dimension(), "registration");

        let user_id = self.store.create(&vector, email).await?;
        tracing::debug!(stage = "persisted", %user_id, "registration");

        if let Err(err) = self.exporter.export().await {
            tracing::error!(%user_id, error = %err, "user persisted but gallery export failed");
            return Err(err);
        }
        tracing::debug!(stage = "exported", %user_id, "registration");

        Ok(Registration {
            user_id,
            biometric_id: vector,
        })
    }

    /// Resolves the identity behind a probe image.
    ///
    /// Returns `Ok(None)` when the matcher finds nobody, including when the
    /// gallery is empty.
    ///
    /// # Errors
    ///
    /// `Validation` for a missing image, `Integrity` when the matched id is
    /// not in the store, otherwise the error of the failing stage.
    #[tracing::instrument(skip(self, image), fields(image_bytes = image.map(<[u8]>::len)))]
    pub async fn identify(&self, image: Option<&[u8]>) -> ServiceResult<Option<MatchedUser>> {
        tracing::debug!(stage = "received", "match");
        let image = require_image(image)?;

        let staged = self
            .staging
            .acquire(StagingKind::Images, image)
            .await
            .map_err(ServiceError::Io)?;
        tracing::debug!(stage = "staged", "match");

        // The external matcher cannot load an empty gallery.
        if !self.exporter.has_entries().await {
            tracing::debug!(stage = "matched", "gallery is empty");
            return Ok(None);
        }

        let matched = self
            .matcher
            .find_match(staged.path(), self.exporter.gallery_path())
            .await?;
        tracing::debug!(stage = "matched", user_id = ?matched, "match");

        let Some(user_id) = matched else {
            return Ok(None);
        };

        let record = match self.store.get_by_id(user_id).await {
            Ok(record) => record,
            Err(CoreError::NotFound { .. }) => return Err(ServiceError::Integrity { user_id }),
            Err(err) => return Err(err.into()),
        };
        tracing::debug!(stage = "resolved", %user_id, "match");

        Ok(Some(MatchedUser {
            user_id: record.user_id,
            email: record.email,
        }))
    }
}

fn require_image(image: Option<&[u8]>) -> ServiceResult<&[u8]> {
    match image {
        Some(bytes) if !bytes.is_empty() => Ok(bytes),
        Some(_) => Err(ServiceError::validation("`image` field is empty")),
        None => Err(ServiceError::validation("missing `image` field")),
    }
}
