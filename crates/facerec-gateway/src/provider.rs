use std::path::Path;

use async_trait::async_trait;
use facerec_core::{BiometricVector, UserId};

use crate::error::GatewayResult;

/// Turns a face image into a biometric vector.
#[async_trait]
pub trait FeatureExtractor: Send + Sync {
    /// Extracts the vector for the image stored at `image`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::ExternalProcess` (or `Spawn`) when the
    /// extractor fails and `GatewayError::MalformedOutput` when its output
    /// is not a float array.
    async fn extract(&self, image: &Path) -> GatewayResult<BiometricVector>;
}

/// Finds the gallery entry closest to a probe image.
#[async_trait]
pub trait GalleryMatcher: Send + Sync {
    /// Returns the matched user, or `None` when nothing in the gallery is
    /// close enough. "No match" is not an error.
    async fn find_match(&self, probe: &Path, gallery: &Path) -> GatewayResult<Option<UserId>>;
}

/// Converts an exported JSON record set into the matcher's gallery format.
#[async_trait]
pub trait GalleryWriter: Send + Sync {
    /// Reads `records` (a JSON array of `{user_id, embedding}`) and writes
    /// the gallery artifact to `destination`.
    async fn write_gallery(&self, records: &Path, destination: &Path) -> GatewayResult<()>;
}
