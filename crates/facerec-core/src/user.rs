//! User records and the biometric vectors attached to them.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::ids::UserId;

/// Face feature vector produced by the external extractor.
///
/// The dimensionality is owned by the extractor. The only guarantees
/// enforced here are that the vector is non-empty and every component is
/// finite, which is what the textual store encoding requires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct BiometricVector(Vec<f64>);

impl BiometricVector {
    /// Validates and wraps raw vector components.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::ValidationError` for an empty vector or a
    /// non-finite component.
    pub fn new(values: Vec<f64>) -> CoreResult<Self> {
        if values.is_empty() {
            return Err(CoreError::validation("biometric vector cannot be empty"));
        }
        if let Some(position) = values.iter().position(|v| !v.is_finite()) {
            return Err(CoreError::validation(format!(
                "biometric vector component {position} is not a finite number"
            )));
        }
        Ok(Self(values))
    }

    /// Returns the number of components.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    /// Borrows the components.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Consumes the vector, returning the components.
    #[must_use]
    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }

    /// Euclidean distance to another vector.
    ///
    /// Returns `None` when the dimensions differ.
    #[must_use]
    pub fn euclidean_distance(&self, other: &Self) -> Option<f64> {
        if self.dimension() != other.dimension() {
            return None;
        }
        let sum: f64 = self
            .0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        Some(sum.sqrt())
    }

    /// Returns `true` when every component differs by at most `tolerance`.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        self.dimension() == other.dimension()
            && self
                .0
                .iter()
                .zip(&other.0)
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

impl TryFrom<Vec<f64>> for BiometricVector {
    type Error = CoreError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl From<BiometricVector> for Vec<f64> {
    fn from(vector: BiometricVector) -> Self {
        vector.0
    }
}

/// A registered user as persisted by the identity store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Store-assigned identifier.
    pub user_id: UserId,
    /// Biometric vector captured at registration.
    pub biometric_vector: BiometricVector,
    /// Contact email supplied at registration.
    pub email: String,
}

/// One `(user_id, embedding)` pair of the exported gallery.
///
/// This is the record shape handed to the gallery writer; the field names
/// are part of the writer contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryEntry {
    pub user_id: UserId,
    pub embedding: BiometricVector,
}

impl From<UserRecord> for GalleryEntry {
    fn from(record: UserRecord) -> Self {
        Self {
            user_id: record.user_id,
            embedding: record.biometric_vector,
        }
    }
}
