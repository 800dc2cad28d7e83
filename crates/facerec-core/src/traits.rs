use async_trait::async_trait;

use crate::error::CoreResult;
use crate::ids::UserId;
use crate::user::{BiometricVector, UserRecord};

/// Durable repository of registered users and their biometric vectors.
///
/// Records are append-only: there is deliberately no update or delete.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Inserts a new user record and returns the identifier the store
    /// assigned to it.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::ValidationError` for an empty email and
    /// `CoreError::Persistence` for any write failure.
    async fn create(&self, vector: &BiometricVector, email: &str) -> CoreResult<UserId>;

    /// Returns every record ordered by identifier.
    async fn list_all(&self) -> CoreResult<Vec<UserRecord>>;

    /// Fetches a single record.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` when no record has this identifier,
    /// distinct from `CoreError::Persistence` for driver failures.
    async fn get_by_id(&self, user_id: UserId) -> CoreResult<UserRecord>;
}
