//! SQLite implementation of the identity store, used for local
//! development and tests.

use async_trait::async_trait;
use sqlx::SqlitePool;

use facerec_core::{
    encode_vector, BiometricVector, CoreError, CoreResult, IdentityStore, UserId, UserRecord,
};

use crate::row::{map_sqlx_error, validate_email, UserRow};

/// Identity store backed by a SQLite `users` table.
pub struct SqliteIdentityStore {
    pool: SqlitePool,
}

impl SqliteIdentityStore {
    /// Creates a store over an existing pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Borrows the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl IdentityStore for SqliteIdentityStore {
    #[tracing::instrument(skip(self, vector, email), fields(dimension = vector.dimension()))]
    async fn create(&self, vector: &BiometricVector, email: &str) -> CoreResult<UserId> {
        validate_email(email)?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (biometric_id, email) VALUES (?1, ?2) RETURNING id",
        )
        .bind(encode_vector(vector))
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("inserting user", e))?;

        Ok(UserId::new(id))
    }

    async fn list_all(&self) -> CoreResult<Vec<UserRecord>> {
        let rows: Vec<UserRow> =
            sqlx::query_as("SELECT id, biometric_id, email FROM users ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("listing users", e))?;

        rows.into_iter().map(UserRow::into_record).collect()
    }

    async fn get_by_id(&self, user_id: UserId) -> CoreResult<UserRecord> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, biometric_id, email FROM users WHERE id = ?1")
                .bind(user_id.get())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("fetching user", e))?;

        row.ok_or_else(|| CoreError::not_found("user", user_id.to_string()))?
            .into_record()
    }
}
