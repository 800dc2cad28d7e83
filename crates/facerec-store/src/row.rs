use facerec_core::{decode_vector, CoreError, CoreResult, UserId, UserRecord};

/// Raw `users` row shared by both backends.
///
/// Queries select `biometric_id` as text so the vector always goes through
/// the same codec regardless of the column type.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    pub id: i64,
    pub biometric_id: String,
    pub email: String,
}

impl UserRow {
    pub(crate) fn into_record(self) -> CoreResult<UserRecord> {
        let biometric_vector = decode_vector(&self.biometric_id).map_err(|e| {
            CoreError::persistence(format!("user {} has a corrupt vector: {e}", self.id))
        })?;
        Ok(UserRecord {
            user_id: UserId::new(self.id),
            biometric_vector,
            email: self.email,
        })
    }
}

pub(crate) fn validate_email(email: &str) -> CoreResult<()> {
    if email.trim().is_empty() {
        return Err(CoreError::validation("email cannot be empty"));
    }
    Ok(())
}

pub(crate) fn map_sqlx_error(context: &str, err: sqlx::Error) -> CoreError {
    CoreError::persistence(format!("{context}: {err}"))
}
