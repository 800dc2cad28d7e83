use thiserror::Error;

/// Canonical error type for identity store and domain operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity was not found in the identity store.
    #[error("{entity} `{id}` was not found")]
    NotFound {
        /// Entity type name (e.g. `"user"`).
        entity: &'static str,
        /// Identifier of the missing entity.
        id: String,
    },

    /// The backing store rejected or failed a read or write.
    #[error("persistence error: {message}")]
    Persistence {
        /// Driver-level details for debugging purposes.
        message: String,
    },

    /// Validation error for input data.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// I/O error occurred during file operations.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error occurred.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Deserialization error occurred.
    #[error("deserialization error: {0}")]
    DeserializationError(String),
}

impl CoreError {
    /// Creates a `NotFound` variant.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Creates a `Persistence` variant.
    #[must_use]
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Creates a `ValidationError` variant.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// Returns `true` for the `NotFound` variant.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_eof() || err.is_syntax() || err.is_data() {
            Self::DeserializationError(err.to_string())
        } else {
            Self::SerializationError(err.to_string())
        }
    }
}

/// Convenient result alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_entity_and_id() {
        let err = CoreError::not_found("user", "42");
        assert_eq!(err.to_string(), "user `42` was not found");
        assert!(err.is_not_found());
        assert!(!CoreError::persistence("connection reset").is_not_found());
    }

    #[test]
    fn json_syntax_errors_map_to_deserialization() {
        let err = serde_json::from_str::<Vec<f64>>("[1.0,").unwrap_err();
        assert!(matches!(
            CoreError::from(err),
            CoreError::DeserializationError(_)
        ));
    }
}
