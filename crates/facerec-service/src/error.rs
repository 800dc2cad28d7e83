use std::time::Duration;

use thiserror::Error;

use facerec_core::{CoreError, UserId};
use facerec_gateway::GatewayError;

/// Errors surfaced by the registration and match workflows.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request is missing or carries invalid input. Never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// A staging file or the gallery artifact could not be written.
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),

    /// An external program failed or produced unusable output.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The identity store failed.
    #[error(transparent)]
    Store(CoreError),

    /// The gallery artifact could not be rebuilt.
    #[error("gallery export failed: {source}")]
    Export {
        #[source]
        source: Box<ServiceError>,
    },

    /// The matcher returned an id the store does not know.
    #[error("matcher returned user {user_id} which is absent from the identity store")]
    Integrity { user_id: UserId },

    /// The request exceeded its deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl ServiceError {
    /// Creates a `Validation` variant.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Wraps a failure that happened while exporting the gallery.
    #[must_use]
    pub fn export(source: impl Into<Self>) -> Self {
        Self::Export {
            source: Box::new(source.into()),
        }
    }

    /// Short category name used in logs and client-facing messages.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Io(_) => "io",
            Self::Gateway(GatewayError::MalformedOutput { .. }) => "malformed_output",
            Self::Gateway(_) => "external_process",
            Self::Store(CoreError::NotFound { .. }) => "not_found",
            Self::Store(_) => "persistence",
            Self::Export { .. } => "export",
            Self::Integrity { .. } => "integrity",
            Self::Timeout(_) => "timeout",
        }
    }

    /// Returns `true` when the caller sent a bad request.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationError(message) => Self::Validation(message),
            other => Self::Store(other),
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
