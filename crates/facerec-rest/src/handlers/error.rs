//! Maps workflow failures to plain-text HTTP responses.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use facerec_service::ServiceError;

/// Error returned by the face handlers.
#[derive(Debug)]
pub enum ApiError {
    /// The workflow failed.
    Service(ServiceError),
    /// The multipart body could not be read.
    Multipart(MultipartError),
    /// The matcher found nobody. Not a failure, but answered with 404.
    NoMatch,
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Service(ServiceError::Validation(_)) => StatusCode::BAD_REQUEST,
            Self::Service(ServiceError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            Self::Service(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Multipart(err) => err.status(),
            Self::NoMatch => StatusCode::NOT_FOUND,
        }
    }

    /// Client-facing message. Internal failures only reveal their category.
    fn message(&self) -> String {
        match self {
            Self::Service(ServiceError::Validation(message)) => message.clone(),
            Self::Service(err) => match err.category() {
                "timeout" => "request timed out".to_string(),
                "io" => "failed to store the uploaded image".to_string(),
                "external_process" => "face processing failed".to_string(),
                "malformed_output" => "no biometric id could be derived from the image".to_string(),
                "export" => "user saved but the gallery could not be updated".to_string(),
                "integrity" => "matched user is missing from the identity store".to_string(),
                _ => "identity store error".to_string(),
            },
            Self::Multipart(err) => err.body_text(),
            Self::NoMatch => "no matching user found".to_string(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self::Service(err)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::Multipart(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Service(err) if status.is_server_error() => {
                tracing::error!(category = err.category(), error = %err, "request failed");
            }
            Self::Service(err) => {
                tracing::warn!(category = err.category(), error = %err, "request rejected");
            }
            Self::Multipart(err) => tracing::warn!(error = %err, "unreadable multipart body"),
            Self::NoMatch => tracing::debug!("no match"),
        }

        (status, self.message()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn status_mapping() {
        let cases = [
            (ServiceError::validation("missing `email` field"), StatusCode::BAD_REQUEST),
            (ServiceError::Timeout(Duration::from_secs(30)), StatusCode::GATEWAY_TIMEOUT),
            (
                ServiceError::Integrity {
                    user_id: facerec_core::UserId::new(4),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
        assert_eq!(ApiError::NoMatch.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let err = ApiError::from(ServiceError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "/srv/staging/temp-images is read-only",
        )));
        assert!(!err.message().contains("/srv"));

        let err = ApiError::from(ServiceError::validation("missing `image` field"));
        assert_eq!(err.message(), "missing `image` field");
    }
}
