//! Error responses.
//!
//! Every failure is rendered as JSON so the admin surface can tell rejected
//! input apart from a service that could not persist it:
//!
//! ```json
//! { "error": "invalid_identifier", "message": "...", "field": "deviceId" }
//! ```
//!
//! | kind                  | status |
//! |-----------------------|--------|
//! | `invalid_payload`     | 400    |
//! | `invalid_identifier`  | 400    |
//! | `unauthorized`        | 401    |
//! | `forbidden`           | 403    |
//! | `not_found`           | 404    |
//! | `timeout`             | 408    |
//! | `storage_unavailable` | 503    |
//! | anything else         | 500    |

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use signage_core::Error as CoreError;
use thiserror::Error;

/// Realm advertised in basic-auth challenges
pub const AUTH_REALM: &str = r#"Basic realm="Admin""#;

/// Errors surfaced by the HTTP layer
#[derive(Error, Debug)]
pub enum ApiError {
    /// Failure from the gateway or store
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Request body is not JSON
    #[error("Request body is not valid JSON: {0}")]
    InvalidPayload(String),

    /// No usable credentials were presented
    #[error("Authentication required")]
    Unauthorized,

    /// Credentials were presented but do not match
    #[error("Forbidden")]
    Forbidden,

    /// The request did not finish within the configured timeout
    #[error("Request timed out")]
    Timeout,
}

/// JSON body of an error response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

impl ApiError {
    /// Create an invalid payload error
    pub fn invalid_payload(err: impl std::fmt::Display) -> Self {
        Self::InvalidPayload(err.to_string())
    }

    /// Machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Core(e) => e.kind(),
            ApiError::InvalidPayload(_) => "invalid_payload",
            ApiError::Unauthorized => "unauthorized",
            ApiError::Forbidden => "forbidden",
            ApiError::Timeout => "timeout",
        }
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(CoreError::InvalidIdentifier(_)) => StatusCode::BAD_REQUEST,
            ApiError::Core(CoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Core(CoreError::StorageUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
        }
    }

    fn body(&self) -> ErrorBody {
        let field = match self {
            ApiError::Core(e) => e.field(),
            _ => None,
        };
        let message = match self {
            // Internal details stay in the logs.
            ApiError::Core(e) if self.status() == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!(error = %e, "Internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        ErrorBody {
            error: self.kind(),
            message,
            field,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), Json(self.body())).into_response();
        if matches!(self, ApiError::Unauthorized) {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(AUTH_REALM),
            );
        }
        response
    }
}
