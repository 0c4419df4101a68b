//! Error types for the signage system
//!
//! Every failure a caller can observe maps to one variant here, and each
//! variant carries a stable [`Error::kind`] string so the transport can render
//! a specific message instead of a generic failure.

use thiserror::Error;

/// Result type alias for signage operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the signage system
#[derive(Error, Debug)]
pub enum Error {
    /// The device identifier was empty, absent, or not a string
    #[error("Invalid device identifier: {0}")]
    InvalidIdentifier(String),

    /// No record exists for the requested device
    #[error("Device not found: {0}")]
    NotFound(String),

    /// The persistence layer could not complete the operation
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A failure inside the service itself, e.g. a store task that panicked
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an invalid identifier error
    pub fn invalid_identifier(msg: impl Into<String>) -> Self {
        Self::InvalidIdentifier(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(device_id: impl Into<String>) -> Self {
        Self::NotFound(device_id.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageUnavailable(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidIdentifier(_) => "invalid_identifier",
            Error::NotFound(_) => "not_found",
            Error::StorageUnavailable(_) => "storage_unavailable",
            Error::Config(_) => "config",
            Error::Internal(_) => "internal",
        }
    }

    /// The request field responsible for a client-side rejection
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Error::InvalidIdentifier(_) => Some("deviceId"),
            _ => None,
        }
    }

    /// Whether the caller's input caused this error
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidIdentifier(_) | Error::NotFound(_))
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("Store task did not complete: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_distinguish_input_from_storage_failures() {
        let bad_input = Error::invalid_identifier("deviceId is empty");
        let storage = Error::storage("disk full");

        assert_eq!(bad_input.kind(), "invalid_identifier");
        assert_eq!(bad_input.field(), Some("deviceId"));
        assert!(bad_input.is_client_error());

        assert_eq!(storage.kind(), "storage_unavailable");
        assert_eq!(storage.field(), None);
        assert!(!storage.is_client_error());
    }

    #[tokio::test]
    async fn panicked_task_is_an_internal_error() {
        let join_err = tokio::spawn(async { panic!("writer crashed") })
            .await
            .unwrap_err();

        let err = Error::from(join_err);
        assert_eq!(err.kind(), "internal");
        assert!(!err.is_client_error());
    }
}
