//! Uniform adapter error taxonomy.
//!
//! Provider-native errors are translated at the adapter boundary; unknown
//! errors map to `Transient` only when the provider marks them retryable,
//! otherwise to `Unavailable`.

use serde::{Deserialize, Serialize};
use stratus_core::{CoreError, ErrorKind};
use thiserror::Error;

/// Result type alias for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Classification of an adapter failure, uniform across providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdapterErrorKind {
    PermissionDenied,
    NotFound,
    /// Copy source does not exist.
    SourceMissing,
    /// Destination exists and the caller asked for no-overwrite.
    DestExistsConflict,
    QuotaExceeded,
    /// Retryable.
    Transient,
    InvalidArgument,
    Unavailable,
}

impl AdapterErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            AdapterErrorKind::PermissionDenied => "PERMISSION_DENIED",
            AdapterErrorKind::NotFound => "NOT_FOUND",
            AdapterErrorKind::SourceMissing => "SOURCE_MISSING",
            AdapterErrorKind::DestExistsConflict => "DEST_EXISTS_CONFLICT",
            AdapterErrorKind::QuotaExceeded => "QUOTA_EXCEEDED",
            AdapterErrorKind::Transient => "TRANSIENT",
            AdapterErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            AdapterErrorKind::Unavailable => "UNAVAILABLE",
        }
    }

    /// Whether a retry may succeed without operator intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AdapterErrorKind::Transient | AdapterErrorKind::QuotaExceeded
        )
    }
}

impl std::fmt::Display for AdapterErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// An adapter failure: uniform kind plus provider-reported detail.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct AdapterError {
    pub kind: AdapterErrorKind,
    pub message: String,
}

impl AdapterError {
    pub fn new(kind: AdapterErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::NotFound, message)
    }

    pub fn source_missing(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::SourceMissing, message)
    }

    pub fn dest_exists(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::DestExistsConflict, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::Transient, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::InvalidArgument, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::Unavailable, message)
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl From<object_store::Error> for AdapterError {
    fn from(err: object_store::Error) -> Self {
        use object_store::Error as OsError;
        match err {
            OsError::NotFound { path, .. } => {
                AdapterError::not_found(format!("object not found: {}", path))
            }
            OsError::AlreadyExists { path, .. } => {
                AdapterError::dest_exists(format!("object already exists: {}", path))
            }
            OsError::PermissionDenied { path, .. } => AdapterError::new(
                AdapterErrorKind::PermissionDenied,
                format!("permission denied: {}", path),
            ),
            OsError::Unauthenticated { path, .. } => AdapterError::new(
                AdapterErrorKind::PermissionDenied,
                format!("unauthenticated: {}", path),
            ),
            OsError::NotImplemented => {
                AdapterError::invalid_argument("operation not implemented by this provider")
            }
            // The client has already retried what it considers retryable;
            // anything left is unavailable until the operator intervenes.
            other => AdapterError::unavailable(other.to_string()),
        }
    }
}

impl From<AdapterError> for CoreError {
    fn from(err: AdapterError) -> Self {
        let kind = match err.kind {
            AdapterErrorKind::PermissionDenied => ErrorKind::Forbidden,
            AdapterErrorKind::NotFound | AdapterErrorKind::SourceMissing => ErrorKind::NotFound,
            AdapterErrorKind::DestExistsConflict => ErrorKind::Conflict,
            AdapterErrorKind::QuotaExceeded | AdapterErrorKind::Transient => ErrorKind::Transient,
            AdapterErrorKind::InvalidArgument => ErrorKind::InvalidArgument,
            AdapterErrorKind::Unavailable => ErrorKind::ProviderUnavailable,
        };
        CoreError::new(kind, err.message)
    }
}
