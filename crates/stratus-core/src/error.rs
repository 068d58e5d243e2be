//! Error taxonomy crossing component boundaries.
//!
//! Every crate defines its own error type and converts it into [`CoreError`]
//! at the boundary; the control API maps [`ErrorKind`] onto transport status
//! codes. Credentials and secrets must never appear in error messages.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for boundary operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// The only error kinds that cross component boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Missing, expired, or invalid credential.
    Unauthenticated,

    /// Authenticated but not permitted.
    Forbidden,

    /// Object, job, or principal unknown.
    NotFound,

    /// Malformed request or violated precondition.
    InvalidArgument,

    /// Idempotency collision or illegal state transition.
    Conflict,

    /// Engine or event bus backpressure.
    Overloaded,

    /// A provider reported UNAVAILABLE that did not recover in retries.
    ProviderUnavailable,

    /// Internal, retry may succeed; never surfaced to clients unwrapped.
    Transient,

    /// Unexpected; logged with context.
    Internal,
}

impl ErrorKind {
    /// Stable machine tag used in API responses and event payloads.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Unauthenticated => "UNAUTHENTICATED",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Overloaded => "OVERLOADED",
            ErrorKind::ProviderUnavailable => "PROVIDER_UNAVAILABLE",
            ErrorKind::Transient => "TRANSIENT",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Boundary error: a kind plus a human-readable message.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct CoreError {
    /// Error classification.
    pub kind: ErrorKind,

    /// Human-readable message. Never contains credentials.
    pub message: String,
}

impl CoreError {
    /// Create an error with the given kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthenticated, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn overloaded(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Overloaded, message)
    }

    pub fn provider_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ProviderUnavailable, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transient, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}
