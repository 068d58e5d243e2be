//! Engine error types.

use stratus_core::{CoreError, ErrorKind};
use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by the migration engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Illegal state transition or idempotency collision.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Ready queue or per-owner cap backpressure.
    #[error("overloaded: {0}")]
    Overloaded(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("job store failure: {0}")]
    Store(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl From<EngineError> for CoreError {
    fn from(err: EngineError) -> Self {
        let kind = match &err {
            EngineError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::Conflict(_) => ErrorKind::Conflict,
            EngineError::Overloaded(_) => ErrorKind::Overloaded,
            EngineError::Forbidden(_) => ErrorKind::Forbidden,
            EngineError::ProviderUnavailable(_) => ErrorKind::ProviderUnavailable,
            EngineError::Store(_) | EngineError::Internal(_) => ErrorKind::Internal,
        };
        CoreError::new(kind, err.to_string())
    }
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        match err.kind {
            ErrorKind::InvalidArgument => EngineError::InvalidArgument(err.message),
            ErrorKind::NotFound => EngineError::NotFound(err.message),
            ErrorKind::Conflict => EngineError::Conflict(err.message),
            ErrorKind::Overloaded => EngineError::Overloaded(err.message),
            ErrorKind::Forbidden | ErrorKind::Unauthenticated => {
                EngineError::Forbidden(err.message)
            }
            ErrorKind::ProviderUnavailable | ErrorKind::Transient => {
                EngineError::ProviderUnavailable(err.message)
            }
            ErrorKind::Internal => EngineError::Internal(err.message),
        }
    }
}
