//! Auth error types.

use stratus_core::{CoreError, ErrorKind};
use thiserror::Error;

/// Result type alias for auth operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors surfaced by authentication and authorization.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown principal or wrong credential. Deliberately indistinct so a
    /// caller cannot probe which principals exist.
    #[error("invalid principal or credential")]
    InvalidCredentials,

    /// Missing, malformed, expired, or signature-mismatched token.
    #[error("invalid bearer token: {0}")]
    InvalidToken(String),

    /// Authenticated, but the role does not permit the operation.
    #[error("role {actual} does not permit this operation (requires {required})")]
    InsufficientRole { required: String, actual: String },

    /// Principal already registered.
    #[error("principal already exists: {0}")]
    AlreadyExists(String),

    /// Principal unknown.
    #[error("principal not found: {0}")]
    NotFound(String),

    #[error("credential hashing failed: {0}")]
    Hash(String),

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("principal store failure: {0}")]
    Storage(String),

    #[error("invalid auth configuration: {0}")]
    Configuration(String),
}

impl From<AuthError> for CoreError {
    fn from(err: AuthError) -> Self {
        let kind = match &err {
            AuthError::InvalidCredentials | AuthError::InvalidToken(_) => {
                ErrorKind::Unauthenticated
            }
            AuthError::InsufficientRole { .. } => ErrorKind::Forbidden,
            AuthError::AlreadyExists(_) => ErrorKind::Conflict,
            AuthError::NotFound(_) => ErrorKind::NotFound,
            AuthError::Hash(_)
            | AuthError::Signing(_)
            | AuthError::Storage(_)
            | AuthError::Configuration(_) => ErrorKind::Internal,
        };
        CoreError::new(kind, err.to_string())
    }
}
