//! API error mapping.
//!
//! Core error kinds map onto transport status codes and a structured JSON
//! body. Transient internals are wrapped before they reach a client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use stratus_auth::AuthError;
use stratus_catalog::CatalogError;
use stratus_core::{CoreError, ErrorKind};
use stratus_engine::EngineError;
use stratus_providers::AdapterError;
use thiserror::Error;

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// An error leaving the control API.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ApiError(pub CoreError);

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine code from the error taxonomy.
    pub code: String,

    /// Human-readable message. Never contains credentials.
    pub message: String,

    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        self.0.kind
    }

    fn status_code(&self) -> StatusCode {
        match self.0.kind {
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Overloaded => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::ProviderUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Transient | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Transient is internal vocabulary; clients see INTERNAL.
        let (code, message) = match self.0.kind {
            ErrorKind::Transient | ErrorKind::Internal => {
                tracing::error!("internal error surfaced to client: {}", self.0);
                (
                    ErrorKind::Internal.code().to_string(),
                    "internal error".to_string(),
                )
            }
            kind => (kind.code().to_string(), self.0.message),
        };

        let body = ErrorResponse {
            code,
            message,
            timestamp: chrono::Utc::now(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(err.into())
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err.into())
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        Self(err.into())
    }
}

impl From<AdapterError> for ApiError {
    fn from(err: AdapterError) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError(CoreError::unauthenticated("x")).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError(CoreError::overloaded("x")).status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError(CoreError::provider_unavailable("x")).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_transient_is_wrapped() {
        let err = ApiError(CoreError::transient("socket reset"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
