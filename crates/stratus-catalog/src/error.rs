//! Catalog error type.

use stratus_core::CoreError;
use stratus_providers::AdapterError;
use thiserror::Error;

/// Result type alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors surfaced by the object catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A provider adapter failed during refresh.
    #[error("provider error: {0}")]
    Provider(#[from] AdapterError),

    /// Refresh was asked for a provider the catalog does not track.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}

impl From<CatalogError> for CoreError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Provider(inner) => inner.into(),
            CatalogError::UnknownProvider(msg) => CoreError::invalid_argument(msg),
        }
    }
}
