//! Placement error type.

use thiserror::Error;

/// Result type alias for placement operations.
pub type PlacementResult<T> = Result<T, PlacementError>;

/// Errors surfaced while loading or serving the placement model.
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("model artifact unreadable: {0}")]
    ArtifactIo(String),

    #[error("model artifact invalid: {0}")]
    ArtifactInvalid(String),
}
