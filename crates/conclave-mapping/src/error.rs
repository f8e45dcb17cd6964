//! Mapping-store errors.

use thiserror::Error;

/// Errors a [`crate::MappingStore`] operation can fail with.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// No mapping exists for the given external key.
    #[error("no mapping for the given external key")]
    NotFound,
}

/// Result alias for mapping-store operations.
pub type MappingResult<T> = Result<T, MappingError>;
