//! Error types for metadata operations.

use dips_types::EntityId;
use thiserror::Error;

/// Errors that can occur during metadata operations.
#[derive(Debug, Error)]
pub enum MetaError {
    /// No metadata record exists for the id.
    #[error("metadata record not found: {0}")]
    NotFound(EntityId),

    /// The store does not accept mutations.
    #[error("metadata store is read-only")]
    ReadOnly,

    /// The id cannot be used as a storage key.
    #[error("invalid entity id: {0}")]
    InvalidId(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error during file-based metadata operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal lock was poisoned.
    #[error("metadata lock poisoned")]
    Poisoned,
}

impl From<dips_store::StoreError> for MetaError {
    fn from(e: dips_store::StoreError) -> Self {
        match e {
            dips_store::StoreError::Io(io) => Self::Io(io),
            dips_store::StoreError::NotFound(id) => Self::NotFound(id),
            dips_store::StoreError::InvalidId(id) => Self::InvalidId(id),
            dips_store::StoreError::Poisoned => Self::Poisoned,
        }
    }
}

/// Convenience type alias for metadata operations.
pub type Result<T> = std::result::Result<T, MetaError>;
