use dips_types::{EntityId, TypeError};
use thiserror::Error;

/// Errors produced while assembling a package.
#[derive(Debug, Error)]
pub enum AssembleError {
    /// The seed entity has no metadata record, or no stored blob.
    #[error("entity not found: {0}")]
    NotFound(EntityId),

    /// A policy could not decode an entity's stored content.
    #[error("cannot decode {id}: {source}")]
    Decode {
        id: EntityId,
        #[source]
        source: TypeError,
    },

    /// Reading an entity's content failed.
    #[error("I/O error reading {id}: {source}")]
    Io {
        id: EntityId,
        #[source]
        source: std::io::Error,
    },

    #[error("store error: {0}")]
    Store(#[from] dips_store::StoreError),

    #[error("metadata error: {0}")]
    Meta(#[from] dips_meta::MetaError),
}

pub type AssembleResult<T> = Result<T, AssembleError>;
