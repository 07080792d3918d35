use dips_assemble::AssembleError;
use dips_types::{EntityId, TypeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("entity not found: {0}")]
    NotFound(EntityId),

    #[error("entity {0} has no content location")]
    NoContentLocation(EntityId),

    #[error("unsupported content location: {0}")]
    UnsupportedLocation(String),

    #[error("malformed package: {0}")]
    MalformedPackage(String),

    #[error("unknown policy: {0}")]
    UnknownPolicy(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("entity model error: {0}")]
    Type(TypeError),

    #[error("store error: {0}")]
    Store(#[from] dips_store::StoreError),

    #[error("metadata error: {0}")]
    Meta(#[from] dips_meta::MetaError),

    #[error("assembly error: {0}")]
    Assemble(AssembleError),

    #[error("export error: {0}")]
    Pack(#[from] dips_pack::PackError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<AssembleError> for ArchiveError {
    fn from(e: AssembleError) -> Self {
        match e {
            AssembleError::NotFound(id) => Self::NotFound(id),
            other => Self::Assemble(other),
        }
    }
}

impl From<TypeError> for ArchiveError {
    fn from(e: TypeError) -> Self {
        match e {
            TypeError::MalformedPackage(msg) => Self::MalformedPackage(msg),
            other => Self::Type(other),
        }
    }
}

pub type ArchiveResult<T> = Result<T, ArchiveError>;
