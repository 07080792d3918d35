use thiserror::Error;

/// Errors produced by type operations and the entity codec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown entity kind: {0}")]
    UnknownKind(String),

    #[error("invalid entity id: {0}")]
    InvalidId(String),

    #[error("kind mismatch for {id}: expected {expected}, found {actual}")]
    KindMismatch {
        id: String,
        expected: String,
        actual: String,
    },

    #[error("malformed package: {0}")]
    MalformedPackage(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
