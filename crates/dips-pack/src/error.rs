use thiserror::Error;

/// Errors from exporting a package stream.
#[derive(Debug, Error)]
pub enum PackError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid compression level {0}")]
    InvalidLevel(i32),
}

pub type PackResult<T> = Result<T, PackError>;
