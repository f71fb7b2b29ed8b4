//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid file: {0}")]
    InvalidFile(String),

    #[error("invalid chunk layout: {0}")]
    InvalidChunkLayout(String),

    #[error("invalid node: {0}")]
    InvalidNode(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
