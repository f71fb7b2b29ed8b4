//! Error types for the storage node and node client.

use thiserror::Error;
use uuid::Uuid;

/// Chunk store operation errors.
#[derive(Debug, Error)]
pub enum ChunkStoreError {
    #[error("chunk not found: {0}")]
    NotFound(Uuid),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Node client transport errors.
#[derive(Debug, Error)]
pub enum NodeClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status code {status} from {url}")]
    Status { status: u16, url: String },
}
