//! File repository.

use crate::error::MetadataResult;
use async_trait::async_trait;
use scatter_core::File;

/// Repository for file and chunk operations.
///
/// All mutating operations are idempotent so callers may retry freely.
#[async_trait]
pub trait FileRepo: Send + Sync {
    /// Get a file with its chunks ordered by index.
    ///
    /// Returns [`MetadataError::NotFound`](crate::MetadataError::NotFound)
    /// when the file row is absent and
    /// [`MetadataError::ChunksMissing`](crate::MetadataError::ChunksMissing)
    /// when the file row exists without any chunk rows.
    async fn file(&self, name: &str) -> MetadataResult<File>;

    /// Upsert the file row and all of its chunk rows in one transaction.
    ///
    /// A retry after partial success converges to the same final state.
    async fn add_file(&self, file: &File) -> MetadataResult<()>;

    /// Delete the file row and all of its chunk rows in one transaction.
    /// Absence is success.
    async fn remove_file(&self, name: &str) -> MetadataResult<()>;
}
