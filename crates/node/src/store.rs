//! On-disk chunk store.
//!
//! Chunks are opaque blobs addressed by UUID. On disk they are fanned into
//! subdirectories by identifier prefix to cap directory fan-out:
//! `<root>/<id[0:2]>/<id[2:4]>/<id>`.

use crate::error::ChunkStoreError;
use crate::metrics;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::{ReaderStream, StreamReader};
use uuid::Uuid;

/// Frame size for streaming chunk reads (64 KiB).
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// A boxed stream of bytes.
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// Per-node blob store keyed by chunk identifier.
///
/// Operations on distinct identifiers are independent; the filesystem is the
/// synchronization primitive. Identifiers are freshly generated per upload,
/// so concurrent writes to the same id do not occur.
pub struct ChunkStore {
    root: PathBuf,
}

impl ChunkStore {
    /// Create a chunk store rooted at `root`, creating the directory if
    /// absent.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self, ChunkStoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn chunk_path(&self, id: Uuid) -> PathBuf {
        let id = id.to_string();
        self.root.join(&id[0..2]).join(&id[2..4]).join(&id)
    }

    /// Stream `source` into the blob for `id`.
    ///
    /// A partially written file is removed best-effort on failure.
    pub async fn write(&self, id: Uuid, source: ByteStream) -> Result<(), ChunkStoreError> {
        let path = self.chunk_path(id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&path).await?;

        match copy_into(&mut file, source).await {
            Ok(written) => {
                metrics::BYTES_WRITTEN.inc_by(written);
                metrics::CHUNKS_WRITTEN.inc();
                Ok(())
            }
            Err(err) => {
                drop(file);
                if let Err(remove_err) = fs::remove_file(&path).await {
                    tracing::warn!(
                        chunk_id = %id,
                        error = %remove_err,
                        "Failed to remove partial chunk"
                    );
                }
                Err(err.into())
            }
        }
    }

    /// Open the blob for `id` as a byte stream.
    pub async fn read(&self, id: Uuid) -> Result<ByteStream, ChunkStoreError> {
        let path = self.chunk_path(id);
        let file = fs::File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ChunkStoreError::NotFound(id)
            } else {
                ChunkStoreError::Io(e)
            }
        })?;

        metrics::CHUNKS_READ.inc();

        let stream = ReaderStream::with_capacity(file, STREAM_CHUNK_SIZE).map_ok(|bytes| {
            metrics::BYTES_READ.inc_by(bytes.len() as u64);
            bytes
        });
        Ok(Box::pin(stream))
    }

    /// Remove the blob for `id`. Absence is success.
    pub async fn delete(&self, id: Uuid) -> Result<(), ChunkStoreError> {
        match fs::remove_file(self.chunk_path(id)).await {
            Ok(()) => {
                metrics::CHUNKS_DELETED.inc();
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

async fn copy_into(file: &mut fs::File, source: ByteStream) -> std::io::Result<u64> {
    let mut reader = StreamReader::new(source);
    let written = tokio::io::copy(&mut reader, file).await?;
    file.flush().await?;
    Ok(written)
}
