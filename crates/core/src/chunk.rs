//! File, chunk, and node types.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One contiguous byte range of a file, stored as a single blob on one node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position within the file, dense starting at 0.
    pub index: u32,
    /// Globally unique identifier; also the node-side blob address.
    pub id: Uuid,
    /// Byte offset of this chunk within the file.
    pub offset: u64,
    /// Length of this chunk in bytes. Zero is valid for very small files.
    pub size: u64,
    /// Base URL of the node that holds this chunk.
    pub node_base_url: String,
}

/// A named, ordered sequence of chunks whose sizes sum to the file size.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    /// File name; primary key and download path component.
    pub name: String,
    /// Total size in bytes.
    pub size: u64,
    /// Chunks ordered by index.
    pub chunks: Vec<Chunk>,
}

impl File {
    /// Check the structural invariants: non-empty name, dense indices,
    /// contiguous offsets starting at 0, sizes summing to `size`.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::InvalidFile("name must not be empty".into()));
        }
        if self.chunks.is_empty() {
            return Err(Error::InvalidFile(format!(
                "file {} has no chunks",
                self.name
            )));
        }

        let mut expected_offset = 0u64;
        for (i, chunk) in self.chunks.iter().enumerate() {
            if chunk.index as usize != i {
                return Err(Error::InvalidChunkLayout(format!(
                    "chunk at position {i} has index {}",
                    chunk.index
                )));
            }
            if chunk.offset != expected_offset {
                return Err(Error::InvalidChunkLayout(format!(
                    "chunk {i} starts at {} but previous chunk ends at {expected_offset}",
                    chunk.offset
                )));
            }
            if chunk.node_base_url.is_empty() {
                return Err(Error::InvalidChunkLayout(format!(
                    "chunk {i} has no node assigned"
                )));
            }
            expected_offset += chunk.size;
        }

        if expected_offset != self.size {
            return Err(Error::InvalidChunkLayout(format!(
                "chunk sizes sum to {expected_offset}, file size is {}",
                self.size
            )));
        }

        Ok(())
    }
}

/// A storage endpoint identified by its base URL.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    /// Base URL the node serves chunks on; primary key.
    pub base_url: String,
}

/// Observed chunk count and total bytes for one node, derived from the
/// chunks relation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStat {
    /// Base URL of the node.
    pub base_url: String,
    /// Number of chunks currently assigned to the node.
    pub total_chunks: u64,
    /// Sum of sizes of chunks assigned to the node, in bytes.
    pub total_size: u64,
}

/// Split `size` bytes into exactly `count` contiguous `(offset, size)`
/// ranges. Every range is `size / count` bytes except the last, which
/// absorbs the remainder. When `size < count`, leading ranges are empty.
pub fn split_into_chunks(size: u64, count: u32) -> Vec<(u64, u64)> {
    assert!(count > 0, "chunk count must be positive");

    let count = count as u64;
    let chunk_size = size / count;

    (0..count)
        .map(|i| {
            let offset = i * chunk_size;
            if i == count - 1 {
                (offset, size - offset)
            } else {
                (offset, chunk_size)
            }
        })
        .collect()
}
