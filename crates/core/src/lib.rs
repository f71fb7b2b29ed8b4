//! Core domain types and shared logic for the Scatter object store.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Files, chunks, nodes, and per-node statistics
//! - Chunk layout computation for uploads
//! - Configuration types for the frontend and storage nodes

pub mod chunk;
pub mod config;
pub mod error;

pub use chunk::{Chunk, File, Node, NodeStat, split_into_chunks};
pub use error::{Error, Result};

/// Number of chunks every uploaded file is split into.
pub const CHUNKS_PER_FILE: u32 = 6;

/// In-memory budget for buffering multipart upload forms: 32 MiB.
pub const MAX_MULTIPART_MEMORY: u64 = 32 * 1024 * 1024;

/// How often the frontend refreshes its node statistics snapshot.
pub const STATS_REFRESH_INTERVAL_SECS: u64 = 1;
