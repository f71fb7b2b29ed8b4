//! Database models mapping to the metadata schema.

use sqlx::FromRow;
use uuid::Uuid;

/// File record.
#[derive(Debug, Clone, FromRow)]
pub struct FileRow {
    pub name: String,
    pub size: i64,
}

/// Chunk record. `(file, index)` is the primary key.
#[derive(Debug, Clone, FromRow)]
pub struct ChunkRow {
    pub file: String,
    pub index: i64,
    pub id: Uuid,
    pub offset: i64,
    pub size: i64,
    pub node: String,
}

/// Registered node record.
#[derive(Debug, Clone, FromRow)]
pub struct NodeRow {
    pub base_url: String,
}

/// Aggregated per-node chunk usage.
#[derive(Debug, Clone, FromRow)]
pub struct NodeUsageRow {
    pub node: String,
    pub total_chunks: i64,
    pub total_size: i64,
}
