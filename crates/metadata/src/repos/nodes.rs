//! Node repository.

use crate::error::MetadataResult;
use async_trait::async_trait;
use scatter_core::{Node, NodeStat};

/// Repository for registered storage nodes.
#[async_trait]
pub trait NodeRepo: Send + Sync {
    /// List all registered nodes. Order is unspecified.
    async fn nodes(&self) -> MetadataResult<Vec<Node>>;

    /// Register a node. Upsert; re-registration is a no-op.
    async fn add_node(&self, node: &Node) -> MetadataResult<()>;

    /// Chunk count and total bytes for every known node, including zeros
    /// for nodes that currently host nothing, sorted by total size
    /// ascending.
    async fn node_stats(&self) -> MetadataResult<Vec<NodeStat>>;
}
