//! In-process fakes: in-memory node clients and a metadata wrapper with an
//! injectable add_file failure.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use scatter_core::{File, Node, NodeStat};
use scatter_metadata::{FileRepo, MetadataError, MetadataResult, MetadataStore, NodeRepo};
use scatter_node::store::ByteStream;
use scatter_node::{NodeClient, NodeClientError, NodeClientFactory};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// An in-memory storage node.
pub struct InMemoryNode {
    base_url: String,
    chunks: Mutex<HashMap<Uuid, Vec<u8>>>,
}

impl InMemoryNode {
    fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            chunks: Mutex::new(HashMap::new()),
        }
    }

    /// Number of chunks currently held.
    #[allow(dead_code)]
    pub fn chunk_count(&self) -> usize {
        self.chunks.lock().unwrap().len()
    }

    /// Total bytes currently held.
    #[allow(dead_code)]
    pub fn total_bytes(&self) -> usize {
        self.chunks.lock().unwrap().values().map(Vec::len).sum()
    }
}

#[async_trait]
impl NodeClient for InMemoryNode {
    async fn write(&self, id: Uuid, mut body: ByteStream) -> Result<(), NodeClientError> {
        let mut data = Vec::new();
        while let Some(frame) = body.next().await {
            let frame = frame.map_err(|e| NodeClientError::Status {
                status: 500,
                url: format!("{}: {e}", self.base_url),
            })?;
            data.extend_from_slice(&frame);
        }
        self.chunks.lock().unwrap().insert(id, data);
        Ok(())
    }

    async fn read(&self, id: Uuid) -> Result<ByteStream, NodeClientError> {
        let data = self.chunks.lock().unwrap().get(&id).cloned();
        match data {
            Some(data) => Ok(Box::pin(futures::stream::once(async move {
                Ok(Bytes::from(data))
            }))),
            None => Err(NodeClientError::Status {
                status: 500,
                url: format!("{}/chunks/{id}", self.base_url),
            }),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), NodeClientError> {
        self.chunks.lock().unwrap().remove(&id);
        Ok(())
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Factory handing out shared in-memory nodes keyed by base URL.
#[derive(Default)]
pub struct InMemoryNodeFactory {
    nodes: Mutex<HashMap<String, Arc<InMemoryNode>>>,
}

impl InMemoryNodeFactory {
    /// Get or create the node behind `base_url`.
    pub fn node(&self, base_url: &str) -> Arc<InMemoryNode> {
        self.nodes
            .lock()
            .unwrap()
            .entry(base_url.to_string())
            .or_insert_with(|| Arc::new(InMemoryNode::new(base_url)))
            .clone()
    }

    /// Total chunks held across all nodes.
    #[allow(dead_code)]
    pub fn total_chunks(&self) -> usize {
        self.nodes
            .lock()
            .unwrap()
            .values()
            .map(|n| n.chunk_count())
            .sum()
    }

    /// Total bytes held across all nodes.
    #[allow(dead_code)]
    pub fn total_bytes(&self) -> usize {
        self.nodes
            .lock()
            .unwrap()
            .values()
            .map(|n| n.total_bytes())
            .sum()
    }
}

impl NodeClientFactory for InMemoryNodeFactory {
    fn new_client(&self, base_url: &str) -> Arc<dyn NodeClient> {
        self.node(base_url)
    }
}

/// Wraps a metadata store and fails `add_file` when armed.
pub struct FailingMetadata {
    inner: Arc<dyn MetadataStore>,
    fail_add_file: std::sync::atomic::AtomicBool,
}

impl FailingMetadata {
    #[allow(dead_code)]
    pub fn new(inner: Arc<dyn MetadataStore>) -> Self {
        Self {
            inner,
            fail_add_file: std::sync::atomic::AtomicBool::new(false),
        }
    }

    #[allow(dead_code)]
    pub fn fail_next_add_file(&self, fail: bool) {
        self.fail_add_file
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }
}

#[async_trait]
impl FileRepo for FailingMetadata {
    async fn file(&self, name: &str) -> MetadataResult<File> {
        self.inner.file(name).await
    }

    async fn add_file(&self, file: &File) -> MetadataResult<()> {
        if self.fail_add_file.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(MetadataError::Internal("injected add_file failure".into()));
        }
        self.inner.add_file(file).await
    }

    async fn remove_file(&self, name: &str) -> MetadataResult<()> {
        self.inner.remove_file(name).await
    }
}

#[async_trait]
impl NodeRepo for FailingMetadata {
    async fn nodes(&self) -> MetadataResult<Vec<Node>> {
        self.inner.nodes().await
    }

    async fn add_node(&self, node: &Node) -> MetadataResult<()> {
        self.inner.add_node(node).await
    }

    async fn node_stats(&self) -> MetadataResult<Vec<NodeStat>> {
        self.inner.node_stats().await
    }
}

#[async_trait]
impl MetadataStore for FailingMetadata {
    async fn migrate(&self) -> MetadataResult<()> {
        self.inner.migrate().await
    }

    async fn health_check(&self) -> MetadataResult<()> {
        self.inner.health_check().await
    }
}
