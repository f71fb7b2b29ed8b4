//! Application state shared across handlers.

use crate::metrics;
use scatter_core::NodeStat;
use scatter_core::config::FrontConfig;
use scatter_metadata::{MetadataResult, MetadataStore};
use scatter_node::{NodeClient, NodeClientFactory};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

/// Registry of node clients and the cached node statistics snapshot.
///
/// One mutex guards both maps. It is a leaf lock: it is held only for map
/// and snapshot mutation, never across I/O or calls into other components.
pub struct NodeRegistry {
    factory: Arc<dyn NodeClientFactory>,
    inner: Mutex<RegistryInner>,
}

struct RegistryInner {
    clients: HashMap<String, Arc<dyn NodeClient>>,
    stats: Vec<NodeStat>,
}

impl NodeRegistry {
    /// Create an empty registry backed by `factory`.
    pub fn new(factory: Arc<dyn NodeClientFactory>) -> Self {
        Self {
            factory,
            inner: Mutex::new(RegistryInner {
                clients: HashMap::new(),
                stats: Vec::new(),
            }),
        }
    }

    /// Return the existing client for `base_url`, creating and inserting
    /// one when absent.
    pub async fn get_client(&self, base_url: &str) -> Arc<dyn NodeClient> {
        let mut inner = self.inner.lock().await;
        if let Some(client) = inner.clients.get(base_url) {
            return client.clone();
        }
        let client = self.factory.new_client(base_url);
        inner.clients.insert(base_url.to_string(), client.clone());
        client
    }

    /// Ensure every node known to the metadata store has a client entry.
    ///
    /// Unknown clients are never evicted; nodes never disappear from the
    /// frontend's view.
    pub async fn fetch_nodes(&self, metadata: &dyn MetadataStore) -> MetadataResult<()> {
        let nodes = metadata.nodes().await?;

        let mut inner = self.inner.lock().await;
        for node in nodes {
            if !inner.clients.contains_key(&node.base_url) {
                let client = self.factory.new_client(&node.base_url);
                inner.clients.insert(node.base_url, client);
            }
        }
        Ok(())
    }

    /// Replace the stats snapshot with a fresh aggregation and publish it
    /// to the per-node gauges.
    pub async fn update_node_stats(&self, metadata: &dyn MetadataStore) -> MetadataResult<()> {
        let stats = metadata.node_stats().await?;
        metrics::observe_node_stats(&stats);

        let mut inner = self.inner.lock().await;
        inner.stats = stats;
        Ok(())
    }

    /// The current stats snapshot, sorted by total size ascending.
    pub async fn stats_snapshot(&self) -> Vec<NodeStat> {
        self.inner.lock().await.stats.clone()
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<FrontConfig>,
    /// Metadata store.
    pub metadata: Arc<dyn MetadataStore>,
    /// Node client registry and stats cache.
    pub registry: Arc<NodeRegistry>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        config: FrontConfig,
        metadata: Arc<dyn MetadataStore>,
        factory: Arc<dyn NodeClientFactory>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            metadata,
            registry: Arc::new(NodeRegistry::new(factory)),
        }
    }
}

/// Spawn the background task that refreshes the node statistics snapshot.
///
/// The task ticks at `interval`, logs and continues on refresh errors, and
/// exits when `shutdown` fires. Exactly one such task runs for the server's
/// lifetime.
pub fn spawn_stat_updater(
    state: AppState,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {
                    if let Err(err) = state
                        .registry
                        .update_node_stats(state.metadata.as_ref())
                        .await
                    {
                        tracing::warn!(error = %err, "Failed to update node stats");
                    }
                }
            }
        }

        tracing::debug!("Node stat updater stopped");
    })
}
