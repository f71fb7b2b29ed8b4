//! Prometheus metrics for the Scatter frontend.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, IntGaugeVec, Opts, Registry, TextEncoder};
use scatter_core::NodeStat;
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for frontend metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Chunks currently assigned to each node, labeled by node host.
pub static NODE_TOTAL_CHUNKS: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "scatter_node_total_chunks",
            "Chunks currently assigned to the node",
        ),
        &["node"],
    )
    .expect("metric creation failed")
});

/// Bytes currently assigned to each node, labeled by node host.
pub static NODE_TOTAL_SIZE: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "scatter_node_total_size_bytes",
            "Bytes currently assigned to the node",
        ),
        &["node"],
    )
    .expect("metric creation failed")
});

/// Guard to ensure metrics are only registered once.
static REGISTER_ONCE: Once = Once::new();

/// Register all frontend metrics with the registry.
///
/// Idempotent; subsequent calls are no-ops.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(NODE_TOTAL_CHUNKS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(NODE_TOTAL_SIZE.clone()))
            .expect("metric registration failed");
    });
}

/// Publish a node statistics snapshot to the per-node gauges.
pub fn observe_node_stats(stats: &[NodeStat]) {
    for stat in stats {
        let host = node_host(&stat.base_url);
        NODE_TOTAL_CHUNKS
            .with_label_values(&[host])
            .set(stat.total_chunks as i64);
        NODE_TOTAL_SIZE
            .with_label_values(&[host])
            .set(stat.total_size as i64);
    }
}

/// Extract the host part of a node base URL for use as a metric label.
fn node_host(base_url: &str) -> &str {
    let rest = base_url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(base_url);
    let rest = rest.split('/').next().unwrap_or(rest);
    rest.rsplit_once(':').map(|(host, _)| host).unwrap_or(rest)
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}
