//! Prometheus metrics for the storage node.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for node metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

pub static BYTES_READ: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "scatter_node_bytes_read_total",
        "Total chunk bytes read from disk",
    )
    .expect("metric creation failed")
});

pub static BYTES_WRITTEN: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "scatter_node_bytes_written_total",
        "Total chunk bytes written to disk",
    )
    .expect("metric creation failed")
});

pub static CHUNKS_READ: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new("scatter_node_chunks_read_total", "Total chunks read")
        .expect("metric creation failed")
});

pub static CHUNKS_WRITTEN: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new("scatter_node_chunks_written_total", "Total chunks written")
        .expect("metric creation failed")
});

pub static CHUNKS_DELETED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new("scatter_node_chunks_deleted_total", "Total chunks deleted")
        .expect("metric creation failed")
});

/// Guard to ensure metrics are only registered once.
static REGISTER_ONCE: Once = Once::new();

/// Register all node metrics with the registry.
///
/// Idempotent; subsequent calls are no-ops so tests and embedded routers can
/// call it freely.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(BYTES_READ.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(BYTES_WRITTEN.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(CHUNKS_READ.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(CHUNKS_WRITTEN.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(CHUNKS_DELETED.clone()))
            .expect("metric registration failed");
    });
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        // This would panic if any metric creation failed
        register_metrics();
    }
}
