//! HTTP surface of a storage node.

use crate::metrics;
use crate::store::ChunkStore;
use axum::Router;
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use futures::TryStreamExt;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Create the node router.
pub fn create_router(store: Arc<ChunkStore>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/chunks/{id}",
            get(read_chunk).put(write_chunk).delete(delete_chunk),
        )
        .route("/metrics", get(metrics::metrics_handler))
        .layer(TraceLayer::new_for_http())
        // Chunk bodies are streamed to disk; no buffering limit applies.
        .layer(DefaultBodyLimit::disable())
        .with_state(store)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn write_chunk(
    State(store): State<Arc<ChunkStore>>,
    Path(id): Path<Uuid>,
    body: Body,
) -> Result<StatusCode, (StatusCode, String)> {
    let stream = body.into_data_stream().map_err(std::io::Error::other);
    store
        .write(id, Box::pin(stream))
        .await
        .map_err(internal_error)?;
    Ok(StatusCode::OK)
}

async fn read_chunk(
    State(store): State<Arc<ChunkStore>>,
    Path(id): Path<Uuid>,
) -> Result<Response, (StatusCode, String)> {
    let stream = store.read(id).await.map_err(internal_error)?;
    Ok(Body::from_stream(stream).into_response())
}

async fn delete_chunk(
    State(store): State<Arc<ChunkStore>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    store.delete(id).await.map_err(internal_error)?;
    Ok(StatusCode::OK)
}

fn internal_error(err: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}
