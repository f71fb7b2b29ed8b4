//! Route configuration.

use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

/// Create the frontend router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // The self-registration client historically used PUT; accept both.
        .route(
            "/register",
            post(handlers::register).put(handlers::register),
        )
        .route("/upload", post(handlers::upload))
        .route("/download/{file_name}", get(handlers::download))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        // Upload bodies are buffered with spill-to-disk; no fixed limit.
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}
