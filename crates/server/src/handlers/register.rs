//! Node registration handler.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use scatter_core::Node;
use serde::Deserialize;

/// Query parameters of the registration request.
#[derive(Debug, Deserialize)]
pub struct RegisterParams {
    #[serde(rename = "baseURL", default)]
    base_url: Option<String>,
}

/// POST|PUT /register?baseURL=<url> - register a storage node.
///
/// Idempotent; re-registration is a no-op upsert.
pub async fn register(
    State(state): State<AppState>,
    Query(params): Query<RegisterParams>,
) -> ApiResult<StatusCode> {
    let base_url = params
        .base_url
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ApiError::BadRequest("baseURL is required".to_string()))?;

    state
        .metadata
        .add_node(&Node {
            base_url: base_url.clone(),
        })
        .await?;

    tracing::info!(base_url = %base_url, "Registered node");

    state.registry.fetch_nodes(state.metadata.as_ref()).await?;
    state
        .registry
        .update_node_stats(state.metadata.as_ref())
        .await?;

    Ok(StatusCode::OK)
}
