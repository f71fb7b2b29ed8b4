//! Download orchestration: stream chunks back in index order as one
//! continuous body.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;

/// GET /download/{file_name} - reassemble a file from its chunks.
///
/// Chunks are concatenated strictly by index. A read failure mid-stream is
/// logged and truncates the body; the status line has already been sent.
pub async fn download(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> ApiResult<Response> {
    // A missing file surfaces as a server error; the download surface does
    // not distinguish not-found from read failures.
    let file = state
        .metadata
        .file(&file_name)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let size = file.size;
    let registry = state.registry.clone();

    let body_stream = async_stream::stream! {
        for chunk in file.chunks {
            let client = registry.get_client(&chunk.node_base_url).await;
            let mut blob = match client.read(chunk.id).await {
                Ok(blob) => blob,
                Err(err) => {
                    tracing::error!(
                        chunk_index = chunk.index,
                        chunk_id = %chunk.id,
                        error = %err,
                        "Chunk read failed mid-download"
                    );
                    return;
                }
            };
            while let Some(frame) = blob.next().await {
                match frame {
                    Ok(bytes) => yield Ok::<_, std::io::Error>(bytes),
                    Err(err) => {
                        tracing::error!(
                            chunk_index = chunk.index,
                            chunk_id = %chunk.id,
                            error = %err,
                            "Chunk stream failed mid-download"
                        );
                        return;
                    }
                }
            }
        }
    };

    Ok((
        StatusCode::OK,
        [(header::CONTENT_LENGTH, size.to_string())],
        Body::from_stream(body_stream),
    )
        .into_response())
}
