//! Upload orchestration: multipart parse, placement, concurrent chunk
//! fan-out, and best-effort cleanup on failure.

use crate::error::{ApiError, ApiResult};
use crate::placement::select_least_filled;
use crate::range::UploadSource;
use crate::state::AppState;
use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::BytesMut;
use scatter_core::{Chunk, File, MAX_MULTIPART_MEMORY, split_into_chunks};
use tokio::io::AsyncWriteExt;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// POST /upload - split the first file part of a multipart form into chunks,
/// scatter them across the least-filled nodes, and record the file.
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    // Pick up nodes registered since the last refresh, and aggregate fresh
    // stats so placement sees them.
    state.registry.fetch_nodes(state.metadata.as_ref()).await?;
    state
        .registry
        .update_node_stats(state.metadata.as_ref())
        .await?;

    let (file_name, source) = read_first_file_part(&mut multipart).await?;

    let chunks = plan_chunks(&state, source.len()).await?;
    let file = File {
        name: file_name.clone(),
        size: source.len(),
        chunks,
    };

    tracing::info!(
        file = %file.name,
        size = file.size,
        chunks = file.chunks.len(),
        "Uploading file"
    );

    // The failure group runs in its own task so that a client disconnect
    // cannot cancel cleanup; the drop guard still propagates the disconnect
    // into the group as cancellation.
    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let task_state = state.clone();
    let task_file = file.clone();
    let outcome = tokio::spawn(async move {
        match run_upload_group(&task_state, &task_file, &source, cancel).await {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::warn!(
                    file = %task_file.name,
                    error = %err,
                    "Upload failed, cleaning up"
                );
                cleanup(&task_state, task_file).await;
                Err(err)
            }
        }
    })
    .await
    .map_err(|err| ApiError::Internal(format!("upload task failed: {err}")))?;
    outcome?;

    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| state.config.bind.clone());

    Ok((
        StatusCode::OK,
        format!("http://{host}/download/{file_name}\n"),
    )
        .into_response())
}

/// Select the first field of the form that carries a file, buffering its
/// contents. The form key is informational.
async fn read_first_file_part(
    multipart: &mut Multipart,
) -> Result<(String, UploadSource), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart form: {e}")))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if file_name.is_empty() {
            return Err(ApiError::BadRequest("file name is required".to_string()));
        }

        tracing::info!(
            form_key = field.name().unwrap_or_default(),
            file_name = %file_name,
            "Selected file from form"
        );

        let source = buffer_field(field).await?;
        return Ok((file_name, source));
    }

    Err(ApiError::BadRequest("file is required".to_string()))
}

/// Buffer a multipart field, spilling to an unlinked temporary file once the
/// payload exceeds the in-memory budget.
async fn buffer_field(mut field: Field<'_>) -> Result<UploadSource, ApiError> {
    let mut buffer = BytesMut::new();
    let mut spilled: Option<tokio::fs::File> = None;
    let mut total: u64 = 0;

    while let Some(piece) = field
        .chunk()
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {e}")))?
    {
        total += piece.len() as u64;
        match &mut spilled {
            Some(file) => file
                .write_all(&piece)
                .await
                .map_err(|e| ApiError::Internal(format!("spill upload: {e}")))?,
            None => {
                buffer.extend_from_slice(&piece);
                if buffer.len() as u64 > MAX_MULTIPART_MEMORY {
                    let std_file = tokio::task::spawn_blocking(tempfile::tempfile)
                        .await
                        .map_err(|e| ApiError::Internal(format!("spill upload: {e}")))?
                        .map_err(|e| ApiError::Internal(format!("spill upload: {e}")))?;
                    let mut file = tokio::fs::File::from_std(std_file);
                    file.write_all(&buffer)
                        .await
                        .map_err(|e| ApiError::Internal(format!("spill upload: {e}")))?;
                    buffer = BytesMut::new();
                    spilled = Some(file);
                }
            }
        }
    }

    match spilled {
        Some(mut file) => {
            file.flush()
                .await
                .map_err(|e| ApiError::Internal(format!("spill upload: {e}")))?;
            Ok(UploadSource::from_spilled(file.into_std().await, total))
        }
        None => Ok(UploadSource::from_bytes(buffer.freeze())),
    }
}

/// Build the chunk descriptors for a payload of `size` bytes: contiguous
/// ranges, a fresh identifier per chunk, and a node from placement.
async fn plan_chunks(state: &AppState, size: u64) -> Result<Vec<Chunk>, ApiError> {
    let stats = state.registry.stats_snapshot().await;
    let placed = select_least_filled(&stats, state.config.chunks_per_file)?;

    Ok(split_into_chunks(size, state.config.chunks_per_file)
        .into_iter()
        .zip(placed)
        .enumerate()
        .map(|(index, ((offset, size), stat))| Chunk {
            index: index as u32,
            id: Uuid::new_v4(),
            offset,
            size,
            node_base_url: stat.base_url,
        })
        .collect())
}

/// Run the N chunk writes plus the metadata insert as one failure group:
/// the first error (or cancellation) aborts every sibling and is reported
/// after cleanup.
async fn run_upload_group(
    state: &AppState,
    file: &File,
    source: &UploadSource,
    cancel: CancellationToken,
) -> Result<(), ApiError> {
    let mut tasks: JoinSet<Result<(), ApiError>> = JoinSet::new();

    for chunk in &file.chunks {
        let client = state.registry.get_client(&chunk.node_base_url).await;
        let reader = source.range_reader(chunk.offset, chunk.size);
        let id = chunk.id;
        tasks.spawn(async move {
            client
                .write(id, reader.into_stream())
                .await
                .map_err(ApiError::from)
        });
    }

    let metadata = state.metadata.clone();
    let record = file.clone();
    tasks.spawn(async move { metadata.add_file(&record).await.map_err(ApiError::from) });

    let mut first_error = None;
    loop {
        tokio::select! {
            _ = cancel.cancelled(), if first_error.is_none() => {
                first_error = Some(ApiError::Internal("upload cancelled".to_string()));
                tasks.abort_all();
            }
            joined = tasks.join_next() => {
                let Some(joined) = joined else { break };
                match joined {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        if first_error.is_none() {
                            first_error = Some(err);
                            tasks.abort_all();
                        }
                    }
                    Err(join_err) if join_err.is_cancelled() => {}
                    Err(join_err) => {
                        if first_error.is_none() {
                            first_error = Some(ApiError::Internal(format!(
                                "upload task panicked: {join_err}"
                            )));
                            tasks.abort_all();
                        }
                    }
                }
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Best-effort removal of every chunk and the metadata record after a failed
/// upload. Failures are logged, never propagated. Runs on the server's own
/// context: the caller is a detached task a disconnected client cannot
/// cancel.
async fn cleanup(state: &AppState, file: File) {
    for chunk in &file.chunks {
        let client = state.registry.get_client(&chunk.node_base_url).await;
        if let Err(err) = client.delete(chunk.id).await {
            tracing::warn!(
                chunk_id = %chunk.id,
                error = %err,
                "Failed to delete chunk"
            );
        }
    }
    if let Err(err) = state.metadata.remove_file(&file.name).await {
        tracing::warn!(file = %file.name, error = %err, "Failed to remove file");
    }
}
