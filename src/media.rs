//! Media upload against the chunked upload endpoint.
//!
//! Images go up in a single multipart request. Video and animated content
//! follow the four-phase protocol: INIT declares the byte size and MIME
//! type, APPEND sends fixed-size chunks with strictly increasing contiguous
//! segment indices, FINALIZE closes the session, and STATUS polls until the
//! server finishes processing. Any failing phase abandons the whole upload
//! with no partial-state cleanup; the caller restarts from scratch.

use log::{debug, info, warn};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde_json::Value;

use crate::error::{ClientError, UploadPhase};
use crate::http::Executor;
use crate::types::MediaAttachment;

/// Fixed APPEND chunk size.
const CHUNK_SIZE: usize = 5 * 1024 * 1024;

/// Fallback between STATUS polls when the server suggests no delay.
const STATUS_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(5);

/// Uploads one attachment and returns the server-assigned media id, usable
/// as an attachment reference in a subsequent tweet creation call.
///
/// The processing poll for video uploads has no built-in attempt limit,
/// mirroring the server contract, which gives no timeout signal of its own.
/// Callers needing a bound should wrap this future in `tokio::time::timeout`
/// or drop it to cancel.
pub(crate) async fn upload_media(
    exec: &Executor,
    attachment: &MediaAttachment,
) -> Result<String, ClientError> {
    if is_chunked_type(&attachment.media_type) {
        upload_chunked(exec, &attachment.data, &attachment.media_type, CHUNK_SIZE).await
    } else {
        upload_image(exec, &attachment.data).await
    }
}

/// Video and animated GIF content goes through the chunked protocol; plain
/// images use the single-shot path.
fn is_chunked_type(media_type: &str) -> bool {
    media_type.starts_with("video/") || media_type == "image/gif"
}

/// Single-shot image upload: one multipart POST tagged as an image.
async fn upload_image(exec: &Executor, data: &[u8]) -> Result<String, ClientError> {
    info!("Uploading image ({} bytes)", data.len());
    let form = Form::new()
        .text("media_category", "tweet_image")
        .part("media", Part::bytes(data.to_vec()).file_name("media"));
    let response = exec
        .execute_multipart(&exec.endpoints.upload, form)
        .await
        .map_err(|e| ClientError::upload(UploadPhase::Init, e))?;
    media_id_from(&response, UploadPhase::Init)
}

/// Four-phase chunked upload. `chunk_size` is always [`CHUNK_SIZE`] outside
/// of tests.
///
/// APPEND requests run strictly sequentially: the server rejects FINALIZE
/// unless segment indices are zero-based, monotonic, and contiguous.
pub(crate) async fn upload_chunked(
    exec: &Executor,
    data: &[u8],
    media_type: &str,
    chunk_size: usize,
) -> Result<String, ClientError> {
    let category = if media_type == "image/gif" {
        "tweet_gif"
    } else {
        "tweet_video"
    };
    info!(
        "Starting chunked upload: {} bytes of {} as {}",
        data.len(),
        media_type,
        category
    );

    // INIT
    let total_bytes = data.len().to_string();
    let init = exec
        .execute_form(
            &exec.endpoints.upload,
            &[
                ("command", "INIT"),
                ("total_bytes", &total_bytes),
                ("media_type", media_type),
                ("media_category", category),
            ],
            &[],
        )
        .await
        .map_err(|e| ClientError::upload(UploadPhase::Init, e))?;
    let media_id = media_id_from(&init, UploadPhase::Init)?;
    debug!("Upload session {} initialized", media_id);

    // APPEND: one chunk per request, segment indices 0, 1, 2, ...
    for (segment_index, chunk) in data.chunks(chunk_size).enumerate() {
        let form = Form::new()
            .text("command", "APPEND")
            .text("media_id", media_id.clone())
            .text("segment_index", segment_index.to_string())
            .part("media", Part::bytes(chunk.to_vec()).file_name("media"));
        exec.execute_multipart(&exec.endpoints.upload, form)
            .await
            .map_err(|e| ClientError::upload(UploadPhase::Append, e))?;
        debug!("Appended segment {} ({} bytes)", segment_index, chunk.len());
    }

    // FINALIZE
    let finalize = exec
        .execute_form(
            &exec.endpoints.upload,
            &[("command", "FINALIZE"), ("media_id", &media_id)],
            &[],
        )
        .await
        .map_err(|e| ClientError::upload(UploadPhase::Finalize, e))?;

    // Some categories finish synchronously; only poll when the server says
    // processing is still underway.
    if finalize.get("processing_info").is_some() {
        await_processing(exec, &media_id).await?;
    }

    info!("Upload {} complete", media_id);
    Ok(media_id)
}

/// STATUS poll loop.
///
/// Terminates successfully on state `succeeded`, or when the response has
/// no processing state at all (the media is already usable). Raises on
/// state `failed`. Otherwise sleeps the server-suggested interval, or a
/// fixed fallback, and retries. The loop itself is unbounded.
async fn await_processing(exec: &Executor, media_id: &str) -> Result<(), ClientError> {
    loop {
        let url = format!(
            "{}?command=STATUS&media_id={}",
            exec.endpoints.upload,
            urlencoding::encode(media_id)
        );
        let status = exec
            .execute(Method::GET, &url, None, &[])
            .await
            .map_err(|e| ClientError::upload(UploadPhase::Status, e))?;

        let info = match status.get("processing_info") {
            Some(info) => info,
            None => return Ok(()),
        };
        match info.get("state").and_then(|s| s.as_str()) {
            Some("succeeded") | None => return Ok(()),
            Some("failed") => {
                let message = info
                    .get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
                    .unwrap_or("server-side processing failed");
                warn!("Upload {} failed processing: {}", media_id, message);
                return Err(ClientError::Upload {
                    phase: UploadPhase::Status,
                    status: None,
                    message: message.to_string(),
                });
            }
            Some(state) => {
                let delay = info
                    .get("check_after_secs")
                    .and_then(|s| s.as_u64())
                    .map(std::time::Duration::from_secs)
                    .unwrap_or(STATUS_POLL_INTERVAL);
                debug!(
                    "Upload {} still {}, polling again in {:?}",
                    media_id, state, delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Extracts the server-assigned media id, failing the given phase when the
/// response carries none.
fn media_id_from(response: &Value, phase: UploadPhase) -> Result<String, ClientError> {
    response
        .get("media_id_string")
        .and_then(|id| id.as_str())
        .map(str::to_string)
        .or_else(|| {
            response
                .get("media_id")
                .and_then(|id| id.as_u64())
                .map(|id| id.to_string())
        })
        .ok_or(ClientError::Upload {
            phase,
            status: None,
            message: "response contains no media id".to_string(),
        })
}
