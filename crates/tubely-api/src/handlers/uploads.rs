//! Thumbnail and video upload handlers.

use std::io;

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use futures_util::TryStreamExt;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;
use tracing::{debug, info};

use tubely_media::{BodyLimitExceeded, MalformedBody};
use tubely_models::{normalize_media_type, AssetKind, VideoId, VideoRecord};

use crate::auth::bearer_token;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::services::{UploadRequest, UploadStage};
use crate::state::AppState;

/// `POST /videos/:video_id/thumbnail` (multipart field `thumbnail`).
pub async fn upload_thumbnail(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<VideoRecord>> {
    handle_upload(state, AssetKind::Thumbnail, &video_id, &headers, multipart).await
}

/// `POST /videos/:video_id/video` (multipart field `video`).
pub async fn upload_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<VideoRecord>> {
    handle_upload(state, AssetKind::Video, &video_id, &headers, multipart).await
}

async fn handle_upload(
    state: AppState,
    kind: AssetKind,
    raw_video_id: &str,
    headers: &HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<VideoRecord>> {
    let video_id = VideoId::parse(raw_video_id).map_err(|_| ApiError::bad_request("Invalid ID"))?;

    // Authenticating
    let user_id = bearer_token(headers)
        .and_then(|token| state.verifier.verify(token))
        .map_err(|e| {
            debug!(video_id = %video_id, stage = %UploadStage::Authenticating, "Rejected token");
            metrics::record_upload_outcome(
                kind.as_str(),
                "failure",
                UploadStage::Authenticating.as_str(),
            );
            e
        })?;

    // Authorizing, before any part of the body is read
    let record = state.uploads.authorize(&video_id, &user_id, kind).await?;

    // Form errors surface only for an authorized caller
    let mut multipart = multipart.map_err(|e| {
        ApiError::bad_request(format!("Unable to parse form: {}", e.body_text()))
    })?;

    info!(
        video_id = %video_id,
        user_id = %user_id,
        kind = %kind,
        "Uploading {}",
        kind
    );

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        if field.name() != Some(kind.field_name()) {
            continue;
        }

        let media_type = field
            .content_type()
            .map(normalize_media_type)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::bad_request("Missing Content-Type for file"))?;

        let updated = state
            .uploads
            .upload(UploadRequest {
                record,
                kind,
                media_type,
                body: field_reader(field),
            })
            .await?;

        return Ok(Json(updated));
    }

    Err(ApiError::bad_request(format!(
        "Unable to parse form file: missing '{}' field",
        kind.field_name()
    )))
}

/// Adapt a multipart field into a byte reader for staging.
fn field_reader(field: Field<'_>) -> impl AsyncRead + Unpin + Send + '_ {
    StreamReader::new(Box::pin(field.map_err(stream_error)))
}

/// Body errors surfacing mid-file. Anything the client caused (exceeded limit, truncated or
/// malformed part) is tagged so staging reports it as a client error; transport failures
/// stay server errors.
fn stream_error(e: MultipartError) -> io::Error {
    let status = e.status();
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        io::Error::other(BodyLimitExceeded)
    } else if status.is_client_error() {
        io::Error::other(MalformedBody(e.body_text()))
    } else {
        io::Error::other(e)
    }
}

fn form_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::bad_request("Upload exceeds maximum size")
    } else {
        ApiError::bad_request(format!("Unable to parse form: {}", e.body_text()))
    }
}
