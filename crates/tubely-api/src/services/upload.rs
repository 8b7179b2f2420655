//! Upload pipeline: stage, probe, remux, publish, record update.
//!
//! One call handles one upload from start to finish. Every file the pipeline creates is owned
//! by the request's [`UploadSession`]; dropping the session (on success, on error, or when the
//! request future is dropped) removes them, newest first.

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::io::AsyncRead;
use tracing::{debug, error, info, warn};

use tubely_catalog::{CatalogError, VideoCatalog};
use tubely_media::{MediaTool, StagedFile, TempArtifact, TempStager};
use tubely_models::{AspectClassification, AssetKind, UserId, VideoId, VideoRecord};
use tubely_storage::{AssetKey, ObjectPublisher};

use crate::error::ApiError;
use crate::metrics;

/// States an upload moves through, strictly in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Authenticating,
    Authorizing,
    Staging,
    Probing,
    Transcoding,
    KeyDerivation,
    Publishing,
    RecordUpdate,
    Done,
}

impl UploadStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authenticating => "authenticating",
            Self::Authorizing => "authorizing",
            Self::Staging => "staging",
            Self::Probing => "probing",
            Self::Transcoding => "transcoding",
            Self::KeyDerivation => "key_derivation",
            Self::Publishing => "publishing",
            Self::RecordUpdate => "record_update",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An upload that ended in the failed state.
#[derive(Debug, Error)]
#[error("upload failed while {stage}: {error}")]
pub struct UploadFailure {
    /// Stage that was running when the upload failed
    pub stage: UploadStage,
    /// Error returned to the client
    pub error: ApiError,
}

impl UploadFailure {
    pub fn new(stage: UploadStage, error: impl Into<ApiError>) -> Self {
        Self {
            stage,
            error: error.into(),
        }
    }
}

impl From<UploadFailure> for ApiError {
    fn from(failure: UploadFailure) -> Self {
        failure.error
    }
}

/// Size caps applied while staging.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_video_bytes: u64,
    pub max_thumbnail_bytes: u64,
}

impl UploadLimits {
    pub fn for_kind(&self, kind: AssetKind) -> u64 {
        match kind {
            AssetKind::Thumbnail => self.max_thumbnail_bytes,
            AssetKind::Video => self.max_video_bytes,
        }
    }
}

/// An authorized upload ready to be staged.
pub struct UploadRequest<R> {
    /// Record the asset is attached to, already checked against the caller
    pub record: VideoRecord,
    pub kind: AssetKind,
    /// Normalized media type of the form part
    pub media_type: String,
    /// The file bytes
    pub body: R,
}

/// Per-request state. Owns every temp file the upload creates.
struct UploadSession {
    kind: AssetKind,
    video_id: VideoId,
    media_type: String,
    classification: Option<AspectClassification>,
    key: Option<AssetKey>,
    transcoded: Option<TempArtifact>,
    staged: Option<StagedFile>,
}

impl UploadSession {
    fn new(kind: AssetKind, video_id: VideoId, media_type: String) -> Self {
        Self {
            kind,
            video_id,
            media_type,
            classification: None,
            key: None,
            transcoded: None,
            staged: None,
        }
    }

    /// File to publish: the remuxed copy if there is one, else the staged upload.
    fn publish_source(&self) -> Option<&Path> {
        self.transcoded
            .as_ref()
            .map(TempArtifact::path)
            .or_else(|| self.staged.as_ref().map(StagedFile::path))
    }
}

impl Drop for UploadSession {
    fn drop(&mut self) {
        debug!(
            video_id = %self.video_id,
            kind = %self.kind,
            key = self.key.as_ref().map(AssetKey::as_str).unwrap_or_default(),
            "Releasing upload session"
        );

        // Reverse creation order
        if let Some(transcoded) = self.transcoded.take() {
            debug!(video_id = %self.video_id, path = %transcoded.path().display(), "Removing remuxed file");
        }
        if let Some(staged) = self.staged.take() {
            debug!(video_id = %self.video_id, path = %staged.path().display(), "Removing staged upload");
        }
    }
}

/// Runs uploads for thumbnails and videos.
#[derive(Clone)]
pub struct UploadService {
    stager: TempStager,
    limits: UploadLimits,
    media: Arc<dyn MediaTool>,
    publisher: Arc<dyn ObjectPublisher>,
    catalog: Arc<dyn VideoCatalog>,
}

impl UploadService {
    pub fn new(
        stager: TempStager,
        limits: UploadLimits,
        media: Arc<dyn MediaTool>,
        publisher: Arc<dyn ObjectPublisher>,
        catalog: Arc<dyn VideoCatalog>,
    ) -> Self {
        Self {
            stager,
            limits,
            media,
            publisher,
            catalog,
        }
    }

    pub fn stager(&self) -> &TempStager {
        &self.stager
    }

    pub fn limits(&self) -> UploadLimits {
        self.limits
    }

    /// Load the record and check `user` owns it. Creates no files.
    pub async fn authorize(
        &self,
        video_id: &VideoId,
        user: &UserId,
        kind: AssetKind,
    ) -> Result<VideoRecord, UploadFailure> {
        let result = match self.catalog.get_video(video_id).await {
            Ok(record) if record.is_owned_by(user) => Ok(record),
            Ok(_) => Err(ApiError::forbidden("Not authorized to update this video")),
            Err(CatalogError::NotFound(_)) => Err(ApiError::not_found("Couldn't find video")),
            Err(e) => Err(ApiError::from(e)),
        };

        result.map_err(|error| {
            let failure = UploadFailure::new(UploadStage::Authorizing, error);
            record_failure(kind, video_id, &failure);
            failure
        })
    }

    /// Run an authorized upload to completion and return the updated record.
    pub async fn upload<R>(&self, request: UploadRequest<R>) -> Result<VideoRecord, UploadFailure>
    where
        R: AsyncRead + Unpin + Send,
    {
        let kind = request.kind;
        let video_id = request.record.id;

        metrics::add_uploads_in_flight(kind.as_str(), 1.0);
        let _in_flight = scopeguard::guard(kind, |kind| {
            metrics::add_uploads_in_flight(kind.as_str(), -1.0);
        });

        let started = Instant::now();
        let result = self.run(request).await;

        match &result {
            Ok(record) => {
                metrics::record_upload_outcome(kind.as_str(), "success", UploadStage::Done.as_str());
                info!(
                    video_id = %video_id,
                    kind = %kind,
                    duration_ms = started.elapsed().as_millis() as u64,
                    thumbnail_url = record.thumbnail_url.as_deref().unwrap_or_default(),
                    video_url = record.video_url.as_deref().unwrap_or_default(),
                    "Upload complete"
                );
            }
            Err(failure) => record_failure(kind, &video_id, failure),
        }

        result
    }

    async fn run<R>(&self, request: UploadRequest<R>) -> Result<VideoRecord, UploadFailure>
    where
        R: AsyncRead + Unpin + Send,
    {
        let UploadRequest {
            record,
            kind,
            media_type,
            body,
        } = request;
        let mut session = UploadSession::new(kind, record.id, media_type);

        // Staging
        if !kind.accepts(&session.media_type) {
            return Err(UploadFailure::new(
                UploadStage::Staging,
                ApiError::bad_request(format!(
                    "Invalid file type '{}' for {}, expected one of: {}",
                    session.media_type,
                    kind,
                    kind.accepted_media_types().join(", ")
                )),
            ));
        }
        let max_bytes = self.limits.for_kind(kind);
        let staged = timed(
            kind,
            UploadStage::Staging,
            self.stager.stage(body, max_bytes, kind.temp_suffix()),
        )
        .await?;
        let staged_size = staged.size();
        let staged_path = staged.path().to_path_buf();
        session.staged = Some(staged);

        if session.kind.needs_processing() {
            // Probing
            let report = timed(kind, UploadStage::Probing, self.media.probe(&staged_path)).await?;
            metrics::record_classification(report.classification.as_str());
            debug!(
                video_id = %session.video_id,
                width = report.width,
                height = report.height,
                classification = %report.classification,
                "Classified video"
            );
            session.classification = Some(report.classification);

            // Transcoding
            let remuxed =
                timed(kind, UploadStage::Transcoding, self.media.fast_start(&staged_path)).await?;
            session.transcoded = Some(remuxed);
        }

        // KeyDerivation
        let prefix = session.classification.map(|c| c.as_str());
        let key = AssetKey::generate(&session.media_type, prefix)
            .map_err(|e| UploadFailure::new(UploadStage::KeyDerivation, e))?;
        session.key = Some(key.clone());

        // Publishing
        let source = session.publish_source().map(Path::to_path_buf).ok_or_else(|| {
            UploadFailure::new(
                UploadStage::Publishing,
                ApiError::internal("No staged file to publish"),
            )
        })?;
        timed(
            kind,
            UploadStage::Publishing,
            self.publisher.publish(&source, &key, &session.media_type),
        )
        .await?;
        let published_bytes = published_size(&source, staged_size).await;
        metrics::record_published_bytes(kind.as_str(), published_bytes);
        let url = self.publisher.public_url(&key);
        info!(
            video_id = %session.video_id,
            key = %key,
            prefix = key.prefix().unwrap_or_default(),
            backend = self.publisher.backend_name(),
            staged_bytes = staged_size,
            bytes = published_bytes,
            "Published asset"
        );

        // RecordUpdate
        let updated = match kind {
            AssetKind::Thumbnail => record.with_thumbnail_url(url),
            AssetKind::Video => record.with_video_url(url),
        };
        let update = timed(
            kind,
            UploadStage::RecordUpdate,
            self.catalog.update_video(&updated),
        )
        .await;
        if let Err(failure) = update {
            metrics::record_orphaned_object(kind.as_str());
            warn!(
                video_id = %session.video_id,
                key = %key,
                "Published object is orphaned: video record was not updated"
            );
            return Err(UploadFailure::new(
                UploadStage::RecordUpdate,
                ApiError::internal(format!("Couldn't update video: {}", failure.error)),
            ));
        }

        Ok(updated)
    }
}

/// Await one stage, recording its duration and tagging any error with the stage.
async fn timed<T, E, F>(kind: AssetKind, stage: UploadStage, fut: F) -> Result<T, UploadFailure>
where
    F: Future<Output = Result<T, E>>,
    E: Into<ApiError>,
{
    let start = Instant::now();
    let result = fut.await;
    metrics::record_stage_duration(kind.as_str(), stage.as_str(), start.elapsed().as_secs_f64());
    result.map_err(|e| UploadFailure::new(stage, e))
}

/// Size of the file that was published, falling back to the staged size.
async fn published_size(source: &Path, staged_size: u64) -> u64 {
    tokio::fs::metadata(source)
        .await
        .map(|meta| meta.len())
        .unwrap_or(staged_size)
}

fn record_failure(kind: AssetKind, video_id: &VideoId, failure: &UploadFailure) {
    metrics::record_upload_outcome(kind.as_str(), "failure", failure.stage.as_str());

    let status = failure.error.status_code();
    if status.is_server_error() {
        error!(
            video_id = %video_id,
            kind = %kind,
            stage = %failure.stage,
            error = %failure.error,
            "Upload failed"
        );
    } else {
        warn!(
            video_id = %video_id,
            kind = %kind,
            stage = %failure.stage,
            status = status.as_u16(),
            error = %failure.error,
            "Upload rejected"
        );
    }
}
