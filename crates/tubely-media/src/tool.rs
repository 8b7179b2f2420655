//! The media capability the upload pipeline depends on.

use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use crate::command::{check_ffmpeg, check_ffprobe, FfmpegRunner};
use crate::error::MediaResult;
use crate::probe::{probe_video, ProbeReport};
use crate::staging::TempArtifact;
use crate::transcode::process_for_fast_start;

/// Inspect and remux media files.
///
/// The orchestrator only sees this trait, never the invocation mechanism, so a native codec
/// binding can replace the CLI tools without touching the pipeline.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Report the first video stream's dimensions and orientation.
    async fn probe(&self, path: &Path) -> MediaResult<ProbeReport>;

    /// Produce a fast-start copy of `input` next to it.
    async fn fast_start(&self, input: &Path) -> MediaResult<TempArtifact>;
}

/// [`MediaTool`] backed by the `ffprobe` and `ffmpeg` binaries.
#[derive(Debug, Clone, Default)]
pub struct FfmpegTool {
    runner: FfmpegRunner,
}

impl FfmpegTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill FFmpeg if a remux takes longer than `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.runner = self.runner.with_timeout(secs);
        self
    }

    /// Fail fast at startup when either binary is missing.
    pub fn check_available(&self) -> MediaResult<()> {
        let ffprobe = check_ffprobe()?;
        let ffmpeg = check_ffmpeg()?;
        info!(
            ffprobe = %ffprobe.display(),
            ffmpeg = %ffmpeg.display(),
            "Media tools available"
        );
        Ok(())
    }
}

#[async_trait]
impl MediaTool for FfmpegTool {
    async fn probe(&self, path: &Path) -> MediaResult<ProbeReport> {
        probe_video(path).await
    }

    async fn fast_start(&self, input: &Path) -> MediaResult<TempArtifact> {
        process_for_fast_start(input, &self.runner).await
    }
}
