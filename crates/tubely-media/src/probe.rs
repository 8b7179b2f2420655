//! FFprobe stream inspection.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use tubely_models::AspectClassification;

use crate::error::{MediaError, MediaResult};

/// Result of probing a video file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeReport {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Video codec
    pub codec: Option<String>,
    /// Orientation derived from width/height
    pub classification: AspectClassification,
}

impl ProbeReport {
    /// Build a report from raw dimensions.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            codec: None,
            classification: AspectClassification::from_dimensions(width, height),
        }
    }
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Probe a video file for its first video stream's dimensions.
pub async fn probe_video(path: impl AsRef<Path>) -> MediaResult<ProbeReport> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_streams"])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ffprobe_failed(
            format!("FFprobe exited with {}", output.status),
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
        ));
    }

    let report = parse_probe_output(&output.stdout)?;
    debug!(
        path = %path.display(),
        width = report.width,
        height = report.height,
        classification = %report.classification,
        "Probed video"
    );
    Ok(report)
}

/// Parse `ffprobe -print_format json -show_streams` output.
pub(crate) fn parse_probe_output(stdout: &[u8]) -> MediaResult<ProbeReport> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;

    if probe.streams.is_empty() {
        return Err(MediaError::NoStreams);
    }

    let video_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| MediaError::InvalidVideo("No video stream found".to_string()))?;

    let width = video_stream.width.unwrap_or(0);
    let height = video_stream.height.unwrap_or(0);

    Ok(ProbeReport {
        codec: video_stream.codec_name.clone(),
        ..ProbeReport::from_dimensions(width, height)
    })
}
