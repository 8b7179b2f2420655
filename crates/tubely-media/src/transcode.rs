//! Fast-start remuxing.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::staging::TempArtifact;

/// Sibling path the remuxed copy is written to (`<input>.processing`).
pub fn fast_start_output_path(input: &Path) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(".processing");
    PathBuf::from(name)
}

/// Build the remux command: copy every stream and move the moov atom to the front.
pub(crate) fn fast_start_command(input: &Path, output: &Path) -> FfmpegCommand {
    FfmpegCommand::new(input, output)
        .stream_copy()
        .movflags("faststart")
        .format("mp4")
}

/// Remux `input` into a sibling file with the fast-start layout.
///
/// The input is left untouched. The output is owned by the returned artifact; if FFmpeg fails,
/// whatever it wrote is removed before the error is returned.
pub async fn process_for_fast_start(input: &Path, runner: &FfmpegRunner) -> MediaResult<TempArtifact> {
    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    let artifact = TempArtifact::adopt(fast_start_output_path(input));
    let cmd = fast_start_command(input, artifact.path());

    runner.run(&cmd).await?;

    info!(
        input = %input.display(),
        output = %artifact.path().display(),
        "Remuxed video for fast start"
    );
    Ok(artifact)
}
