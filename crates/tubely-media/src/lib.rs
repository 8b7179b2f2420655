#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper and upload staging.
//!
//! This crate provides:
//! - Stream dimension probing via `ffprobe` and aspect classification
//! - Fast-start (moov-first) remuxing via `ffmpeg`
//! - The [`MediaTool`] capability the upload pipeline depends on
//! - Scoped temp-file staging for inbound uploads

pub mod command;
pub mod error;
pub mod probe;
pub mod staging;
pub mod tool;
pub mod transcode;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult, StagingError, StagingResult};
pub use probe::{probe_video, ProbeReport};
pub use staging::{BodyLimitExceeded, MalformedBody, StagedFile, TempArtifact, TempStager};
pub use tool::{FfmpegTool, MediaTool};
pub use transcode::{fast_start_output_path, process_for_fast_start};
