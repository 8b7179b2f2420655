//! Scoped temp-file staging for inbound uploads.
//!
//! Every file created here is owned by a guard ([`StagedFile`] or [`TempArtifact`]) that
//! removes it from disk when dropped. Callers never delete staged files themselves, so early
//! returns, errors and aborted requests all release the disk space.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::debug;

use crate::error::{StagingError, StagingResult};

/// Prefix of every staged file name.
pub const TEMP_FILE_PREFIX: &str = "tubely-upload-";

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Marker error the HTTP layer wraps in an `io::Error` when the request body limit trips.
///
/// Staging recognises it and reports [`StagingError::BodyLimitExceeded`] instead of a
/// generic read failure.
#[derive(Debug, Error)]
#[error("request body exceeded the configured limit")]
pub struct BodyLimitExceeded;

/// Marker error the HTTP layer wraps in an `io::Error` when the request body is not a
/// well-formed upload (truncated part, missing boundary).
#[derive(Debug, Error)]
#[error("{0}")]
pub struct MalformedBody(pub String);

/// Creates staged files inside one directory.
#[derive(Debug, Clone)]
pub struct TempStager {
    dir: PathBuf,
}

impl TempStager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stream `reader` into a fresh temp file, rewound and ready to read.
    ///
    /// Fails with [`StagingError::TooLarge`] as soon as more than `max_bytes` arrive.
    pub async fn stage<R>(&self, mut reader: R, max_bytes: u64, suffix: &str) -> StagingResult<StagedFile>
    where
        R: AsyncRead + Unpin,
    {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StagingError::CreateDir {
                path: self.dir.clone(),
                source,
            })?;

        let named = tempfile::Builder::new()
            .prefix(TEMP_FILE_PREFIX)
            .suffix(suffix)
            .tempfile_in(&self.dir)
            .map_err(StagingError::CreateFile)?;
        let (std_file, path) = named.into_parts();
        let mut staged = StagedFile {
            file: File::from_std(std_file),
            path,
            size: 0,
        };

        let mut buf = vec![0u8; COPY_BUFFER_SIZE];
        loop {
            let n = reader.read(&mut buf).await.map_err(classify_read_error)?;
            if n == 0 {
                break;
            }
            staged.size += n as u64;
            if staged.size > max_bytes {
                return Err(StagingError::TooLarge { limit: max_bytes });
            }
            staged
                .file
                .write_all(&buf[..n])
                .await
                .map_err(StagingError::Write)?;
        }

        staged.file.flush().await.map_err(StagingError::Write)?;
        staged
            .file
            .seek(SeekFrom::Start(0))
            .await
            .map_err(StagingError::Write)?;

        debug!(path = %staged.path().display(), size = staged.size, "Staged upload");
        Ok(staged)
    }
}

fn classify_read_error(e: std::io::Error) -> StagingError {
    let Some(inner) = e.get_ref() else {
        return StagingError::Read(e);
    };
    if inner.is::<BodyLimitExceeded>() {
        return StagingError::BodyLimitExceeded;
    }
    if let Some(MalformedBody(reason)) = inner.downcast_ref::<MalformedBody>() {
        return StagingError::MalformedBody(reason.clone());
    }
    StagingError::Read(e)
}

/// An upload written to disk. Deleted when dropped.
#[derive(Debug)]
pub struct StagedFile {
    // Declared before `path` so the handle closes before the file is unlinked.
    file: File,
    path: TempPath,
    size: u64,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of bytes written.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Open handle positioned at the start of the file.
    pub fn file_mut(&mut self) -> &mut File {
        &mut self.file
    }
}

/// A file produced from a staged upload (e.g. a remuxed copy). Deleted when dropped.
#[derive(Debug)]
pub struct TempArtifact {
    path: TempPath,
}

impl TempArtifact {
    /// Take ownership of `path`; it is removed when the artifact is dropped,
    /// whether or not anything was ever written there.
    pub fn adopt(path: impl Into<PathBuf>) -> Self {
        Self {
            path: TempPath::from_path(path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
