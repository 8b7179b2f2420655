//! Asset key generation.
//!
//! Key format: `{prefix}/{random}.{ext}` when a prefix applies, otherwise `{random}.{ext}`.
//! The random segment is 32 bytes from a CSPRNG, URL-safe base64 without padding, so two
//! uploads never share a key. Keys never contain `..` or a leading `/`.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::{StorageError, StorageResult};

const RANDOM_SEGMENT_BYTES: usize = 32;

/// Map a content type to the file extension used in its key.
pub fn extension_for(content_type: &str) -> StorageResult<&'static str> {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase();

    match media_type.as_str() {
        "image/jpeg" | "image/jpg" => Ok("jpg"),
        "image/png" => Ok("png"),
        "video/mp4" => Ok("mp4"),
        _ => Err(StorageError::UnsupportedMediaType(content_type.to_string())),
    }
}

/// Destination key of a published object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetKey(String);

impl AssetKey {
    /// Generate a fresh key for `content_type`, optionally under `prefix`.
    pub fn generate(content_type: &str, prefix: Option<&str>) -> StorageResult<Self> {
        let ext = extension_for(content_type)?;
        let bytes: [u8; RANDOM_SEGMENT_BYTES] = rand::random();
        let name = format!("{}.{}", URL_SAFE_NO_PAD.encode(bytes), ext);

        match prefix {
            Some(prefix) => {
                validate_prefix(prefix)?;
                Ok(Self(format!("{}/{}", prefix, name)))
            }
            None => Ok(Self(name)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading path segment, if any (e.g. "landscape").
    pub fn prefix(&self) -> Option<&str> {
        self.0.rsplit_once('/').map(|(prefix, _)| prefix)
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate_prefix(prefix: &str) -> StorageResult<()> {
    let valid = !prefix.is_empty()
        && !prefix.starts_with('/')
        && !prefix.ends_with('/')
        && !prefix.contains("..")
        && !prefix.contains('\\');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(format!("invalid prefix '{}'", prefix)))
    }
}
