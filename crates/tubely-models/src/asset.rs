//! Kinds of assets accepted by the upload endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An uploadable asset attached to a video record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Thumbnail,
    Video,
}

impl AssetKind {
    /// Multipart form field carrying the file.
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Thumbnail => "thumbnail",
            Self::Video => "video",
        }
    }

    /// Media types accepted for this kind (already normalized).
    pub fn accepted_media_types(&self) -> &'static [&'static str] {
        match self {
            Self::Thumbnail => &["image/jpeg", "image/png"],
            Self::Video => &["video/mp4"],
        }
    }

    /// Whether a normalized media type is accepted.
    pub fn accepts(&self, media_type: &str) -> bool {
        self.accepted_media_types().contains(&media_type)
    }

    /// Whether the upload goes through probing and fast-start transcoding.
    pub fn needs_processing(&self) -> bool {
        matches!(self, Self::Video)
    }

    /// Suffix for staged temp files.
    pub fn temp_suffix(&self) -> &'static str {
        match self {
            Self::Thumbnail => ".img",
            Self::Video => ".mp4",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Thumbnail => "thumbnail",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a MIME type by stripping parameters and lowercasing
/// (e.g. "Video/MP4; codecs=avc1" -> "video/mp4").
pub fn normalize_media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase()
}
