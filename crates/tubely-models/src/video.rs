//! Video record models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Error returned when an identifier is not a valid UUID.
#[derive(Debug, Error)]
#[error("Invalid ID: {0}")]
pub struct IdParseError(String);

/// Unique identifier for a video record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(pub Uuid);

impl VideoId {
    /// Generate a new random video ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a video ID from a path segment.
    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| IdParseError(s.to_string()))
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for VideoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VideoId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Uuid> for VideoId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Unique identifier for an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID (e.g. a token subject).
    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| IdParseError(s.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Video record stored in the catalog.
///
/// The upload pipeline only reads `user_id` (ownership) and writes the two URL fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Unique video ID
    pub id: VideoId,

    /// User ID (owner)
    pub user_id: UserId,

    /// Video title
    #[serde(default)]
    pub title: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Public thumbnail URL, set after a successful thumbnail upload
    #[serde(default)]
    pub thumbnail_url: Option<String>,

    /// Public video URL, set after a successful video upload
    #[serde(default)]
    pub video_url: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl VideoRecord {
    /// Create a new record owned by `user_id`.
    pub fn new(user_id: UserId, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: VideoId::new(),
            user_id,
            title: title.into(),
            description: String::new(),
            thumbnail_url: None,
            video_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `user` may mutate this record.
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.user_id == *user
    }

    /// Return a copy with the thumbnail URL replaced.
    pub fn with_thumbnail_url(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self.updated_at = Utc::now();
        self
    }

    /// Return a copy with the video URL replaced.
    pub fn with_video_url(mut self, url: impl Into<String>) -> Self {
        self.video_url = Some(url.into());
        self.updated_at = Utc::now();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_id_parse() {
        let id = VideoId::parse("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
        assert!(VideoId::parse("not-a-uuid").is_err());
        assert!(VideoId::parse("").is_err());
    }

    #[test]
    fn test_ownership() {
        let owner = UserId::new();
        let other = UserId::new();
        let record = VideoRecord::new(owner, "boots");
        assert!(record.is_owned_by(&owner));
        assert!(!record.is_owned_by(&other));
    }

    #[test]
    fn test_url_setters_bump_updated_at() {
        let record = VideoRecord::new(UserId::new(), "boots");
        let created = record.updated_at;
        let record = record.with_video_url("https://cdn.example.com/landscape/a.mp4");
        assert_eq!(
            record.video_url.as_deref(),
            Some("https://cdn.example.com/landscape/a.mp4")
        );
        assert!(record.updated_at >= created);
        assert!(record.thumbnail_url.is_none());
    }

    #[test]
    fn test_record_json_shape() {
        let record = VideoRecord::new(UserId::new(), "boots").with_thumbnail_url("https://x/y.png");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["thumbnail_url"], "https://x/y.png");
        assert!(json["video_url"].is_null());
        assert_eq!(json["user_id"], record.user_id.to_string());
    }
}
