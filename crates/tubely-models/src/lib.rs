//! Shared data models for the Tubely upload service.
//!
//! This crate provides Serde-serializable types for:
//! - Video and user identifiers
//! - Video records owned by the catalog
//! - Aspect ratio classification of uploaded videos
//! - Asset kinds accepted by the upload endpoints

pub mod aspect;
pub mod asset;
pub mod video;

// Re-export common types
pub use aspect::{classify, AspectClassification, ASPECT_TOLERANCE};
pub use asset::{normalize_media_type, AssetKind};
pub use video::{IdParseError, UserId, VideoId, VideoRecord};
