//! Business logic services.

pub mod upload;

pub use upload::{UploadFailure, UploadLimits, UploadRequest, UploadService, UploadStage};
