//! Axum HTTP API server.
//!
//! This crate provides:
//! - Thumbnail and video upload endpoints
//! - The upload pipeline (stage, probe, remux, publish, record update)
//! - HS256 bearer-token verification
//! - Security headers, request logging and Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::UploadService;
pub use state::AppState;
