//! Shared fixtures for API integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use tempfile::TempDir;
use tower::ServiceExt;

use tubely_api::auth::{AccessClaims, JwtVerifier, TOKEN_ISSUER};
use tubely_api::{create_router, ApiConfig, AppState};
use tubely_catalog::{MemoryCatalog, VideoCatalog};
use tubely_media::{fast_start_output_path, MediaError, MediaResult, MediaTool, ProbeReport, TempArtifact};
use tubely_models::{UserId, VideoRecord};
use tubely_storage::{LocalPublisher, StorageBackend};

pub const SECRET: &str = "integration-test-secret";
pub const BOUNDARY: &str = "tubely-test-boundary";
pub const PUBLIC_BASE: &str = "http://127.0.0.1:8091/assets/";

/// Media tool that reports fixed dimensions and "remuxes" by copying.
pub struct FakeMedia {
    dimensions: Option<(u32, u32)>,
}

impl FakeMedia {
    pub fn reporting(width: u32, height: u32) -> Self {
        Self {
            dimensions: Some((width, height)),
        }
    }

    /// Prober finds no streams at all.
    pub fn no_streams() -> Self {
        Self { dimensions: None }
    }
}

#[async_trait]
impl MediaTool for FakeMedia {
    async fn probe(&self, path: &Path) -> MediaResult<ProbeReport> {
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }
        match self.dimensions {
            Some((width, height)) => Ok(ProbeReport::from_dimensions(width, height)),
            None => Err(MediaError::NoStreams),
        }
    }

    async fn fast_start(&self, input: &Path) -> MediaResult<TempArtifact> {
        let artifact = TempArtifact::adopt(fast_start_output_path(input));
        tokio::fs::copy(input, artifact.path()).await?;
        Ok(artifact)
    }
}

pub struct TestApp {
    pub dir: TempDir,
    pub router: Router,
    pub catalog: Arc<MemoryCatalog>,
    pub video: VideoRecord,
}

impl TestApp {
    pub async fn new(media: FakeMedia) -> Self {
        let dir = TempDir::new().unwrap();
        let assets = dir.path().join("assets");

        let config = ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 8091,
            jwt_secret: SECRET.to_string(),
            assets_root: assets.clone(),
            temp_dir: dir.path().join("tmp"),
            max_video_bytes: 64 * 1024,
            max_thumbnail_bytes: 1024,
            storage: StorageBackend::Local {
                root: assets.clone(),
            },
            ..ApiConfig::default()
        };

        let catalog = Arc::new(MemoryCatalog::new());
        let video = VideoRecord::new(UserId::new(), "boots");
        catalog.insert(video.clone()).await;

        let publisher = Arc::new(LocalPublisher::new(&assets, config.url_template()));
        let catalog_dyn: Arc<dyn VideoCatalog> = catalog.clone();
        let state = AppState::from_parts(
            config,
            Arc::new(media),
            publisher,
            catalog_dyn,
            Arc::new(JwtVerifier::new(SECRET)),
        );

        Self {
            dir,
            router: create_router(state, None),
            catalog,
            video,
        }
    }

    pub fn owner(&self) -> UserId {
        self.video.user_id
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.dir.path().join("assets")
    }

    /// Files left in the staging directory.
    pub fn temp_entries(&self) -> usize {
        std::fs::read_dir(self.dir.path().join("tmp"))
            .map(|d| d.count())
            .unwrap_or(0)
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    pub async fn get_raw(&self, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = self
            .router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }
}

/// Signed access token for `user`.
pub fn token_for(user: &UserId) -> String {
    let now = Utc::now().timestamp();
    let claims = AccessClaims {
        sub: user.to_string(),
        iss: TOKEN_ISSUER.to_string(),
        iat: now,
        exp: now + 3600,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

/// One file part in a multipart/form-data body.
pub fn multipart_body(field: &str, content_type: Option<&str>, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"upload.bin\"\r\n",
            field
        )
        .as_bytes(),
    );
    if let Some(ct) = content_type {
        body.extend_from_slice(format!("Content-Type: {}\r\n", ct).as_bytes());
    }
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// POST a multipart upload, optionally authenticated.
pub fn upload_request(uri: &str, token: Option<&str>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body)).unwrap()
}
