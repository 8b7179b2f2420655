//! API configuration.

use std::path::PathBuf;

use thiserror::Error;
use tubely_storage::{S3Config, StorageBackend, UrlTemplate};

/// Default cap on video uploads (1 GiB).
pub const DEFAULT_MAX_VIDEO_BYTES: u64 = 1 << 30;

/// Default cap on thumbnail uploads (10 MiB).
pub const DEFAULT_MAX_THUMBNAIL_BYTES: u64 = 10 << 20;

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Environment (development/production)
    pub environment: String,
    /// HS256 secret for access tokens
    pub jwt_secret: String,
    /// Root of locally stored assets (local backend)
    pub assets_root: PathBuf,
    /// Directory uploads are staged in
    pub temp_dir: PathBuf,
    /// Max video upload size in bytes
    pub max_video_bytes: u64,
    /// Max thumbnail upload size in bytes
    pub max_thumbnail_bytes: u64,
    /// Object store backend
    pub storage: StorageBackend,
    /// Explicit public URL prefix for published assets
    pub public_base_url: Option<String>,
    /// CDN domain in front of the bucket
    pub cdn_domain: Option<String>,
    /// Kill FFmpeg after this many seconds
    pub ffmpeg_timeout_secs: Option<u64>,
    /// JSON file of video records to load at startup
    pub catalog_seed_path: Option<PathBuf>,
    /// Expose Prometheus metrics at /metrics
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8091,
            cors_origins: vec!["*".to_string()],
            environment: "development".to_string(),
            jwt_secret: String::new(),
            assets_root: PathBuf::from("./assets"),
            temp_dir: default_temp_dir(),
            max_video_bytes: DEFAULT_MAX_VIDEO_BYTES,
            max_thumbnail_bytes: DEFAULT_MAX_THUMBNAIL_BYTES,
            storage: StorageBackend::Local {
                root: PathBuf::from("./assets"),
            },
            public_base_url: None,
            cdn_domain: None,
            ffmpeg_timeout_secs: None,
            catalog_seed_path: None,
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let assets_root = PathBuf::from(get("ASSETS_ROOT").unwrap_or_else(|| "./assets".to_string()));
        let temp_dir = get("TEMP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_temp_dir);

        let s3_bucket = get("S3_BUCKET");
        let backend = get("STORAGE_BACKEND")
            .map(|v| v.to_lowercase())
            .unwrap_or_else(|| if s3_bucket.is_some() { "s3" } else { "local" }.to_string());

        let storage = match backend.as_str() {
            "s3" => StorageBackend::S3(S3Config {
                bucket: s3_bucket.ok_or(ConfigError::Missing("S3_BUCKET"))?,
                region: get("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                endpoint_url: get("S3_ENDPOINT_URL"),
                access_key_id: get("S3_ACCESS_KEY_ID"),
                secret_access_key: get("S3_SECRET_ACCESS_KEY"),
            }),
            "local" => StorageBackend::Local {
                root: assets_root.clone(),
            },
            _ => {
                return Err(ConfigError::Invalid {
                    var: "STORAGE_BACKEND",
                    value: backend,
                })
            }
        };

        Ok(Self {
            host: get("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_var(&get, "API_PORT")?.unwrap_or(8091),
            cors_origins: get("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|| vec!["*".to_string()]),
            environment: get("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            jwt_secret,
            assets_root,
            temp_dir,
            max_video_bytes: parse_var(&get, "MAX_VIDEO_BYTES")?.unwrap_or(DEFAULT_MAX_VIDEO_BYTES),
            max_thumbnail_bytes: parse_var(&get, "MAX_THUMBNAIL_BYTES")?
                .unwrap_or(DEFAULT_MAX_THUMBNAIL_BYTES),
            storage,
            public_base_url: get("ASSET_PUBLIC_BASE_URL"),
            cdn_domain: get("CDN_DOMAIN"),
            ffmpeg_timeout_secs: parse_var(&get, "FFMPEG_TIMEOUT_SECS")?,
            catalog_seed_path: get("CATALOG_SEED_PATH").map(PathBuf::from),
            metrics_enabled: get("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        })
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }

    /// Public URL template for published assets.
    ///
    /// Precedence: explicit base URL, then CDN domain (S3), then the bucket's own endpoint.
    /// The local backend is served by this server under `/assets`.
    pub fn url_template(&self) -> UrlTemplate {
        if let Some(base) = &self.public_base_url {
            return UrlTemplate::new(base.as_str());
        }

        match &self.storage {
            StorageBackend::S3(s3) => match &self.cdn_domain {
                Some(domain) => UrlTemplate::for_cdn(domain),
                None => UrlTemplate::for_s3(&s3.bucket, &s3.region),
            },
            StorageBackend::Local { .. } => {
                let host = if self.host == "0.0.0.0" {
                    "localhost"
                } else {
                    self.host.as_str()
                };
                UrlTemplate::new(format!("http://{}:{}/assets", host, self.port))
            }
        }
    }

    /// Directory served at `/assets`, if the local backend is active.
    pub fn local_assets_dir(&self) -> Option<&PathBuf> {
        match &self.storage {
            StorageBackend::Local { root } => Some(root),
            StorageBackend::S3(_) => None,
        }
    }
}

/// Staging lives outside `ASSETS_ROOT` so in-flight uploads are never served.
fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("tubely-uploads")
}

fn parse_var<G, T>(get: &G, var: &'static str) -> Result<Option<T>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match get(var) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(None),
    }
}
