//! Application state.

use std::sync::Arc;

use tracing::info;
use tubely_catalog::{MemoryCatalog, VideoCatalog};
use tubely_media::{FfmpegTool, MediaTool, TempStager};
use tubely_storage::{create_publisher, ObjectPublisher};

use crate::auth::{JwtVerifier, TokenVerifier};
use crate::config::ApiConfig;
use crate::services::{UploadLimits, UploadService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub catalog: Arc<dyn VideoCatalog>,
    pub publisher: Arc<dyn ObjectPublisher>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub uploads: UploadService,
}

impl AppState {
    /// Create application state from configuration.
    ///
    /// Fails if FFmpeg/FFprobe are missing, the seed file is unreadable or the storage client
    /// cannot be configured.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let mut tool = FfmpegTool::new();
        if let Some(secs) = config.ffmpeg_timeout_secs {
            tool = tool.with_timeout(secs);
        }
        tool.check_available()?;

        let catalog: Arc<dyn VideoCatalog> = match &config.catalog_seed_path {
            Some(path) => Arc::new(MemoryCatalog::load_seed(path).await?),
            None => {
                info!("No catalog seed configured, starting with an empty catalog");
                Arc::new(MemoryCatalog::new())
            }
        };

        let publisher = create_publisher(config.storage.clone(), config.url_template()).await?;
        let verifier: Arc<dyn TokenVerifier> = Arc::new(JwtVerifier::new(&config.jwt_secret));

        Ok(Self::from_parts(config, Arc::new(tool), publisher, catalog, verifier))
    }

    /// Assemble state from already-built collaborators.
    pub fn from_parts(
        config: ApiConfig,
        media: Arc<dyn MediaTool>,
        publisher: Arc<dyn ObjectPublisher>,
        catalog: Arc<dyn VideoCatalog>,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Self {
        let uploads = UploadService::new(
            TempStager::new(&config.temp_dir),
            UploadLimits {
                max_video_bytes: config.max_video_bytes,
                max_thumbnail_bytes: config.max_thumbnail_bytes,
            },
            media,
            Arc::clone(&publisher),
            Arc::clone(&catalog),
        );

        Self {
            config,
            catalog,
            publisher,
            verifier,
            uploads,
        }
    }
}
