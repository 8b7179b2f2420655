//! Storage backend selection.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::client::{S3Config, S3Publisher};
use crate::error::StorageResult;
use crate::local::LocalPublisher;
use crate::publisher::{ObjectPublisher, UrlTemplate};

/// Backend chosen for a deployment.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    S3(S3Config),
    Local { root: PathBuf },
}

impl StorageBackend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3(_) => "s3",
            Self::Local { .. } => "local",
        }
    }
}

/// Build the publisher for `backend`, deriving public URLs with `urls`.
pub async fn create_publisher(
    backend: StorageBackend,
    urls: UrlTemplate,
) -> StorageResult<Arc<dyn ObjectPublisher>> {
    info!(backend = backend.name(), base_url = urls.base_url(), "Creating object publisher");

    match backend {
        StorageBackend::S3(config) => Ok(Arc::new(S3Publisher::new(config, urls).await?)),
        StorageBackend::Local { root } => Ok(Arc::new(LocalPublisher::new(root, urls))),
    }
}
