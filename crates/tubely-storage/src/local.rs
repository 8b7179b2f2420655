//! Local filesystem publisher.
//!
//! Writes objects under `{root}/{key}`; the API serves that directory for development
//! deployments that have no object store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::info;

use crate::error::{StorageError, StorageResult};
use crate::keys::AssetKey;
use crate::publisher::{ObjectPublisher, UrlTemplate};

/// Publishes assets into a local directory.
#[derive(Debug, Clone)]
pub struct LocalPublisher {
    root: PathBuf,
    urls: UrlTemplate,
}

impl LocalPublisher {
    pub fn new(root: impl Into<PathBuf>, urls: UrlTemplate) -> Self {
        Self {
            root: root.into(),
            urls,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem location of a key.
    pub fn object_path(&self, key: &AssetKey) -> StorageResult<PathBuf> {
        let key = key.as_str();
        if key.contains("..") || key.starts_with('/') || key.contains('\\') {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ObjectPublisher for LocalPublisher {
    async fn publish(&self, path: &Path, key: &AssetKey, _content_type: &str) -> StorageResult<()> {
        let dest = self.object_path(key)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        let bytes = fs::copy(path, &dest)
            .await
            .map_err(|e| StorageError::upload_failed(format!("{}: {}", dest.display(), e)))?;

        info!(key = %key, bytes, "Published {} to {}", path.display(), dest.display());
        Ok(())
    }

    fn public_url(&self, key: &AssetKey) -> String {
        self.urls.url_for(key)
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }

    async fn check_connectivity(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::Unreachable(format!("{}: {}", self.root.display(), e)))
    }
}
