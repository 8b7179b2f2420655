//! Object publisher abstraction.

use std::path::Path;

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::keys::AssetKey;

/// Pushes finished local files to the object store.
///
/// All backends (S3, local filesystem) implement this trait so the upload pipeline never
/// depends on a specific store.
#[async_trait]
pub trait ObjectPublisher: Send + Sync {
    /// Stream the file at `path` to the store under `key` with `content_type`.
    async fn publish(&self, path: &Path, key: &AssetKey, content_type: &str) -> StorageResult<()>;

    /// Public URL of an object (fixed template over host + key).
    fn public_url(&self, key: &AssetKey) -> String;

    /// Short backend name for logs and readiness output.
    fn backend_name(&self) -> &'static str;

    /// Check the store is reachable.
    async fn check_connectivity(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Derives public URLs from a base URL and a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    base_url: String,
}

impl UrlTemplate {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `https://{domain}/{key}` (e.g. a CloudFront distribution).
    pub fn for_cdn(domain: &str) -> Self {
        let domain = domain
            .trim_start_matches("https://")
            .trim_start_matches("http://");
        Self::new(format!("https://{}", domain))
    }

    /// Virtual-hosted S3 URL, used when no CDN is configured.
    pub fn for_s3(bucket: &str, region: &str) -> Self {
        Self::new(format!("https://{}.s3.{}.amazonaws.com", bucket, region))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, key: &AssetKey) -> String {
        format!("{}/{}", self.base_url, key.as_str())
    }
}
