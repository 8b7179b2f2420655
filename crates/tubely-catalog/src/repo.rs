//! Catalog interface.

use async_trait::async_trait;

use tubely_models::{VideoId, VideoRecord};

use crate::error::CatalogResult;

/// Read and update video records.
///
/// Implementations synchronize internally; callers hold no locks across calls.
#[async_trait]
pub trait VideoCatalog: Send + Sync {
    /// Fetch a record, failing with [`CatalogError::NotFound`](crate::CatalogError::NotFound)
    /// for unknown ids.
    async fn get_video(&self, id: &VideoId) -> CatalogResult<VideoRecord>;

    /// Replace a stored record. Last writer wins.
    async fn update_video(&self, record: &VideoRecord) -> CatalogResult<()>;

    /// Verify the catalog can serve requests.
    async fn check_connectivity(&self) -> CatalogResult<()> {
        Ok(())
    }
}
