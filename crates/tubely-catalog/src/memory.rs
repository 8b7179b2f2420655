//! In-process catalog.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use metrics::counter;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use tubely_models::{VideoId, VideoRecord};

use crate::error::{CatalogError, CatalogResult};
use crate::repo::VideoCatalog;

/// Catalog holding every record in memory.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    videos: RwLock<HashMap<VideoId, VideoRecord>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a JSON array of video records.
    pub async fn load_seed(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read(path)
            .await
            .map_err(|e| CatalogError::Seed(format!("{}: {}", path.display(), e)))?;
        let records: Vec<VideoRecord> = serde_json::from_slice(&raw)?;

        let catalog = Self::new();
        let entries = records.len();
        for record in records {
            catalog.insert(record).await;
        }

        // Repeated ids collapse to the last entry
        let count = catalog.len().await;
        if count < entries {
            warn!(path = %path.display(), entries, count, "Catalog seed repeats video ids");
        }
        info!(path = %path.display(), count, "Loaded catalog seed");
        Ok(catalog)
    }

    /// Add or replace a record.
    pub async fn insert(&self, record: VideoRecord) {
        self.videos.write().await.insert(record.id, record);
    }

    /// Number of distinct records.
    pub async fn len(&self) -> usize {
        self.videos.read().await.len()
    }
}

#[async_trait]
impl VideoCatalog for MemoryCatalog {
    async fn get_video(&self, id: &VideoId) -> CatalogResult<VideoRecord> {
        counter!("catalog_reads_total").increment(1);
        self.videos
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(CatalogError::NotFound(*id))
    }

    async fn update_video(&self, record: &VideoRecord) -> CatalogResult<()> {
        counter!("catalog_writes_total").increment(1);
        let mut videos = self.videos.write().await;
        match videos.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                debug!(video_id = %record.id, "Updated video record");
                Ok(())
            }
            None => Err(CatalogError::NotFound(record.id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;
    use tubely_models::UserId;

    #[tokio::test]
    async fn test_get_and_update() {
        let catalog = MemoryCatalog::new();
        let record = VideoRecord::new(UserId::new(), "boots");
        let id = record.id;
        catalog.insert(record).await;

        let fetched = catalog.get_video(&id).await.unwrap();
        assert!(fetched.video_url.is_none());

        let updated = fetched.with_video_url("https://cdn.example.com/landscape/a.mp4");
        assert_ok!(catalog.update_video(&updated).await);

        let fetched = catalog.get_video(&id).await.unwrap();
        assert_eq!(
            fetched.video_url.as_deref(),
            Some("https://cdn.example.com/landscape/a.mp4")
        );
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let catalog = MemoryCatalog::new();
        let id = VideoId::new();
        let err = catalog.get_video(&id).await.unwrap_err();
        assert!(err.is_not_found());

        let orphan = VideoRecord::new(UserId::new(), "nobody");
        assert!(catalog.update_video(&orphan).await.unwrap_err().is_not_found());
        assert_eq!(catalog.len().await, 0);
    }

    #[tokio::test]
    async fn test_last_writer_wins() {
        let catalog = MemoryCatalog::new();
        let record = VideoRecord::new(UserId::new(), "race");
        let id = record.id;
        catalog.insert(record.clone()).await;

        let first = record.clone().with_thumbnail_url("https://x/first.png");
        let second = record.with_thumbnail_url("https://x/second.png");
        assert_ok!(catalog.update_video(&first).await);
        assert_ok!(catalog.update_video(&second).await);

        let fetched = catalog.get_video(&id).await.unwrap();
        assert_eq!(fetched.thumbnail_url.as_deref(), Some("https://x/second.png"));
    }

    #[tokio::test]
    async fn test_load_seed() {
        let dir = tempfile::TempDir::new().unwrap();
        let a = VideoRecord::new(UserId::new(), "a");
        let b = VideoRecord::new(UserId::new(), "b");
        let path = dir.path().join("videos.json");
        std::fs::write(&path, serde_json::to_vec(&vec![a.clone(), b]).unwrap()).unwrap();

        let catalog = MemoryCatalog::load_seed(&path).await.unwrap();
        assert_eq!(catalog.len().await, 2);
        assert_eq!(catalog.get_video(&a.id).await.unwrap(), a);
    }

    #[tokio::test]
    async fn test_load_seed_repeated_id_keeps_last() {
        let dir = tempfile::TempDir::new().unwrap();
        let first = VideoRecord::new(UserId::new(), "first");
        let mut second = first.clone();
        second.title = "second".to_string();
        let path = dir.path().join("videos.json");
        std::fs::write(&path, serde_json::to_vec(&vec![first.clone(), second]).unwrap()).unwrap();

        let catalog = MemoryCatalog::load_seed(&path).await.unwrap();
        assert_eq!(catalog.len().await, 1);
        assert_eq!(catalog.get_video(&first.id).await.unwrap().title, "second");
    }

    #[tokio::test]
    async fn test_load_seed_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = MemoryCatalog::load_seed(dir.path().join("missing.json")).await;
        assert!(matches!(missing, Err(CatalogError::Seed(_))));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, b"{not json").unwrap();
        assert!(matches!(
            MemoryCatalog::load_seed(&bad).await,
            Err(CatalogError::Json(_))
        ));
    }
}
