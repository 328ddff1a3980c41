use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::items::{AnalysisResult, ContentItem, NewContentItem, SourceChannel, SourcePlatform};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Backend(Box::new(err))
    }
}

/// Result of inserting a normalized item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Created(i64),
    /// An item with the same `external_id` already exists; nothing was written.
    Duplicate,
}

/// Persistence seam for channels and content items.
///
/// Implementations must enforce `external_id` uniqueness themselves so that
/// concurrent ingestion runs cannot double-insert.
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn get_channel(
        &self,
        platform: SourcePlatform,
        name: &str,
    ) -> Result<Option<SourceChannel>, StoreError>;

    async fn get_channel_by_id(&self, id: i64) -> Result<Option<SourceChannel>, StoreError>;

    /// Active channels of one platform, ordered by name.
    async fn list_active_channels(
        &self,
        platform: SourcePlatform,
    ) -> Result<Vec<SourceChannel>, StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no channel has the given id.
    async fn touch_channel_synced(&self, id: i64, at: DateTime<Utc>) -> Result<(), StoreError>;

    async fn upsert_channel(
        &self,
        platform: SourcePlatform,
        name: &str,
        active: bool,
    ) -> Result<SourceChannel, StoreError>;

    async fn item_exists(&self, external_id: &str) -> Result<bool, StoreError>;

    async fn insert_item(&self, item: &NewContentItem) -> Result<InsertOutcome, StoreError>;

    /// Up to `limit` items without an analysis block, oldest ingestion first.
    async fn list_unanalyzed(&self, limit: usize) -> Result<Vec<ContentItem>, StoreError>;

    /// Items for the given ids in the order requested. Unknown ids are skipped.
    async fn get_items(&self, ids: &[i64]) -> Result<Vec<ContentItem>, StoreError>;

    /// Writes (or overwrites) the analysis block of one item.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no item has the given id.
    async fn record_analysis(
        &self,
        id: i64,
        result: &AnalysisResult,
        analyzed_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
