//! In-process [`ItemStore`] used by tests and database-less runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mvpfinder_core::{
    AnalysisBlock, AnalysisResult, ContentItem, InsertOutcome, ItemStore, NewContentItem,
    SourceChannel, SourcePlatform, StoreError,
};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct State {
    channels: Vec<SourceChannel>,
    /// Insertion order doubles as ingestion order.
    items: Vec<ContentItem>,
    next_channel_id: i64,
    next_item_id: i64,
}

/// Keeps channels and items in memory behind one async mutex.
///
/// Uniqueness of `external_id` and `(platform, name)` is enforced the same
/// way the Postgres store enforces it.
#[derive(Debug, Default)]
pub struct MemoryItemStore {
    state: Mutex<State>,
}

impl MemoryItemStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items.
    pub async fn item_count(&self) -> usize {
        self.state.lock().await.items.len()
    }

    /// Every stored item in ingestion order.
    pub async fn all_items(&self) -> Vec<ContentItem> {
        self.state.lock().await.items.clone()
    }
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn get_channel(
        &self,
        platform: SourcePlatform,
        name: &str,
    ) -> Result<Option<SourceChannel>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .channels
            .iter()
            .find(|c| c.platform == platform && c.name == name)
            .cloned())
    }

    async fn get_channel_by_id(&self, id: i64) -> Result<Option<SourceChannel>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.channels.iter().find(|c| c.id == id).cloned())
    }

    async fn list_active_channels(
        &self,
        platform: SourcePlatform,
    ) -> Result<Vec<SourceChannel>, StoreError> {
        let state = self.state.lock().await;
        let mut channels: Vec<SourceChannel> = state
            .channels
            .iter()
            .filter(|c| c.platform == platform && c.active)
            .cloned()
            .collect();
        channels.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(channels)
    }

    async fn touch_channel_synced(&self, id: i64, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let channel = state
            .channels
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::NotFound)?;
        channel.last_synced_at = Some(at);
        Ok(())
    }

    async fn upsert_channel(
        &self,
        platform: SourcePlatform,
        name: &str,
        active: bool,
    ) -> Result<SourceChannel, StoreError> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state
            .channels
            .iter_mut()
            .find(|c| c.platform == platform && c.name == name)
        {
            existing.active = active;
            return Ok(existing.clone());
        }

        state.next_channel_id += 1;
        let channel = SourceChannel {
            id: state.next_channel_id,
            platform,
            name: name.to_string(),
            active,
            last_synced_at: None,
        };
        state.channels.push(channel.clone());
        Ok(channel)
    }

    async fn item_exists(&self, external_id: &str) -> Result<bool, StoreError> {
        let state = self.state.lock().await;
        Ok(state.items.iter().any(|i| i.external_id == external_id))
    }

    async fn insert_item(&self, item: &NewContentItem) -> Result<InsertOutcome, StoreError> {
        let mut state = self.state.lock().await;
        if state
            .items
            .iter()
            .any(|existing| existing.external_id == item.external_id)
        {
            return Ok(InsertOutcome::Duplicate);
        }

        state.next_item_id += 1;
        let id = state.next_item_id;
        state.items.push(ContentItem {
            id,
            external_id: item.external_id.clone(),
            platform: item.platform,
            channel_id: item.channel_id,
            title: item.title.clone(),
            tagline: item.tagline.clone(),
            body: item.body.clone(),
            author: item.author.clone(),
            score: item.score,
            votes: item.votes,
            comments: item.comments,
            source_url: item.source_url.clone(),
            external_site_url: item.external_site_url.clone(),
            created_at_source: item.created_at_source,
            ingested_at: Utc::now(),
            analysis: None,
        });
        Ok(InsertOutcome::Created(id))
    }

    async fn list_unanalyzed(&self, limit: usize) -> Result<Vec<ContentItem>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .items
            .iter()
            .filter(|i| !i.analyzed())
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_items(&self, ids: &[i64]) -> Result<Vec<ContentItem>, StoreError> {
        let state = self.state.lock().await;
        let mut seen = Vec::with_capacity(ids.len());
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if seen.contains(id) {
                continue;
            }
            seen.push(*id);
            if let Some(item) = state.items.iter().find(|i| i.id == *id) {
                found.push(item.clone());
            }
        }
        Ok(found)
    }

    async fn record_analysis(
        &self,
        id: i64,
        result: &AnalysisResult,
        analyzed_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let item = state
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(StoreError::NotFound)?;
        item.analysis = Some(AnalysisBlock::from_result(result, analyzed_at));
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
