//! Ingestion orchestrator: pages through a channel, dedups and stores items.

use chrono::Utc;
use mvpfinder_core::{InsertOutcome, ItemStore, SourceChannel, StoreError};
use mvpfinder_sources::{RawItem, SourceClient};
use serde::{Deserialize, Serialize};

/// Outcome of syncing one channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSyncResult {
    pub channel: String,
    pub new: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

impl ChannelSyncResult {
    fn empty(channel: &str) -> Self {
        Self {
            channel: channel.to_string(),
            ..Self::default()
        }
    }

    fn failed(channel: &str, error: String) -> Self {
        Self {
            channel: channel.to_string(),
            errors: vec![error],
            ..Self::default()
        }
    }
}

/// Totals across every channel of one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub channels_processed: usize,
    pub total_new: usize,
    pub total_skipped: usize,
    pub total_errors: usize,
    pub details: Vec<ChannelSyncResult>,
}

#[must_use]
pub fn summarize(results: Vec<ChannelSyncResult>) -> SyncSummary {
    SyncSummary {
        channels_processed: results.len(),
        total_new: results.iter().map(|r| r.new).sum(),
        total_skipped: results.iter().map(|r| r.skipped).sum(),
        total_errors: results.iter().map(|r| r.errors.len()).sum(),
        details: results,
    }
}

/// Pulls items from one source client into the store.
///
/// Runs are sequential: one page at a time, one item at a time. Failures are
/// collected into the result rather than returned.
pub struct Ingestor<'a> {
    client: &'a dyn SourceClient,
    store: &'a dyn ItemStore,
}

impl<'a> Ingestor<'a> {
    #[must_use]
    pub fn new(client: &'a dyn SourceClient, store: &'a dyn ItemStore) -> Self {
        Self { client, store }
    }

    /// Syncs the channel called `name` on the client's platform, considering
    /// at most `limit` items.
    pub async fn sync_channel(&self, name: &str, limit: usize) -> ChannelSyncResult {
        match self.store.get_channel(self.client.platform(), name).await {
            Ok(Some(channel)) if channel.active => self.sync_loaded(&channel, limit).await,
            Ok(_) => {
                tracing::warn!(channel = name, "channel not found or inactive");
                ChannelSyncResult::failed(name, format!("channel {name} not found or inactive"))
            }
            Err(e) => {
                tracing::error!(channel = name, error = %e, "failed to load channel");
                ChannelSyncResult::failed(name, format!("failed to load channel {name}: {e}"))
            }
        }
    }

    /// Syncs every active channel of the client's platform, in name order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the channel list cannot be read. Failures
    /// inside a channel are reported in its result.
    pub async fn sync_all_active(
        &self,
        limit: usize,
    ) -> Result<Vec<ChannelSyncResult>, StoreError> {
        let channels = self.store.list_active_channels(self.client.platform()).await?;
        tracing::info!(
            platform = %self.client.platform(),
            channels = channels.len(),
            "syncing active channels"
        );

        let mut results = Vec::with_capacity(channels.len());
        for channel in &channels {
            results.push(self.sync_loaded(channel, limit).await);
        }
        Ok(results)
    }

    /// Syncs the given channel ids in order. Ids that are unknown, inactive
    /// or belong to another platform yield a result carrying one error.
    pub async fn sync_channel_ids(&self, ids: &[i64], limit: usize) -> Vec<ChannelSyncResult> {
        let mut results = Vec::with_capacity(ids.len());
        for &id in ids {
            let result = match self.store.get_channel_by_id(id).await {
                Ok(Some(channel))
                    if channel.active && channel.platform == self.client.platform() =>
                {
                    self.sync_loaded(&channel, limit).await
                }
                Ok(_) => {
                    tracing::warn!(channel_id = id, "channel not found or inactive");
                    ChannelSyncResult::failed(
                        &id.to_string(),
                        "channel not found or inactive".to_string(),
                    )
                }
                Err(e) => {
                    tracing::error!(channel_id = id, error = %e, "failed to load channel");
                    ChannelSyncResult::failed(
                        &id.to_string(),
                        format!("failed to load channel {id}: {e}"),
                    )
                }
            };
            results.push(result);
        }
        results
    }

    async fn sync_loaded(&self, channel: &SourceChannel, limit: usize) -> ChannelSyncResult {
        let mut result = ChannelSyncResult::empty(&channel.name);
        let mut considered = 0_usize;
        let mut cursor: Option<String> = None;

        while considered < limit {
            let remaining = limit - considered;
            let page_size = remaining.min(self.client.max_page_size());

            let page = match self
                .client
                .fetch_items(&channel.name, page_size, cursor.as_deref())
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(channel = %channel.name, error = %e, "page fetch failed");
                    result.errors.push(format!("fetch failed: {e}"));
                    break;
                }
            };

            if page.items.is_empty() {
                break;
            }
            for raw in page.items.iter().take(remaining) {
                considered += 1;
                self.ingest_one(raw, channel, &mut result).await;
            }

            match page.next_cursor {
                Some(next) if page.has_next_page => cursor = Some(next),
                _ => break,
            }
        }

        if let Err(e) = self.store.touch_channel_synced(channel.id, Utc::now()).await {
            tracing::warn!(channel = %channel.name, error = %e, "failed to record sync time");
            result.errors.push(format!("failed to record sync time: {e}"));
        }

        tracing::info!(
            channel = %channel.name,
            new = result.new,
            skipped = result.skipped,
            errors = result.errors.len(),
            "channel sync finished"
        );
        result
    }

    async fn ingest_one(
        &self,
        raw: &RawItem,
        channel: &SourceChannel,
        result: &mut ChannelSyncResult,
    ) {
        let external_id = raw.external_id();

        match self.store.item_exists(external_id).await {
            Ok(true) => {
                tracing::debug!(external_id, "item already stored, skipping");
                result.skipped += 1;
                return;
            }
            Ok(false) => {}
            Err(e) => {
                result.errors.push(format!("item {external_id}: {e}"));
                return;
            }
        }

        let item = match self.client.normalize(raw, channel) {
            Ok(item) => item,
            Err(e) => {
                tracing::warn!(external_id, error = %e, "normalization failed");
                result.errors.push(format!("item {external_id}: {e}"));
                return;
            }
        };

        match self.store.insert_item(&item).await {
            Ok(InsertOutcome::Created(id)) => {
                tracing::debug!(external_id, id, "item stored");
                result.new += 1;
            }
            Ok(InsertOutcome::Duplicate) => {
                tracing::debug!(external_id, "item inserted concurrently, skipping");
                result.skipped += 1;
            }
            Err(e) => {
                tracing::warn!(external_id, error = %e, "failed to store item");
                result.errors.push(format!("item {external_id}: {e}"));
            }
        }
    }
}
