use std::time::Duration;

use async_trait::async_trait;
use mvpfinder_core::{AppConfig, NewContentItem, SourceChannel, SourcePlatform};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::SourceError;
use crate::types::{ProductHuntPost, RedditPost};

const MISSING_ID: &str = "<missing id>";

/// One item as delivered by an upstream API, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawItem {
    ProductHunt(ProductHuntPost),
    Reddit(RedditPost),
    /// A node that does not match its platform's wire shape. Kept in the page
    /// so the rest of the page still ingests; normalizing it fails.
    Malformed(MalformedItem),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedItem {
    pub platform: SourcePlatform,
    /// The node's `id`, or `<missing id>`.
    pub external_id: String,
    pub reason: String,
}

impl MalformedItem {
    /// The per-item error reported when this node is normalized.
    #[must_use]
    pub fn to_error(&self) -> SourceError {
        SourceError::Normalization {
            external_id: self.external_id.clone(),
            reason: format!("malformed {} item: {}", self.platform, self.reason),
        }
    }
}

impl RawItem {
    /// The upstream identifier used as the dedup key.
    #[must_use]
    pub fn external_id(&self) -> &str {
        match self {
            RawItem::ProductHunt(post) => &post.id,
            RawItem::Reddit(post) => &post.id,
            RawItem::Malformed(item) => &item.external_id,
        }
    }

    /// Decodes one page node, turning a shape mismatch into
    /// [`RawItem::Malformed`] instead of failing the page.
    pub(crate) fn decode<T, F>(platform: SourcePlatform, node: Value, wrap: F) -> Self
    where
        T: DeserializeOwned,
        F: FnOnce(T) -> Self,
    {
        let external_id = match node.get("id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => MISSING_ID.to_string(),
        };

        match serde_json::from_value::<T>(node) {
            Ok(item) => wrap(item),
            Err(e) => {
                tracing::warn!(
                    platform = %platform,
                    external_id = %external_id,
                    error = %e,
                    "malformed item in page"
                );
                RawItem::Malformed(MalformedItem {
                    platform,
                    external_id,
                    reason: e.to_string(),
                })
            }
        }
    }
}

/// One page of a paginated channel listing.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePage {
    pub items: Vec<RawItem>,
    pub has_next_page: bool,
    /// Opaque cursor to pass back for the following page.
    pub next_cursor: Option<String>,
}

/// Request pacing and retry policy shared by every source client.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub request_timeout: Duration,
    /// Minimum spacing between a completed request and the next one.
    pub request_delay: Duration,
    /// Retries after the first attempt when the API answers 429.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub user_agent: String,
}

impl SourceSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            request_timeout: Duration::from_secs(config.source_request_timeout_secs),
            request_delay: Duration::from_millis(config.source_request_delay_ms),
            max_retries: config.source_max_retries,
            initial_backoff: Duration::from_millis(config.source_initial_backoff_ms),
            user_agent: config.reddit_user_agent.clone(),
        }
    }
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            request_delay: Duration::from_millis(1500),
            max_retries: 3,
            initial_backoff: Duration::from_millis(2000),
            user_agent: "mvpfinder/0.1".to_string(),
        }
    }
}

/// Authenticated, throttled access to one external content API.
#[async_trait]
pub trait SourceClient: Send + Sync {
    fn platform(&self) -> SourcePlatform;

    /// Hard upper bound on items per page imposed by the upstream API.
    fn max_page_size(&self) -> usize;

    /// Fetches one page of `channel`, at most `min(limit, max_page_size())` items.
    ///
    /// # Errors
    ///
    /// - [`SourceError::RateLimited`] after exhausting 429 retries.
    /// - [`SourceError::UnexpectedStatus`], [`SourceError::Http`],
    ///   [`SourceError::Api`], [`SourceError::Deserialize`] otherwise.
    async fn fetch_items(
        &self,
        channel: &str,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<SourcePage, SourceError>;

    /// Performs one minimal read. Never errors.
    async fn test_connection(&self) -> bool;

    /// Maps a raw item of this client's platform onto the storage shape.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Normalization`] when the item cannot be mapped.
    fn normalize(
        &self,
        raw: &RawItem,
        channel: &SourceChannel,
    ) -> Result<NewContentItem, SourceError>;
}

pub(crate) fn page_size(limit: usize, max: usize) -> usize {
    limit.clamp(1, max)
}

pub(crate) fn build_http_client(settings: &SourceSettings) -> Result<reqwest::Client, SourceError> {
    Ok(reqwest::Client::builder()
        .timeout(settings.request_timeout)
        .connect_timeout(Duration::from_secs(10))
        .user_agent(&settings.user_agent)
        .build()?)
}

/// Maps a response status to the retry/error taxonomy. 429 becomes
/// [`SourceError::RateLimited`] so the retry loop can pick it up.
pub(crate) fn check_status(
    platform: &'static str,
    response: &reqwest::Response,
) -> Result<(), SourceError> {
    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(SourceError::RateLimited {
            platform,
            retries: 0,
        });
    }
    if !status.is_success() {
        return Err(SourceError::UnexpectedStatus {
            status: status.as_u16(),
            url: response.url().to_string(),
        });
    }
    Ok(())
}
