//! Reddit listing client (application-only OAuth).

use async_trait::async_trait;
use mvpfinder_core::{AppConfig, NewContentItem, SourceChannel, SourcePlatform};
use tokio::sync::OnceCell;

use crate::client::{
    build_http_client, check_status, page_size, RawItem, SourceClient, SourcePage, SourceSettings,
};
use crate::error::SourceError;
use crate::normalize::normalize_reddit;
use crate::retry::retry_on_rate_limit;
use crate::throttle::Throttle;
use crate::types::{Listing, TokenResponse};

const PLATFORM: &str = "reddit";

pub const DEFAULT_AUTH_BASE_URL: &str = "https://www.reddit.com";
pub const DEFAULT_API_BASE_URL: &str = "https://oauth.reddit.com";
pub const MAX_PAGE_SIZE: usize = 100;

/// Subreddit probed by [`SourceClient::test_connection`].
const PROBE_SUBREDDIT: &str = "Python";

/// Reddit application credentials.
#[derive(Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .finish()
    }
}

impl RedditCredentials {
    /// # Errors
    ///
    /// Returns [`SourceError::Credentials`] unless both id and secret are set.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, SourceError> {
        match (&config.reddit_client_id, &config.reddit_client_secret) {
            (Some(client_id), Some(client_secret)) => Ok(Self {
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
            }),
            _ => Err(SourceError::Credentials {
                platform: PLATFORM,
                reason: "set REDDIT_CLIENT_ID and REDDIT_CLIENT_SECRET".to_string(),
            }),
        }
    }
}

/// Client for subreddit `top` listings.
///
/// Exchanges the application credentials for a bearer token on first use and
/// keeps it for the lifetime of the client.
pub struct RedditClient {
    http: reqwest::Client,
    auth_base_url: String,
    api_base_url: String,
    credentials: RedditCredentials,
    time_filter: String,
    token: OnceCell<String>,
    throttle: Throttle,
    settings: SourceSettings,
}

impl RedditClient {
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be constructed.
    pub fn new(
        settings: SourceSettings,
        credentials: RedditCredentials,
        time_filter: &str,
    ) -> Result<Self, SourceError> {
        Self::with_base_urls(
            settings,
            credentials,
            time_filter,
            DEFAULT_AUTH_BASE_URL,
            DEFAULT_API_BASE_URL,
        )
    }

    /// Like [`Self::new`] with custom token and listing origins (used by tests).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be constructed.
    pub fn with_base_urls(
        settings: SourceSettings,
        credentials: RedditCredentials,
        time_filter: &str,
        auth_base_url: &str,
        api_base_url: &str,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            http: build_http_client(&settings)?,
            auth_base_url: auth_base_url.trim_end_matches('/').to_string(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            credentials,
            time_filter: time_filter.to_string(),
            token: OnceCell::new(),
            throttle: Throttle::new(settings.request_delay),
            settings,
        })
    }

    /// # Errors
    ///
    /// Returns [`SourceError::Credentials`] when the Reddit app credentials
    /// are not configured.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, SourceError> {
        Self::new(
            SourceSettings::from_app_config(config),
            RedditCredentials::from_app_config(config)?,
            &config.reddit_time_filter,
        )
    }

    async fn acquire_token(&self) -> Result<&str, SourceError> {
        let token = self
            .token
            .get_or_try_init(|| async move { self.fetch_token().await })
            .await?;
        Ok(token.as_str())
    }

    async fn fetch_token(&self) -> Result<String, SourceError> {
        let url = format!("{}/api/v1/access_token", self.auth_base_url);
        let url = url.as_str();

        let token = retry_on_rate_limit(
            self.settings.max_retries,
            self.settings.initial_backoff,
            move || async move {
                let response = self
                    .http
                    .post(url)
                    .basic_auth(
                        &self.credentials.client_id,
                        Some(&self.credentials.client_secret),
                    )
                    .form(&[("grant_type", "client_credentials")])
                    .send()
                    .await?;
                check_status(PLATFORM, &response)?;
                let text = response.text().await?;
                serde_json::from_str::<TokenResponse>(&text).map_err(|e| {
                    SourceError::Deserialize {
                        context: "reddit token response".to_string(),
                        source: e,
                    }
                })
            },
        )
        .await?;

        tracing::info!("acquired reddit access token");
        Ok(token.access_token)
    }

    async fn fetch_listing(
        &self,
        subreddit: &str,
        limit: usize,
        after: Option<&str>,
    ) -> Result<Listing, SourceError> {
        let token = self.acquire_token().await?;
        let url = format!("{}/r/{subreddit}/top", self.api_base_url);
        let mut params: Vec<(&str, String)> = vec![
            ("t", self.time_filter.clone()),
            ("limit", limit.to_string()),
            ("raw_json", "1".to_string()),
        ];
        if let Some(cursor) = after {
            params.push(("after", cursor.to_string()));
        }
        let (url, params) = (url.as_str(), &params);

        retry_on_rate_limit(
            self.settings.max_retries,
            self.settings.initial_backoff,
            move || async move {
                let _permit = self.throttle.acquire().await;
                let response = self
                    .http
                    .get(url)
                    .bearer_auth(token)
                    .query(params)
                    .send()
                    .await?;
                check_status(PLATFORM, &response)?;
                let text = response.text().await?;
                serde_json::from_str::<Listing>(&text).map_err(|e| SourceError::Deserialize {
                    context: format!("r/{subreddit} listing"),
                    source: e,
                })
            },
        )
        .await
    }
}

#[async_trait]
impl SourceClient for RedditClient {
    fn platform(&self) -> SourcePlatform {
        SourcePlatform::Reddit
    }

    fn max_page_size(&self) -> usize {
        MAX_PAGE_SIZE
    }

    async fn fetch_items(
        &self,
        channel: &str,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<SourcePage, SourceError> {
        let requested = page_size(limit, MAX_PAGE_SIZE);
        let listing = self.fetch_listing(channel, requested, cursor).await?;

        let page = SourcePage {
            items: listing
                .data
                .children
                .into_iter()
                .map(|child| {
                    RawItem::decode(SourcePlatform::Reddit, child.data, RawItem::Reddit)
                })
                .collect(),
            has_next_page: listing.data.after.is_some(),
            next_cursor: listing.data.after,
        };

        tracing::debug!(
            platform = PLATFORM,
            channel,
            requested,
            received = page.items.len(),
            has_next_page = page.has_next_page,
            "fetched reddit page"
        );
        Ok(page)
    }

    async fn test_connection(&self) -> bool {
        match self.fetch_listing(PROBE_SUBREDDIT, 1, None).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(platform = PLATFORM, error = %e, "connection test failed");
                false
            }
        }
    }

    fn normalize(
        &self,
        raw: &RawItem,
        channel: &SourceChannel,
    ) -> Result<NewContentItem, SourceError> {
        match raw {
            RawItem::Reddit(post) => normalize_reddit(post, channel),
            RawItem::Malformed(item) => Err(item.to_error()),
            other => Err(SourceError::Normalization {
                external_id: other.external_id().to_string(),
                reason: "item does not come from reddit".to_string(),
            }),
        }
    }
}
