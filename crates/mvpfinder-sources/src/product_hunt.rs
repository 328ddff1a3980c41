//! Product Hunt GraphQL client (API v2).

use async_trait::async_trait;
use mvpfinder_core::{AppConfig, NewContentItem, SourceChannel, SourcePlatform};
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::OnceCell;

use crate::author::AuthorRedaction;
use crate::client::{
    build_http_client, check_status, page_size, RawItem, SourceClient, SourcePage, SourceSettings,
};
use crate::error::SourceError;
use crate::normalize::normalize_product_hunt;
use crate::retry::retry_on_rate_limit;
use crate::types::{GraphQlResponse, PostsData, ProductHuntTopic, TokenResponse, TopicsData};

const PLATFORM: &str = "product_hunt";

pub const DEFAULT_BASE_URL: &str = "https://api.producthunt.com";
/// The `posts` connection rejects `first` above 20.
pub const MAX_PAGE_SIZE: usize = 20;
pub const MAX_TOPICS: usize = 50;

const POSTS_QUERY: &str = r"
query GetPosts($first: Int!, $after: String, $topic: String) {
  posts(first: $first, after: $after, topic: $topic) {
    edges {
      node {
        id
        name
        tagline
        description
        url
        website
        votesCount
        commentsCount
        createdAt
        makers { username name }
      }
    }
    pageInfo { hasNextPage endCursor }
  }
}";

const TOPICS_QUERY: &str = r"
query GetTopics($first: Int!) {
  topics(first: $first) {
    edges {
      node { id slug name description postsCount }
    }
  }
}";

/// How the client obtains its bearer token.
#[derive(Clone)]
pub enum ProductHuntAuth {
    /// A developer token used as-is.
    DeveloperToken(String),
    /// API key and secret exchanged once via the OAuth client-credentials grant.
    ClientCredentials { api_key: String, api_secret: String },
}

impl std::fmt::Debug for ProductHuntAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductHuntAuth::DeveloperToken(_) => f.write_str("DeveloperToken([redacted])"),
            ProductHuntAuth::ClientCredentials { .. } => {
                f.write_str("ClientCredentials([redacted])")
            }
        }
    }
}

impl ProductHuntAuth {
    /// Prefers `PRODUCT_HUNT_TOKEN`; otherwise requires both key and secret.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Credentials`] when neither form is configured.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, SourceError> {
        if let Some(token) = &config.product_hunt_token {
            return Ok(ProductHuntAuth::DeveloperToken(token.clone()));
        }
        match (&config.product_hunt_api_key, &config.product_hunt_api_secret) {
            (Some(api_key), Some(api_secret)) => Ok(ProductHuntAuth::ClientCredentials {
                api_key: api_key.clone(),
                api_secret: api_secret.clone(),
            }),
            _ => Err(SourceError::Credentials {
                platform: PLATFORM,
                reason: "set PRODUCT_HUNT_TOKEN or both PRODUCT_HUNT_API_KEY and \
                         PRODUCT_HUNT_API_SECRET"
                    .to_string(),
            }),
        }
    }
}

/// Client for the Product Hunt GraphQL API.
///
/// The bearer token is acquired on first use and cached for the lifetime of
/// the client. Every GraphQL request passes through the client's throttle and
/// is retried with exponential backoff on 429.
pub struct ProductHuntClient {
    http: reqwest::Client,
    base_url: String,
    auth: ProductHuntAuth,
    token: OnceCell<String>,
    throttle: crate::throttle::Throttle,
    settings: SourceSettings,
    redaction: AuthorRedaction,
}

impl ProductHuntClient {
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be constructed.
    pub fn new(
        settings: SourceSettings,
        auth: ProductHuntAuth,
        redaction: AuthorRedaction,
    ) -> Result<Self, SourceError> {
        Self::with_base_url(settings, auth, redaction, DEFAULT_BASE_URL)
    }

    /// Like [`Self::new`] but against a different API origin (used by tests).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be constructed.
    pub fn with_base_url(
        settings: SourceSettings,
        auth: ProductHuntAuth,
        redaction: AuthorRedaction,
        base_url: &str,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            http: build_http_client(&settings)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
            token: OnceCell::new(),
            throttle: crate::throttle::Throttle::new(settings.request_delay),
            settings,
            redaction,
        })
    }

    /// # Errors
    ///
    /// Returns [`SourceError::Credentials`] when no Product Hunt credentials
    /// are configured.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, SourceError> {
        Self::new(
            SourceSettings::from_app_config(config),
            ProductHuntAuth::from_app_config(config)?,
            AuthorRedaction::new(&config.author_redaction_markers),
        )
    }

    /// Lists topics (channel candidates), at most [`MAX_TOPICS`].
    ///
    /// # Errors
    ///
    /// Propagates request, rate-limit and GraphQL errors.
    pub async fn fetch_topics(&self, limit: usize) -> Result<Vec<ProductHuntTopic>, SourceError> {
        let first = page_size(limit, MAX_TOPICS);
        let data: TopicsData = self
            .execute(TOPICS_QUERY, json!({ "first": first }), "topics")
            .await?;
        Ok(data.topics.edges.into_iter().map(|e| e.node).collect())
    }

    async fn acquire_token(&self) -> Result<&str, SourceError> {
        let token = self
            .token
            .get_or_try_init(|| async move {
                match &self.auth {
                    ProductHuntAuth::DeveloperToken(token) => Ok(token.clone()),
                    ProductHuntAuth::ClientCredentials {
                        api_key,
                        api_secret,
                    } => self.exchange_credentials(api_key, api_secret).await,
                }
            })
            .await?;
        Ok(token.as_str())
    }

    async fn exchange_credentials(
        &self,
        api_key: &str,
        api_secret: &str,
    ) -> Result<String, SourceError> {
        let url = format!("{}/v2/oauth/token", self.base_url);
        let body = json!({
            "client_id": api_key,
            "client_secret": api_secret,
            "grant_type": "client_credentials",
        });

        let (url, body) = (url.as_str(), &body);

        let token = retry_on_rate_limit(
            self.settings.max_retries,
            self.settings.initial_backoff,
            move || async move {
                let response = self.http.post(url).json(body).send().await?;
                check_status(PLATFORM, &response)?;
                let text = response.text().await?;
                serde_json::from_str::<TokenResponse>(&text).map_err(|e| {
                    SourceError::Deserialize {
                        context: "product hunt token response".to_string(),
                        source: e,
                    }
                })
            },
        )
        .await?;

        tracing::info!("acquired product hunt access token");
        Ok(token.access_token)
    }

    /// Runs one GraphQL operation through the throttle and retry policy.
    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
        context: &str,
    ) -> Result<T, SourceError> {
        let token = self.acquire_token().await?;
        let url = format!("{}/v2/api/graphql", self.base_url);
        let payload = json!({ "query": query, "variables": variables });
        let (url, payload) = (url.as_str(), &payload);

        retry_on_rate_limit(
            self.settings.max_retries,
            self.settings.initial_backoff,
            move || async move {
                let _permit = self.throttle.acquire().await;
                let response = self
                    .http
                    .post(url)
                    .bearer_auth(token)
                    .header(reqwest::header::ACCEPT, "application/json")
                    .json(payload)
                    .send()
                    .await?;
                check_status(PLATFORM, &response)?;
                let text = response.text().await?;

                let envelope: GraphQlResponse<T> =
                    serde_json::from_str(&text).map_err(|e| SourceError::Deserialize {
                        context: format!("product hunt {context} response"),
                        source: e,
                    })?;

                if !envelope.errors.is_empty() {
                    let message = envelope
                        .errors
                        .iter()
                        .map(|e| e.message.as_str())
                        .collect::<Vec<_>>()
                        .join("; ");
                    return Err(SourceError::Api {
                        platform: PLATFORM,
                        message,
                    });
                }

                envelope.data.ok_or_else(|| SourceError::Api {
                    platform: PLATFORM,
                    message: format!("{context} response carried no data"),
                })
            },
        )
        .await
    }
}

#[async_trait]
impl SourceClient for ProductHuntClient {
    fn platform(&self) -> SourcePlatform {
        SourcePlatform::ProductHunt
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
        let first = page_size(limit, MAX_PAGE_SIZE);
        let variables = json!({ "first": first, "after": cursor, "topic": channel });
        let data: PostsData = self.execute(POSTS_QUERY, variables, "posts").await?;

        let page = SourcePage {
            items: data
                .posts
                .edges
                .into_iter()
                .map(|e| {
                    RawItem::decode(SourcePlatform::ProductHunt, e.node, RawItem::ProductHunt)
                })
                .collect(),
            has_next_page: data.posts.page_info.has_next_page,
            next_cursor: data.posts.page_info.end_cursor,
        };

        tracing::debug!(
            platform = PLATFORM,
            channel,
            requested = first,
            received = page.items.len(),
            has_next_page = page.has_next_page,
            "fetched product hunt page"
        );
        Ok(page)
    }

    async fn test_connection(&self) -> bool {
        match self.fetch_topics(1).await {
            Ok(topics) => !topics.is_empty(),
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
            RawItem::ProductHunt(post) => normalize_product_hunt(post, channel, &self.redaction),
            RawItem::Malformed(item) => Err(item.to_error()),
            other => Err(SourceError::Normalization {
                external_id: other.external_id().to_string(),
                reason: "item does not come from product hunt".to_string(),
            }),
        }
    }
}
