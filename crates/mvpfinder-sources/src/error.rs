use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("missing credentials for {platform}: {reason}")]
    Credentials {
        platform: &'static str,
        reason: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {platform} after {retries} retries")]
    RateLimited {
        platform: &'static str,
        retries: u32,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("{platform} API error: {message}")]
    Api {
        platform: &'static str,
        message: String,
    },

    #[error("normalization error for item {external_id}: {reason}")]
    Normalization { external_id: String, reason: String },
}
