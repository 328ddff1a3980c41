use std::net::SocketAddr;

use crate::items::SourcePlatform;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,

    /// Platform the ingestion pipeline pulls from.
    pub source: SourcePlatform,
    pub product_hunt_token: Option<String>,
    pub product_hunt_api_key: Option<String>,
    pub product_hunt_api_secret: Option<String>,
    pub reddit_client_id: Option<String>,
    pub reddit_client_secret: Option<String>,
    pub reddit_user_agent: String,
    pub reddit_time_filter: String,
    pub source_request_timeout_secs: u64,
    pub source_request_delay_ms: u64,
    pub source_max_retries: u32,
    pub source_initial_backoff_ms: u64,
    pub author_redaction_markers: Vec<String>,

    pub ollama_host: String,
    pub ollama_model: String,
    pub llm_generate_timeout_secs: u64,

    pub sync_default_limit: usize,
    pub analyze_default_limit: usize,
}

fn redact(value: Option<&String>) -> Option<&'static str> {
    value.map(|_| "[redacted]")
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("source", &self.source)
            .field(
                "product_hunt_token",
                &redact(self.product_hunt_token.as_ref()),
            )
            .field(
                "product_hunt_api_key",
                &redact(self.product_hunt_api_key.as_ref()),
            )
            .field(
                "product_hunt_api_secret",
                &redact(self.product_hunt_api_secret.as_ref()),
            )
            .field("reddit_client_id", &redact(self.reddit_client_id.as_ref()))
            .field(
                "reddit_client_secret",
                &redact(self.reddit_client_secret.as_ref()),
            )
            .field("reddit_user_agent", &self.reddit_user_agent)
            .field("reddit_time_filter", &self.reddit_time_filter)
            .field(
                "source_request_timeout_secs",
                &self.source_request_timeout_secs,
            )
            .field("source_request_delay_ms", &self.source_request_delay_ms)
            .field("source_max_retries", &self.source_max_retries)
            .field("source_initial_backoff_ms", &self.source_initial_backoff_ms)
            .field("author_redaction_markers", &self.author_redaction_markers)
            .field("ollama_host", &self.ollama_host)
            .field("ollama_model", &self.ollama_model)
            .field("llm_generate_timeout_secs", &self.llm_generate_timeout_secs)
            .field("sync_default_limit", &self.sync_default_limit)
            .field("analyze_default_limit", &self.analyze_default_limit)
            .finish()
    }
}
