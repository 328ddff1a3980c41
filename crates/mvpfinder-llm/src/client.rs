use std::time::Duration;

use mvpfinder_core::AppConfig;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::LlmError;

pub const DEFAULT_HOST: &str = "http://ollama:11434";
pub const DEFAULT_MODEL: &str = "llama3.2:1b";

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const PULL_TIMEOUT: Duration = Duration::from_secs(600);
pub const DEFAULT_GENERATE_TIMEOUT: Duration = Duration::from_secs(120);

const TEMPERATURE: f64 = 0.3;
const MAX_OUTPUT_TOKENS: u32 = 2000;

/// Outcome of a model download request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullOutcome {
    pub status: PullStatus,
    pub message: String,
}

/// Snapshot of the inference server and configured model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmStatus {
    pub host: String,
    pub model: String,
    pub available: bool,
    pub model_available: bool,
    /// `available && model_available`
    pub ready: bool,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    #[serde(default)]
    version: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<InstalledModel>,
}

#[derive(Debug, Deserialize)]
struct InstalledModel {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Client for a local Ollama server.
///
/// The `try_*` methods report why a call failed. The plain methods wrap them
/// and never return an error: failures become `false`, `None` or an error
/// [`PullOutcome`], and are logged.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    host: String,
    model: String,
}

impl OllamaClient {
    /// # Errors
    ///
    /// Returns [`LlmError::Client`] if the HTTP client cannot be constructed.
    pub fn new(host: &str, model: &str) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .connect_timeout(PROBE_TIMEOUT)
            .build()
            .map_err(LlmError::Client)?;
        Ok(Self {
            http,
            host: host.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    /// # Errors
    ///
    /// Returns [`LlmError::Client`] if the HTTP client cannot be constructed.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, LlmError> {
        Self::new(&config.ollama_host, &config.ollama_model)
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The model used by [`Self::generate`].
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    // -----------------------------------------------------------------------
    // Probes
    // -----------------------------------------------------------------------

    /// Reads the server version.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Unreachable`], [`LlmError::Status`] or
    /// [`LlmError::Decode`].
    pub async fn try_version(&self) -> Result<String, LlmError> {
        let body: VersionResponse = self
            .get_json("/api/version", PROBE_TIMEOUT, "version response")
            .await?;
        Ok(body.version)
    }

    /// Succeeds on any 2xx from `/api/version`, whatever the body.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Unreachable`] or [`LlmError::Status`].
    pub async fn try_ping(&self) -> Result<(), LlmError> {
        let url = format!("{}/api/version", self.host);
        let response = self
            .http
            .get(&url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(|source| LlmError::Unreachable {
                url: url.clone(),
                source,
            })?;
        let response = ensure_success(&url, response).await?;

        let version = response
            .text()
            .await
            .ok()
            .and_then(|text| serde_json::from_str::<VersionResponse>(&text).ok())
            .map(|body| body.version);
        tracing::debug!(
            host = %self.host,
            version = version.as_deref().unwrap_or("unknown"),
            "ollama answered version probe"
        );
        Ok(())
    }

    /// True when the server answers `/api/version` with a success status.
    pub async fn is_available(&self) -> bool {
        match self.try_ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(host = %self.host, error = %e, "ollama not available");
                false
            }
        }
    }

    /// Names of the locally installed models.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Unreachable`], [`LlmError::Status`] or
    /// [`LlmError::Decode`].
    pub async fn try_list_models(&self) -> Result<Vec<String>, LlmError> {
        let body: TagsResponse = self
            .get_json("/api/tags", PROBE_TIMEOUT, "tags response")
            .await?;
        Ok(body.models.into_iter().map(|m| m.name).collect())
    }

    /// True when `name` is installed, allowing for an implicit `:latest` tag.
    pub async fn is_model_available(&self, name: &str) -> bool {
        match self.try_list_models().await {
            Ok(installed) => model_matches(&installed, name),
            Err(e) => {
                tracing::warn!(host = %self.host, model = name, error = %e, "could not list models");
                false
            }
        }
    }

    /// Combined readiness. The model check is skipped when the server is down.
    pub async fn status(&self) -> LlmStatus {
        let available = self.is_available().await;
        let model_available = if available {
            self.is_model_available(&self.model).await
        } else {
            false
        };
        LlmStatus {
            host: self.host.clone(),
            model: self.model.clone(),
            available,
            model_available,
            ready: available && model_available,
        }
    }

    // -----------------------------------------------------------------------
    // Model management
    // -----------------------------------------------------------------------

    /// Downloads `name`, blocking until the server reports completion.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Unreachable`] or [`LlmError::Status`].
    pub async fn try_pull_model(&self, name: &str) -> Result<(), LlmError> {
        let url = format!("{}/api/pull", self.host);
        let response = self
            .http
            .post(&url)
            .timeout(PULL_TIMEOUT)
            .json(&json!({ "name": name, "stream": false }))
            .send()
            .await
            .map_err(|source| LlmError::Unreachable {
                url: url.clone(),
                source,
            })?;
        ensure_success(&url, response).await?;
        Ok(())
    }

    pub async fn pull_model(&self, name: &str) -> PullOutcome {
        tracing::info!(host = %self.host, model = name, "pulling model");
        match self.try_pull_model(name).await {
            Ok(()) => {
                tracing::info!(model = name, "model pulled");
                PullOutcome {
                    status: PullStatus::Success,
                    message: format!("model {name} downloaded"),
                }
            }
            Err(e) => {
                tracing::error!(model = name, error = %e, "model pull failed");
                PullOutcome {
                    status: PullStatus::Error,
                    message: e.to_string(),
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Generation
    // -----------------------------------------------------------------------

    /// Runs one non-streaming completion with the configured model.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Unreachable`] (including timeouts),
    /// [`LlmError::Status`] or [`LlmError::Decode`].
    pub async fn try_generate(&self, prompt: &str, timeout: Duration) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.host);
        let response = self
            .http
            .post(&url)
            .timeout(timeout)
            .json(&json!({
                "model": self.model,
                "prompt": prompt,
                "stream": false,
                "options": {
                    "temperature": TEMPERATURE,
                    "num_predict": MAX_OUTPUT_TOKENS,
                },
            }))
            .send()
            .await
            .map_err(|source| LlmError::Unreachable {
                url: url.clone(),
                source,
            })?;
        let response = ensure_success(&url, response).await?;
        let body: GenerateResponse = decode(&url, response, "generate response").await?;
        Ok(body.response)
    }

    /// Generated text, or `None` on timeout, HTTP error, malformed body or an
    /// empty response.
    pub async fn generate(&self, prompt: &str, timeout: Duration) -> Option<String> {
        match self.try_generate(prompt, timeout).await {
            Ok(text) if text.trim().is_empty() => {
                tracing::warn!(model = %self.model, "ollama returned an empty response");
                None
            }
            Ok(text) => Some(text),
            Err(e) => {
                tracing::error!(
                    model = %self.model,
                    timed_out = e.is_timeout(),
                    error = %e,
                    "generation failed"
                );
                None
            }
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        timeout: Duration,
        context: &str,
    ) -> Result<T, LlmError> {
        let url = format!("{}{path}", self.host);
        let response = self
            .http
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|source| LlmError::Unreachable {
                url: url.clone(),
                source,
            })?;
        let response = ensure_success(&url, response).await?;
        decode(&url, response, context).await
    }
}

async fn ensure_success(url: &str, response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(LlmError::Status {
        status: status.as_u16(),
        url: url.to_string(),
        body: body.chars().take(500).collect(),
    })
}

async fn decode<T: serde::de::DeserializeOwned>(
    url: &str,
    response: reqwest::Response,
    context: &str,
) -> Result<T, LlmError> {
    let text = response
        .text()
        .await
        .map_err(|source| LlmError::Unreachable {
            url: url.to_string(),
            source,
        })?;
    serde_json::from_str(&text).map_err(|e| LlmError::Decode {
        context: context.to_string(),
        reason: e.to_string(),
    })
}

/// Matches `name` against installed model names: exactly, with `:latest`
/// appended, or with a trailing `:latest` removed.
#[must_use]
pub fn model_matches(installed: &[String], name: &str) -> bool {
    let with_latest = format!("{name}:latest");
    let without_latest = name.strip_suffix(":latest").unwrap_or(name);
    installed
        .iter()
        .any(|m| m == name || *m == with_latest || m == without_latest)
}
