use thiserror::Error;

/// Failure of one call to the inference server.
///
/// Separates "nothing answered" from "answered with an error" so callers can
/// report the right condition.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("inference server unreachable at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("inference server returned HTTP {status} from {url}: {body}")]
    Status { status: u16, url: String, body: String },

    #[error("could not decode {context}: {reason}")]
    Decode { context: String, reason: String },
}

impl LlmError {
    /// True when the request did not complete within its timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, LlmError::Unreachable { source, .. } if source.is_timeout())
    }
}
