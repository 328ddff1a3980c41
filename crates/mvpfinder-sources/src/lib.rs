//! External content sources: Product Hunt and Reddit.

pub mod author;
pub mod client;
pub mod error;
pub mod normalize;
pub mod product_hunt;
pub mod reddit;
pub(crate) mod retry;
pub(crate) mod throttle;
pub mod types;

use std::sync::Arc;

use mvpfinder_core::{AppConfig, SourcePlatform};

pub use author::AuthorRedaction;
pub use client::{MalformedItem, RawItem, SourceClient, SourcePage, SourceSettings};
pub use error::SourceError;
pub use product_hunt::{ProductHuntAuth, ProductHuntClient};
pub use reddit::{RedditClient, RedditCredentials};
pub use types::{ProductHuntMaker, ProductHuntPost, ProductHuntTopic, RedditPost};

/// Builds the client for the platform selected by `MVPFINDER_SOURCE`.
///
/// # Errors
///
/// Returns [`SourceError::Credentials`] when the selected platform has no
/// credentials configured, or [`SourceError::Http`] if the HTTP client cannot
/// be constructed.
pub fn build_source_client(config: &AppConfig) -> Result<Arc<dyn SourceClient>, SourceError> {
    let client: Arc<dyn SourceClient> = match config.source {
        SourcePlatform::ProductHunt => Arc::new(ProductHuntClient::from_app_config(config)?),
        SourcePlatform::Reddit => Arc::new(RedditClient::from_app_config(config)?),
    };
    tracing::debug!(platform = %config.source, "built source client");
    Ok(client)
}
