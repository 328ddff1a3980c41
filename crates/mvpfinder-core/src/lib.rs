//! Shared domain types, configuration, and the item store seam for mvpfinder.

pub mod app_config;
pub mod config;
pub mod items;
pub mod store;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use items::{
    AnalysisBlock, AnalysisResult, ContentItem, NewContentItem, SourceChannel, SourcePlatform,
};
pub use store::{InsertOutcome, ItemStore, StoreError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
