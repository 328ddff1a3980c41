use crate::app_config::{AppConfig, Environment};
use crate::items::SourcePlatform;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Source credentials are optional here; a client for the selected platform
/// checks for them when it is constructed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default =
        |var: &str, default: &str| -> String { lookup(var).unwrap_or_else(|_| default.to_string()) };

    // Blank values count as unset so `.env` templates with `KEY=` behave.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("MVPFINDER_ENV", "development"));
    let bind_addr = parse_addr("MVPFINDER_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("MVPFINDER_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("MVPFINDER_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("MVPFINDER_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("MVPFINDER_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let source_raw = or_default("MVPFINDER_SOURCE", "product_hunt");
    let source = SourcePlatform::parse(&source_raw).ok_or_else(|| {
        invalid(
            "MVPFINDER_SOURCE",
            format!("unknown source platform '{source_raw}' (expected product_hunt or reddit)"),
        )
    })?;

    let reddit_time_filter = or_default("MVPFINDER_REDDIT_TIME_FILTER", "week");
    if !matches!(
        reddit_time_filter.as_str(),
        "hour" | "day" | "week" | "month" | "year" | "all"
    ) {
        return Err(invalid(
            "MVPFINDER_REDDIT_TIME_FILTER",
            format!("unsupported time filter '{reddit_time_filter}'"),
        ));
    }

    let source_max_retries = parse_u32("MVPFINDER_SOURCE_MAX_RETRIES", "3")?;
    let source_initial_backoff_ms = parse_u64("MVPFINDER_SOURCE_INITIAL_BACKOFF_MS", "2000")?;
    let source_request_delay_ms = parse_u64("MVPFINDER_SOURCE_REQUEST_DELAY_MS", "1500")?;
    let source_request_timeout_secs = parse_u64("MVPFINDER_SOURCE_REQUEST_TIMEOUT_SECS", "30")?;

    let author_redaction_markers = parse_list(&or_default(
        "MVPFINDER_AUTHOR_REDACTION_MARKERS",
        "[REDACTED]",
    ));

    let ollama_host = or_default("OLLAMA_HOST", "http://ollama:11434")
        .trim_end_matches('/')
        .to_string();
    let ollama_model = or_default("OLLAMA_MODEL", "llama3.2:1b");
    let llm_generate_timeout_secs = parse_u64("MVPFINDER_LLM_GENERATE_TIMEOUT_SECS", "120")?;

    let sync_default_limit = parse_usize("MVPFINDER_SYNC_DEFAULT_LIMIT", "50")?;
    let analyze_default_limit = parse_usize("MVPFINDER_ANALYZE_DEFAULT_LIMIT", "10")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        source,
        product_hunt_token: optional("PRODUCT_HUNT_TOKEN"),
        product_hunt_api_key: optional("PRODUCT_HUNT_API_KEY"),
        product_hunt_api_secret: optional("PRODUCT_HUNT_API_SECRET"),
        reddit_client_id: optional("REDDIT_CLIENT_ID"),
        reddit_client_secret: optional("REDDIT_CLIENT_SECRET"),
        reddit_user_agent: or_default("REDDIT_USER_AGENT", "mvpfinder/0.1"),
        reddit_time_filter,
        source_request_timeout_secs,
        source_request_delay_ms,
        source_max_retries,
        source_initial_backoff_ms,
        author_redaction_markers,
        ollama_host,
        ollama_model,
        llm_generate_timeout_secs,
        sync_default_limit,
        analyze_default_limit,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

/// Split a comma-separated value, trimming entries and dropping empty ones.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
