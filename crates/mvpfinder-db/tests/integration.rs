//! Offline tests for mvpfinder-db pool configuration and row conversion.
//! These tests do not require a live database connection.

use chrono::{TimeZone, Utc};
use mvpfinder_core::{AppConfig, ContentItem, Environment, SourceChannel, SourcePlatform};
use mvpfinder_db::{ChannelRow, ContentItemRow, DbError, PoolConfig};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

fn item_row() -> ContentItemRow {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    ContentItemRow {
        id: 7,
        external_id: "abc1".to_string(),
        platform: "reddit".to_string(),
        channel_id: 3,
        title: "Show HN style post".to_string(),
        tagline: String::new(),
        body: "Body".to_string(),
        author: "alice".to_string(),
        score: 42,
        votes: 42,
        comments: 5,
        source_url: "https://www.reddit.com/r/SaaS/comments/abc1/".to_string(),
        external_site_url: None,
        created_at_source: at,
        ingested_at: at,
        summary: None,
        problem: None,
        mvp_idea: None,
        target_audience: None,
        potential_score: None,
        tags: None,
        analyzed_at: None,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        source: SourcePlatform::Reddit,
        product_hunt_token: None,
        product_hunt_api_key: None,
        product_hunt_api_secret: None,
        reddit_client_id: None,
        reddit_client_secret: None,
        reddit_user_agent: "ua".to_string(),
        reddit_time_filter: "week".to_string(),
        source_request_timeout_secs: 30,
        source_request_delay_ms: 1500,
        source_max_retries: 3,
        source_initial_backoff_ms: 2000,
        author_redaction_markers: vec!["[REDACTED]".to_string()],
        ollama_host: "http://localhost:11434".to_string(),
        ollama_model: "llama3.2:1b".to_string(),
        llm_generate_timeout_secs: 120,
        sync_default_limit: 50,
        analyze_default_limit: 10,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn channel_row_converts_to_domain() {
    let row = ChannelRow {
        id: 1,
        platform: "product_hunt".to_string(),
        name: "developer-tools".to_string(),
        active: true,
        last_synced_at: None,
    };
    let channel = SourceChannel::try_from(row).expect("valid row");
    assert_eq!(channel.platform, SourcePlatform::ProductHunt);
    assert_eq!(channel.name, "developer-tools");
}

#[test]
fn channel_row_with_unknown_platform_is_rejected() {
    let row = ChannelRow {
        id: 1,
        platform: "hackernews".to_string(),
        name: "front".to_string(),
        active: true,
        last_synced_at: None,
    };
    let err = SourceChannel::try_from(row).unwrap_err();
    assert!(matches!(err, DbError::InvalidPlatform(ref p) if p == "hackernews"));
}

#[test]
fn unanalyzed_row_has_no_analysis_block() {
    let item = ContentItem::try_from(item_row()).expect("valid row");
    assert_eq!(item.external_id, "abc1");
    assert_eq!(item.platform, SourcePlatform::Reddit);
    assert!(!item.analyzed());
}

#[test]
fn analyzed_row_carries_analysis_block() {
    let at = Utc.with_ymd_and_hms(2024, 5, 2, 8, 30, 0).unwrap();
    let row = ContentItemRow {
        summary: Some("A tool".to_string()),
        problem: Some("A problem".to_string()),
        mvp_idea: Some("An idea".to_string()),
        target_audience: Some("Founders".to_string()),
        potential_score: Some(10),
        tags: Some(vec!["a".to_string(), "b".to_string(), "c".to_string()]),
        analyzed_at: Some(at),
        ..item_row()
    };

    let item = ContentItem::try_from(row).expect("valid row");
    let analysis = item.analysis.expect("analysis block");
    assert_eq!(analysis.potential_score, 10);
    assert_eq!(analysis.tags, vec!["a", "b", "c"]);
    assert_eq!(analysis.analyzed_at, at);
}
