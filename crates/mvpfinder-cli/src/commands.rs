//! Command handlers. Each runs its work inline and prints a JSON summary to
//! stdout; logs go to stderr.

use std::time::Duration;

use anyhow::Context;
use mvpfinder_core::{AppConfig, ItemStore};
use mvpfinder_db::PgItemStore;
use mvpfinder_llm::{OllamaClient, PullStatus};
use mvpfinder_pipeline::{summarize, AnalysisRun, Analyzer, Ingestor};
use serde::Serialize;

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn connect_store(config: &AppConfig) -> anyhow::Result<PgItemStore> {
    let pool = mvpfinder_db::connect_pool_from_config(config)
        .await
        .context("failed to connect to the database")?;
    Ok(PgItemStore::new(pool))
}

fn build_llm(config: &AppConfig) -> anyhow::Result<OllamaClient> {
    OllamaClient::from_app_config(config).context("failed to build the Ollama client")
}

pub(crate) async fn run_sync(
    config: &AppConfig,
    channels: &[String],
    limit: usize,
) -> anyhow::Result<()> {
    let source = mvpfinder_sources::build_source_client(config)?;
    let store = connect_store(config).await?;
    let ingestor = Ingestor::new(source.as_ref(), &store);

    let results = if channels.is_empty() {
        ingestor.sync_all_active(limit).await?
    } else {
        let mut results = Vec::with_capacity(channels.len());
        for name in channels {
            results.push(ingestor.sync_channel(name, limit).await);
        }
        results
    };

    print_json(&summarize(results))
}

pub(crate) async fn run_analyze(config: &AppConfig, ids: &[i64], limit: usize) -> anyhow::Result<()> {
    let llm = build_llm(config)?;
    let store = connect_store(config).await?;
    let analyzer = Analyzer::new(
        &llm,
        &store,
        Duration::from_secs(config.llm_generate_timeout_secs),
    );

    let selection = (!ids.is_empty()).then_some(ids);
    let run = analyzer.analyze_batch(selection, limit).await;
    print_json(&run)?;

    if let AnalysisRun::Error { error } = run {
        anyhow::bail!("analysis did not run: {error}");
    }
    Ok(())
}

pub(crate) async fn run_llm_status(config: &AppConfig) -> anyhow::Result<()> {
    let status = build_llm(config)?.status().await;
    print_json(&status)
}

pub(crate) async fn run_llm_pull(config: &AppConfig) -> anyhow::Result<()> {
    let llm = build_llm(config)?;
    let outcome = llm.pull_model(llm.model()).await;
    print_json(&outcome)?;

    if outcome.status == PullStatus::Error {
        anyhow::bail!("model pull failed: {}", outcome.message);
    }
    Ok(())
}

pub(crate) async fn run_test_connection(config: &AppConfig) -> anyhow::Result<()> {
    let source = mvpfinder_sources::build_source_client(config)?;
    let connected = source.test_connection().await;
    print_json(&serde_json::json!({
        "platform": source.platform(),
        "connected": connected,
    }))?;

    if !connected {
        anyhow::bail!("could not reach {}", source.platform());
    }
    Ok(())
}

pub(crate) async fn run_channel_add(
    config: &AppConfig,
    name: &str,
    active: bool,
) -> anyhow::Result<()> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("channel name must not be empty");
    }
    let store = connect_store(config).await?;
    let channel = store.upsert_channel(config.source, name, active).await?;
    tracing::info!(id = channel.id, platform = %channel.platform, name = %channel.name, "channel saved");
    print_json(&channel)
}

pub(crate) async fn run_db_migrate(config: &AppConfig) -> anyhow::Result<()> {
    let pool = mvpfinder_db::connect_pool_from_config(config)
        .await
        .context("failed to connect to the database")?;
    let applied = mvpfinder_db::run_migrations(&pool).await?;
    print_json(&serde_json::json!({ "applied": applied }))
}
