mod api;
mod middleware;

use std::sync::Arc;
use std::time::Duration;

use mvpfinder_core::ItemStore;
use mvpfinder_pipeline::JobService;
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState, DefaultLimits};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = mvpfinder_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(env = %config.env, source = %config.source, "starting mvpfinder-server");

    let pool = mvpfinder_db::connect_pool_from_config(&config).await?;
    let applied = mvpfinder_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let source = mvpfinder_sources::build_source_client(&config)?;
    let llm = Arc::new(mvpfinder_llm::OllamaClient::from_app_config(&config)?);
    let store: Arc<dyn ItemStore> = Arc::new(mvpfinder_db::PgItemStore::new(pool.clone()));
    let jobs = JobService::new(
        source,
        llm,
        store,
        Duration::from_secs(config.llm_generate_timeout_secs),
    );

    let app = build_app(AppState {
        jobs,
        pool: Some(pool),
        limits: DefaultLimits {
            sync: config.sync_default_limit,
            analyze: config.analyze_default_limit,
        },
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
