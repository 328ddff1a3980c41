mod commands;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "mvpfinder")]
#[command(about = "Ingest posts and products, then mine them for MVP ideas with a local LLM")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Pull new items from the configured source into the database
    Sync {
        /// Channel (subreddit or topic slug) to sync; repeatable. Defaults to every active channel
        #[arg(long = "channel")]
        channels: Vec<String>,
        /// Maximum items considered per channel
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        limit: Option<u32>,
    },
    /// Run stored items through the LLM
    Analyze {
        /// Item id to (re-)analyze; repeatable. Defaults to the oldest unanalyzed items
        #[arg(long = "id")]
        ids: Vec<i64>,
        /// Maximum unanalyzed items to pick when no ids are given
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        limit: Option<u32>,
    },
    /// Inspect or prepare the local LLM
    Llm {
        #[command(subcommand)]
        command: LlmCommands,
    },
    /// Perform one minimal read against the configured source
    TestConnection,
    /// Manage monitored channels
    Channel {
        #[command(subcommand)]
        command: ChannelCommands,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum LlmCommands {
    /// Report server and model readiness
    Status,
    /// Download the configured model
    Pull,
}

#[derive(Debug, Subcommand)]
enum ChannelCommands {
    /// Register a channel for the configured source, or update its active flag
    Add {
        name: String,
        #[arg(long)]
        inactive: bool,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = mvpfinder_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    // stdout carries the JSON summaries
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match command {
        Commands::Sync { channels, limit } => {
            let limit = limit.map_or(config.sync_default_limit, |l| l as usize);
            commands::run_sync(&config, &channels, limit).await
        }
        Commands::Analyze { ids, limit } => {
            let limit = limit.map_or(config.analyze_default_limit, |l| l as usize);
            commands::run_analyze(&config, &ids, limit).await
        }
        Commands::Llm {
            command: LlmCommands::Status,
        } => commands::run_llm_status(&config).await,
        Commands::Llm {
            command: LlmCommands::Pull,
        } => commands::run_llm_pull(&config).await,
        Commands::TestConnection => commands::run_test_connection(&config).await,
        Commands::Channel {
            command: ChannelCommands::Add { name, inactive },
        } => commands::run_channel_add(&config, &name, !inactive).await,
        Commands::Db {
            command: DbCommands::Migrate,
        } => commands::run_db_migrate(&config).await,
    }
}

#[cfg(test)]
mod tests;
