//! Ovation application binary - composition root.
//!
//! Ties together the Ovation crates into a single executable:
//! 1. Load configuration from TOML
//! 2. Open the SQLite store and build the repositories
//! 3. Wire the quota window, demo feed, and batch executor
//! 4. Start the feed watcher background task
//! 5. Start the axum REST API server (or run one batch with --once)
//!
//! The demo feed stands in for the host-page discovery collaborator; real
//! deployments plug their own `FeedDiscovery` implementation in here.

mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use ovation_api::{start_server, AppState};
use ovation_core::config::OvationConfig;
use ovation_engine::{
    BatchExecutor, ExecutorOptions, FeedDiscovery, FeedWatcher, MemoryFeed, QuotaWindow,
};
use ovation_store::{Database, QuotaRepository, SettingsRepository, StatsRepository};

use cli::CliArgs;

/// Expand ~ to home directory in a path string.
fn resolve_data_dir(data_dir: &str) -> PathBuf {
    if let Some(stripped) = data_dir.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(stripped)
    } else {
        PathBuf::from(data_dir)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config is loaded before tracing is initialized so the configured log
    // level can seed the filter; load failures fall back to defaults.
    let config_file = args.resolve_config_path();
    let config = OvationConfig::load_or_default(&config_file);

    let log_level = args
        .resolve_log_level()
        .unwrap_or_else(|| config.general.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    tracing::info!("Starting Ovation v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Storage.
    let data_dir = args
        .resolve_data_dir()
        .map(|d| PathBuf::from(&d))
        .unwrap_or_else(|| resolve_data_dir(&config.general.data_dir));

    let db_path = data_dir.join("ovation.db");
    let db = Arc::new(Database::new(&db_path)?);
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    // Repositories and engine wiring.
    let quota = QuotaWindow::new(
        QuotaRepository::new(Arc::clone(&db)),
        config.quota.hourly_limit,
    );
    let settings = SettingsRepository::new(Arc::clone(&db));
    let stats = StatsRepository::new(Arc::clone(&db));

    let feed = Arc::new(MemoryFeed::new());
    let (event_tx, _) = tokio::sync::broadcast::channel(256);

    let executor = Arc::new(BatchExecutor::new(
        Arc::clone(&feed) as Arc<dyn FeedDiscovery>,
        quota,
        settings.clone(),
        stats.clone(),
        event_tx.clone(),
        ExecutorOptions {
            drain_done_ms: config.engine.drain_done_ms,
            drain_empty_ms: config.engine.drain_empty_ms,
        },
    ));
    tracing::info!(
        hourly_limit = config.quota.hourly_limit,
        "Batch executor ready"
    );

    if args.once {
        let report = executor.run_batch().await;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    // Feed watcher: refreshes the eligibility count when content changes.
    let watcher = Arc::new(FeedWatcher::new(
        Arc::clone(&feed) as Arc<dyn FeedDiscovery>,
        feed.changed(),
        event_tx.clone(),
    ));
    let watcher_task = Arc::clone(&watcher);
    tokio::spawn(async move {
        watcher_task.run().await;
    });

    // API server.
    let port = args.resolve_port(config.general.port);
    let state = AppState::new(config, executor, settings, stats, event_tx)
        .with_memory_feed(Arc::clone(&feed));

    start_server(port, state).await?;

    Ok(())
}
