//! Application state shared across all route handlers.
//!
//! AppState holds references to the engine and repositories. It is passed
//! to handlers via axum's State extractor.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use ovation_core::config::OvationConfig;
use ovation_core::events::EngineEvent;
use ovation_engine::{BatchExecutor, MemoryFeed};
use ovation_store::{SettingsRepository, StatsRepository};

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Mutex<OvationConfig>>,
    /// The batch executor.
    pub executor: Arc<BatchExecutor>,
    /// Pacing settings repository.
    pub settings: SettingsRepository,
    /// Statistics repository.
    pub stats: StatsRepository,
    /// The demo feed, when the server was wired with one. Debug-only
    /// endpoints require it.
    pub memory_feed: Option<Arc<MemoryFeed>>,
    /// Broadcast sender for SSE events.
    pub event_tx: tokio::sync::broadcast::Sender<EngineEvent>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState with the given components.
    pub fn new(
        config: OvationConfig,
        executor: Arc<BatchExecutor>,
        settings: SettingsRepository,
        stats: StatsRepository,
        event_tx: tokio::sync::broadcast::Sender<EngineEvent>,
    ) -> Self {
        Self {
            config: Arc::new(Mutex::new(config)),
            executor,
            settings,
            stats,
            memory_feed: None,
            event_tx,
            start_time: Instant::now(),
        }
    }

    /// Attach the demo feed, enabling the debug endpoints.
    pub fn with_memory_feed(mut self, feed: Arc<MemoryFeed>) -> Self {
        self.memory_feed = Some(feed);
        self
    }
}
