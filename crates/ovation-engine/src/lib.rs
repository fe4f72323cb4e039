//! Kudos engine for Ovation.
//!
//! Enforces the rolling-hour quota window, discovers eligible feed
//! entries, and executes batches sequentially with randomized pacing.

pub mod discovery;
pub mod error;
pub mod executor;
pub mod pacing;
pub mod quota;
pub mod state;
pub mod watcher;

pub use discovery::{FeedDiscovery, KudoTarget, MemoryFeed};
pub use error::{EngineError, FeedError};
pub use executor::{BatchExecutor, BatchReport, BatchStatus, ExecutorOptions};
pub use pacing::{next_delay, PacingBand};
pub use quota::QuotaWindow;
pub use state::EngineState;
pub use watcher::FeedWatcher;
