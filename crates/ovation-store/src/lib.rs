//! Ovation storage crate - SQLite persistence for quota, settings, stats.
//!
//! Provides a WAL-mode SQLite database with migrations and repository
//! implementations for the quota window, pacing settings, and statistics.

pub mod db;
pub mod migrations;
pub mod quota;
pub mod settings;
pub mod stats;

pub use db::Database;
pub use quota::QuotaRepository;
pub use settings::SettingsRepository;
pub use stats::StatsRepository;
