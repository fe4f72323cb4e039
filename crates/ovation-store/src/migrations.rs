//! Database schema migrations.
//!
//! Applies the initial schema: quota window, settings, and statistics
//! tables, plus the schema_migrations tracking table.

use rusqlite::Connection;
use tracing::info;

use ovation_core::error::OvationError;

/// Run all pending database migrations.
///
/// Currently implements the initial schema (version 1). Future migrations
/// can be added by checking the current version and applying incremental changes.
pub fn run_migrations(conn: &Connection) -> Result<(), OvationError> {
    // Create the migrations tracking table first.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| OvationError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| OvationError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<(), OvationError> {
    conn.execute_batch(
        "
        -- Rolling quota window. Single row, created lazily on first write.
        CREATE TABLE IF NOT EXISTS quota_window (
            id            INTEGER PRIMARY KEY NOT NULL CHECK (id = 1),
            count         INTEGER NOT NULL DEFAULT 0 CHECK (count >= 0),
            window_start  INTEGER NOT NULL
        );

        -- User-editable pacing settings. Single row, created lazily.
        CREATE TABLE IF NOT EXISTS settings (
            id                   INTEGER PRIMARY KEY NOT NULL CHECK (id = 1),
            min_delay_ms         INTEGER NOT NULL DEFAULT 1000 CHECK (min_delay_ms > 0),
            show_debug_controls  INTEGER NOT NULL DEFAULT 0
        );

        -- Per-day completed-kudo counts, keyed by UTC calendar day.
        CREATE TABLE IF NOT EXISTS daily_stats (
            day    TEXT PRIMARY KEY NOT NULL,
            count  INTEGER NOT NULL DEFAULT 0 CHECK (count >= 0)
        );

        -- Lifetime totals. Single row, created lazily.
        CREATE TABLE IF NOT EXISTS stats_meta (
            id             INTEGER PRIMARY KEY NOT NULL CHECK (id = 1),
            all_time       INTEGER NOT NULL DEFAULT 0 CHECK (all_time >= 0),
            last_activity  INTEGER
        );

        INSERT INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| OvationError::Storage(format!("Migration v1 failed: {}", e)))?;

    Ok(())
}
