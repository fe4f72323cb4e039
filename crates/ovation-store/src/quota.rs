//! Persistence for the rolling quota window.
//!
//! The window is a single row. All mutations are single SQL statements
//! executed under the database mutex, so read-modify-write updates are
//! strictly ordered even when triggers fire concurrently.

use std::sync::Arc;

use rusqlite::OptionalExtension;

use ovation_core::error::OvationError;
use ovation_core::types::{QuotaState, Timestamp};

use crate::db::Database;

/// Repository for the durable quota window row.
#[derive(Clone)]
pub struct QuotaRepository {
    db: Arc<Database>,
}

impl QuotaRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Load the stored window state.
    ///
    /// With no stored row, returns the pre-expired default so a first-time
    /// user is immediately eligible. Nothing is written until the first
    /// reset or increment.
    pub fn load(&self, now: Timestamp) -> Result<QuotaState, OvationError> {
        self.db.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT count, window_start FROM quota_window WHERE id = 1",
                    [],
                    |row| {
                        Ok(QuotaState {
                            count: row.get::<_, i64>(0)? as u32,
                            window_start: Timestamp(row.get(1)?),
                        })
                    },
                )
                .optional()
                .map_err(|e| OvationError::Storage(format!("Failed to load quota: {}", e)))?;

            Ok(row.unwrap_or_else(|| QuotaState::pre_expired(now)))
        })
    }

    /// Reset the window: `count = 0`, `window_start = now`.
    pub fn reset(&self, now: Timestamp) -> Result<(), OvationError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO quota_window (id, count, window_start) VALUES (1, 0, ?1)
                 ON CONFLICT(id) DO UPDATE SET count = 0, window_start = excluded.window_start",
                rusqlite::params![now.0],
            )
            .map_err(|e| OvationError::Storage(format!("Failed to reset quota: {}", e)))?;
            Ok(())
        })
    }

    /// Atomically increment the window count, guarded by `limit`.
    ///
    /// Returns the new count, or `None` when the count is already at the
    /// limit (the row is left untouched). A missing row is created first
    /// with a pre-expired window start.
    pub fn increment(
        &self,
        now: Timestamp,
        limit: u32,
    ) -> Result<Option<u32>, OvationError> {
        self.db.with_conn(|conn| {
            let default = QuotaState::pre_expired(now);
            conn.execute(
                "INSERT OR IGNORE INTO quota_window (id, count, window_start) VALUES (1, 0, ?1)",
                rusqlite::params![default.window_start.0],
            )
            .map_err(|e| OvationError::Storage(format!("Failed to seed quota row: {}", e)))?;

            let changed = conn
                .execute(
                    "UPDATE quota_window SET count = count + 1 WHERE id = 1 AND count < ?1",
                    rusqlite::params![limit as i64],
                )
                .map_err(|e| OvationError::Storage(format!("Failed to increment quota: {}", e)))?;

            if changed == 0 {
                return Ok(None);
            }

            let count: i64 = conn
                .query_row("SELECT count FROM quota_window WHERE id = 1", [], |row| {
                    row.get(0)
                })
                .map_err(|e| OvationError::Storage(format!("Failed to read quota: {}", e)))?;

            Ok(Some(count as u32))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ovation_core::types::WINDOW_DURATION_MS;

    fn make_repo() -> QuotaRepository {
        QuotaRepository::new(Arc::new(Database::in_memory().unwrap()))
    }

    #[test]
    fn test_load_without_row_is_pre_expired() {
        let repo = make_repo();
        let now = Timestamp(10_000_000_000);
        let state = repo.load(now).unwrap();
        assert_eq!(state.count, 0);
        assert_eq!(now.millis_since(state.window_start), WINDOW_DURATION_MS);
    }

    #[test]
    fn test_reset_then_load() {
        let repo = make_repo();
        let now = Timestamp(10_000_000_000);
        repo.reset(now).unwrap();

        let state = repo.load(now).unwrap();
        assert_eq!(state.count, 0);
        assert_eq!(state.window_start, now);
    }

    #[test]
    fn test_increment_counts_up() {
        let repo = make_repo();
        let now = Timestamp(10_000_000_000);
        repo.reset(now).unwrap();

        assert_eq!(repo.increment(now, 100).unwrap(), Some(1));
        assert_eq!(repo.increment(now, 100).unwrap(), Some(2));
        assert_eq!(repo.load(now).unwrap().count, 2);
    }

    #[test]
    fn test_increment_stops_at_limit() {
        let repo = make_repo();
        let now = Timestamp(10_000_000_000);
        repo.reset(now).unwrap();

        for i in 1..=3u32 {
            assert_eq!(repo.increment(now, 3).unwrap(), Some(i));
        }
        // At the limit: no further increments.
        assert_eq!(repo.increment(now, 3).unwrap(), None);
        assert_eq!(repo.load(now).unwrap().count, 3);
    }

    #[test]
    fn test_increment_without_reset_seeds_row() {
        let repo = make_repo();
        let now = Timestamp(10_000_000_000);

        assert_eq!(repo.increment(now, 100).unwrap(), Some(1));
        let state = repo.load(now).unwrap();
        assert_eq!(state.count, 1);
        // Seeded row carries the pre-expired window start.
        assert_eq!(now.millis_since(state.window_start), WINDOW_DURATION_MS);
    }

    #[test]
    fn test_reset_clears_count() {
        let repo = make_repo();
        let start = Timestamp(10_000_000_000);
        repo.reset(start).unwrap();
        repo.increment(start, 100).unwrap();
        repo.increment(start, 100).unwrap();

        let later = Timestamp(start.0 + WINDOW_DURATION_MS + 1);
        repo.reset(later).unwrap();

        let state = repo.load(later).unwrap();
        assert_eq!(state.count, 0);
        assert_eq!(state.window_start, later);
    }
}
