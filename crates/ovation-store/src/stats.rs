//! Statistics persistence: daily counts and lifetime totals.
//!
//! Statistics are independent of the quota window. They are incremented
//! once per completed batch and only ever cleared on explicit user request.

use std::sync::Arc;

use rusqlite::OptionalExtension;

use ovation_core::error::OvationError;
use ovation_core::types::{day_key, week_start, StatisticsSummary, Timestamp};

use crate::db::Database;

/// Repository for daily and lifetime kudo statistics.
#[derive(Clone)]
pub struct StatsRepository {
    db: Arc<Database>,
}

impl StatsRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Record `count` completed kudos at `now`.
    ///
    /// Updates the day bucket, the all-time total, and the last-activity
    /// marker in one transaction.
    pub fn record(&self, now: Timestamp, count: u64) -> Result<(), OvationError> {
        let day = day_key(now);
        self.db.with_conn(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| OvationError::Storage(format!("Failed to begin tx: {}", e)))?;

            tx.execute(
                "INSERT INTO daily_stats (day, count) VALUES (?1, ?2)
                 ON CONFLICT(day) DO UPDATE SET count = count + excluded.count",
                rusqlite::params![day, count as i64],
            )
            .map_err(|e| OvationError::Storage(format!("Failed to update daily stats: {}", e)))?;

            tx.execute(
                "INSERT INTO stats_meta (id, all_time, last_activity) VALUES (1, ?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET
                     all_time = all_time + excluded.all_time,
                     last_activity = excluded.last_activity",
                rusqlite::params![count as i64, now.0],
            )
            .map_err(|e| OvationError::Storage(format!("Failed to update totals: {}", e)))?;

            tx.commit()
                .map_err(|e| OvationError::Storage(format!("Failed to commit stats: {}", e)))?;
            Ok(())
        })
    }

    /// Sum of day buckets from the current week's Sunday (UTC) forward.
    pub fn weekly_total(&self, now: Timestamp) -> Result<u64, OvationError> {
        let start = week_start(now).format("%Y-%m-%d").to_string();
        self.db.with_conn(|conn| {
            let total: i64 = conn
                .query_row(
                    "SELECT COALESCE(SUM(count), 0) FROM daily_stats WHERE day >= ?1",
                    rusqlite::params![start],
                    |row| row.get(0),
                )
                .map_err(|e| OvationError::Storage(format!("Failed to sum week: {}", e)))?;
            Ok(total as u64)
        })
    }

    /// Aggregate view: today, this week, all time, last activity.
    pub fn summary(&self, now: Timestamp) -> Result<StatisticsSummary, OvationError> {
        let today_key = day_key(now);
        let start = week_start(now).format("%Y-%m-%d").to_string();

        self.db.with_conn(|conn| {
            let today: i64 = conn
                .query_row(
                    "SELECT count FROM daily_stats WHERE day = ?1",
                    rusqlite::params![today_key],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| OvationError::Storage(format!("Failed to read today: {}", e)))?
                .unwrap_or(0);

            let this_week: i64 = conn
                .query_row(
                    "SELECT COALESCE(SUM(count), 0) FROM daily_stats WHERE day >= ?1",
                    rusqlite::params![start],
                    |row| row.get(0),
                )
                .map_err(|e| OvationError::Storage(format!("Failed to sum week: {}", e)))?;

            let meta = conn
                .query_row(
                    "SELECT all_time, last_activity FROM stats_meta WHERE id = 1",
                    [],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, Option<i64>>(1)?,
                        ))
                    },
                )
                .optional()
                .map_err(|e| OvationError::Storage(format!("Failed to read totals: {}", e)))?;

            let (all_time, last_activity) = meta.unwrap_or((0, None));

            Ok(StatisticsSummary {
                today: today as u64,
                this_week: this_week as u64,
                all_time: all_time as u64,
                last_activity: last_activity.map(Timestamp),
            })
        })
    }

    /// Clear all statistics. Explicit user request only.
    pub fn reset(&self) -> Result<(), OvationError> {
        self.db.with_conn(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| OvationError::Storage(format!("Failed to begin tx: {}", e)))?;

            tx.execute("DELETE FROM daily_stats", [])
                .map_err(|e| OvationError::Storage(format!("Failed to clear daily: {}", e)))?;
            tx.execute(
                "INSERT INTO stats_meta (id, all_time, last_activity) VALUES (1, 0, NULL)
                 ON CONFLICT(id) DO UPDATE SET all_time = 0, last_activity = NULL",
                [],
            )
            .map_err(|e| OvationError::Storage(format!("Failed to clear totals: {}", e)))?;

            tx.commit()
                .map_err(|e| OvationError::Storage(format!("Failed to commit reset: {}", e)))?;
            Ok(())
        })
    }
}
