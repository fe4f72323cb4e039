//! Rolling-hour quota window management.
//!
//! Wraps the durable quota row with the window arithmetic: expiry checks,
//! reset-on-expiry, guarded increments, and the reset-time estimate shown
//! to the user when the limit is reached.

use ovation_core::error::OvationError;
use ovation_core::types::{QuotaSnapshot, QuotaSummary, Timestamp, WINDOW_DURATION_MS};
use ovation_store::QuotaRepository;

/// Quota window manager.
///
/// Accessors return copies of the stored state; callers never hold live
/// references that could alias across a mid-batch window reset.
#[derive(Clone)]
pub struct QuotaWindow {
    repo: QuotaRepository,
    limit: u32,
}

impl QuotaWindow {
    pub fn new(repo: QuotaRepository, limit: u32) -> Self {
        Self { repo, limit }
    }

    /// Maximum actions per window.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Current view of the window at `now`.
    pub fn state(&self, now: Timestamp) -> Result<QuotaSnapshot, OvationError> {
        let stored = self.repo.load(now)?;
        let expired = now.millis_since(stored.window_start) >= WINDOW_DURATION_MS;
        Ok(QuotaSnapshot {
            count: stored.count,
            remaining: self.limit.saturating_sub(stored.count),
            window_start: stored.window_start,
            expired,
        })
    }

    /// Reset the window if it has expired, returning the fresh snapshot and
    /// whether a reset happened. Must be called before quota is evaluated,
    /// so a stale count never blocks a legitimate new-window run.
    pub fn reset_if_expired(
        &self,
        now: Timestamp,
    ) -> Result<(QuotaSnapshot, bool), OvationError> {
        let snapshot = self.state(now)?;
        if !snapshot.expired {
            return Ok((snapshot, false));
        }
        self.repo.reset(now)?;
        Ok((self.state(now)?, true))
    }

    /// Record one completed action.
    ///
    /// Returns the new count, or `None` when the count is already at the
    /// limit (the increment is refused rather than exceeding it).
    pub fn record_action(&self, now: Timestamp) -> Result<Option<u32>, OvationError> {
        self.repo.increment(now, self.limit)
    }

    /// Estimated minutes until the window containing `window_start` resets.
    /// Zero once the window has expired.
    pub fn minutes_until_reset(now: Timestamp, window_start: Timestamp) -> i64 {
        let remaining_ms = window_start.0 + WINDOW_DURATION_MS - now.0;
        if remaining_ms <= 0 {
            0
        } else {
            (remaining_ms + 59_999) / 60_000
        }
    }

    /// Quota summary for display.
    pub fn summary(&self, now: Timestamp) -> Result<QuotaSummary, OvationError> {
        let snapshot = self.state(now)?;
        let minutes = if snapshot.expired {
            0
        } else {
            Self::minutes_until_reset(now, snapshot.window_start)
        };
        Ok(QuotaSummary {
            count: snapshot.count,
            remaining: if snapshot.expired {
                self.limit
            } else {
                snapshot.remaining
            },
            limit: self.limit,
            minutes_until_reset: minutes,
            window_start: snapshot.window_start,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ovation_store::Database;

    fn make_window(limit: u32) -> QuotaWindow {
        let db = Arc::new(Database::in_memory().unwrap());
        QuotaWindow::new(QuotaRepository::new(db), limit)
    }

    #[test]
    fn test_first_use_is_fully_eligible() {
        let window = make_window(100);
        let now = Timestamp(10_000_000_000);

        let snapshot = window.state(now).unwrap();
        assert_eq!(snapshot.remaining, 100);
        assert!(snapshot.expired);
    }

    #[test]
    fn test_count_monotonic_and_capped() {
        let window = make_window(3);
        let now = Timestamp(10_000_000_000);
        window.reset_if_expired(now).unwrap();

        let mut last = 0;
        for _ in 0..5 {
            if let Some(count) = window.record_action(now).unwrap() {
                assert!(count > last);
                last = count;
            }
        }
        assert_eq!(window.state(now).unwrap().count, 3);
        assert_eq!(window.record_action(now).unwrap(), None);
    }

    #[test]
    fn test_reset_if_expired_is_idempotent() {
        let window = make_window(100);
        let now = Timestamp(10_000_000_000);

        let (first, did_reset) = window.reset_if_expired(now).unwrap();
        assert!(did_reset);
        assert_eq!(first.count, 0);
        assert_eq!(first.window_start, now);

        // Second call in the fresh window is a no-op.
        let (second, did_reset) = window.reset_if_expired(now).unwrap();
        assert!(!did_reset);
        assert_eq!(second, first);
    }

    #[test]
    fn test_stale_count_cleared_on_expiry() {
        let window = make_window(100);
        let start = Timestamp(10_000_000_000);
        window.reset_if_expired(start).unwrap();
        for _ in 0..80 {
            window.record_action(start).unwrap();
        }

        // 3,700,000 ms later the window has expired; the stale 80 must not cap the batch.
        let later = Timestamp(start.0 + 3_700_000);
        let (snapshot, did_reset) = window.reset_if_expired(later).unwrap();
        assert!(did_reset);
        assert_eq!(snapshot.count, 0);
        assert_eq!(snapshot.remaining, 100);
    }

    #[test]
    fn test_not_expired_within_window() {
        let window = make_window(100);
        let start = Timestamp(10_000_000_000);
        window.reset_if_expired(start).unwrap();

        let snapshot = window
            .state(Timestamp(start.0 + WINDOW_DURATION_MS - 1))
            .unwrap();
        assert!(!snapshot.expired);

        let snapshot = window
            .state(Timestamp(start.0 + WINDOW_DURATION_MS))
            .unwrap();
        assert!(snapshot.expired);
    }

    #[test]
    fn test_minutes_until_reset_midway() {
        let start = Timestamp(10_000_000_000);
        let now = Timestamp(start.0 + 1_800_000);
        assert_eq!(QuotaWindow::minutes_until_reset(now, start), 30);
    }

    #[test]
    fn test_minutes_until_reset_rounds_up() {
        let start = Timestamp(10_000_000_000);
        // 30s into the window: 59.5 minutes left, reported as 60.
        let now = Timestamp(start.0 + 30_000);
        assert_eq!(QuotaWindow::minutes_until_reset(now, start), 60);
    }

    #[test]
    fn test_minutes_until_reset_clamps_to_zero() {
        let start = Timestamp(10_000_000_000);
        let now = Timestamp(start.0 + WINDOW_DURATION_MS + 5);
        assert_eq!(QuotaWindow::minutes_until_reset(now, start), 0);
    }

    #[test]
    fn test_summary_blocked_scenario() {
        let window = make_window(100);
        let start = Timestamp(10_000_000_000);
        window.reset_if_expired(start).unwrap();
        for _ in 0..100 {
            window.record_action(start).unwrap();
        }

        let now = Timestamp(start.0 + 1_800_000);
        let summary = window.summary(now).unwrap();
        assert_eq!(summary.count, 100);
        assert_eq!(summary.remaining, 0);
        assert_eq!(summary.limit, 100);
        assert_eq!(summary.minutes_until_reset, 30);
    }

    #[test]
    fn test_summary_with_expired_window_reports_full_limit() {
        let window = make_window(100);
        let start = Timestamp(10_000_000_000);
        window.reset_if_expired(start).unwrap();
        for _ in 0..40 {
            window.record_action(start).unwrap();
        }

        let later = Timestamp(start.0 + WINDOW_DURATION_MS + 1);
        let summary = window.summary(later).unwrap();
        assert_eq!(summary.remaining, 100);
        assert_eq!(summary.minutes_until_reset, 0);
    }
}
