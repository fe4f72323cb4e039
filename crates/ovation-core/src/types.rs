use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Time
// =============================================================================

/// Milliseconds in one quota window (one rolling hour).
pub const WINDOW_DURATION_MS: i64 = 3_600_000;

/// Epoch-millisecond timestamp.
///
/// The quota window math is millisecond-based, so the canonical
/// representation is `i64` epoch milliseconds rather than `DateTime`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// The current wall-clock time.
    pub fn now() -> Self {
        Timestamp(Utc::now().timestamp_millis())
    }

    /// Convert to a `DateTime<Utc>`. Out-of-range values clamp to the epoch.
    pub fn to_datetime(self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Milliseconds elapsed since `earlier`. Negative if `earlier` is in the future.
    pub fn millis_since(self, earlier: Timestamp) -> i64 {
        self.0 - earlier.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp(dt.timestamp_millis())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// UTC calendar-day key for a timestamp, e.g. `2026-08-07`.
///
/// Daily statistics are bucketed by this key.
pub fn day_key(ts: Timestamp) -> String {
    ts.to_datetime().format("%Y-%m-%d").to_string()
}

/// The Sunday that starts the UTC calendar week containing `ts`.
pub fn week_start(ts: Timestamp) -> NaiveDate {
    let date = ts.to_datetime().date_naive();
    let offset = date.weekday().num_days_from_sunday() as i64;
    date - chrono::Duration::days(offset)
}

// =============================================================================
// Quota
// =============================================================================

/// Durable state of the rolling quota window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaState {
    /// Actions recorded in the current window.
    pub count: u32,
    /// When the current window started.
    pub window_start: Timestamp,
}

impl QuotaState {
    /// Default state when nothing has been persisted yet.
    ///
    /// The window starts one full duration in the past, so a first-time
    /// user is immediately eligible rather than blocked by a phantom window.
    pub fn pre_expired(now: Timestamp) -> Self {
        QuotaState {
            count: 0,
            window_start: Timestamp(now.0 - WINDOW_DURATION_MS),
        }
    }
}

/// Point-in-time view of the quota window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaSnapshot {
    pub count: u32,
    /// Actions left before the limit. Only meaningful while not expired.
    pub remaining: u32,
    pub window_start: Timestamp,
    /// Whether a full window duration has elapsed since `window_start`.
    pub expired: bool,
}

/// Quota summary exposed to callers and the UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaSummary {
    pub count: u32,
    pub remaining: u32,
    pub limit: u32,
    /// Estimated minutes until the window resets. Zero when already expired.
    pub minutes_until_reset: i64,
    pub window_start: Timestamp,
}

// =============================================================================
// Settings
// =============================================================================

/// User-configurable pacing settings, persisted in the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KudoSettings {
    /// Base delay between actions in milliseconds. Strictly positive.
    pub min_delay_ms: u64,
    /// Expose the debug endpoints (seed feed, preview limit notice).
    pub show_debug_controls: bool,
}

impl Default for KudoSettings {
    fn default() -> Self {
        KudoSettings {
            min_delay_ms: 1000,
            show_debug_controls: false,
        }
    }
}

/// Partial settings update. `None` fields are left unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsPatch {
    pub min_delay_ms: Option<u64>,
    pub show_debug_controls: Option<bool>,
}

impl KudoSettings {
    /// Apply a partial update, returning the merged settings.
    pub fn merged(self, patch: SettingsPatch) -> Self {
        KudoSettings {
            min_delay_ms: patch.min_delay_ms.unwrap_or(self.min_delay_ms),
            show_debug_controls: patch
                .show_debug_controls
                .unwrap_or(self.show_debug_controls),
        }
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Aggregated statistics exposed to callers and the UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsSummary {
    /// Kudos given today (UTC calendar day).
    pub today: u64,
    /// Kudos given since the most recent Sunday (UTC).
    pub this_week: u64,
    /// Kudos given since the last explicit statistics reset.
    pub all_time: u64,
    /// When the last batch completed, if any.
    pub last_activity: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_ordering() {
        assert!(Timestamp(1) < Timestamp(2));
        assert_eq!(Timestamp(5).millis_since(Timestamp(2)), 3);
        assert_eq!(Timestamp(2).millis_since(Timestamp(5)), -3);
    }

    #[test]
    fn test_timestamp_datetime_round_trip() {
        let now = Utc::now();
        let ts = Timestamp::from(now);
        assert_eq!(ts.to_datetime().timestamp_millis(), now.timestamp_millis());
    }

    #[test]
    fn test_day_key_format() {
        // 2026-08-07T12:00:00Z
        let ts = Timestamp(1_786_104_000_000);
        assert_eq!(day_key(ts), "2026-08-07");
    }

    #[test]
    fn test_day_key_epoch() {
        assert_eq!(day_key(Timestamp(0)), "1970-01-01");
    }

    #[test]
    fn test_week_start_is_sunday() {
        // 2026-08-07 is a Friday; the preceding Sunday is 2026-08-02.
        let ts = Timestamp(1_786_104_000_000);
        assert_eq!(
            week_start(ts),
            NaiveDate::from_ymd_opt(2026, 8, 2).unwrap()
        );
    }

    #[test]
    fn test_week_start_on_sunday_is_identity() {
        // 2026-08-02T08:00:00Z is a Sunday.
        let sunday = NaiveDate::from_ymd_opt(2026, 8, 2).unwrap();
        let ts = Timestamp::from(
            sunday
                .and_hms_opt(8, 0, 0)
                .unwrap()
                .and_utc(),
        );
        assert_eq!(week_start(ts), sunday);
    }

    #[test]
    fn test_quota_state_pre_expired() {
        let now = Timestamp(10_000_000);
        let state = QuotaState::pre_expired(now);
        assert_eq!(state.count, 0);
        assert_eq!(now.millis_since(state.window_start), WINDOW_DURATION_MS);
    }

    #[test]
    fn test_settings_defaults() {
        let settings = KudoSettings::default();
        assert_eq!(settings.min_delay_ms, 1000);
        assert!(!settings.show_debug_controls);
    }

    #[test]
    fn test_settings_merge_partial() {
        let settings = KudoSettings::default();
        let merged = settings.merged(SettingsPatch {
            min_delay_ms: Some(2500),
            show_debug_controls: None,
        });
        assert_eq!(merged.min_delay_ms, 2500);
        assert!(!merged.show_debug_controls);
    }

    #[test]
    fn test_settings_merge_empty_patch_is_identity() {
        let settings = KudoSettings {
            min_delay_ms: 750,
            show_debug_controls: true,
        };
        assert_eq!(settings.merged(SettingsPatch::default()), settings);
    }

    #[test]
    fn test_quota_snapshot_serialization() {
        let snapshot = QuotaSnapshot {
            count: 95,
            remaining: 5,
            window_start: Timestamp(1000),
            expired: false,
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: QuotaSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_kudo_settings_deserialize_missing_fields() {
        let settings: KudoSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, KudoSettings::default());
    }
}
