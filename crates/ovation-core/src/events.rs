use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Timestamp;

/// Domain events emitted by the kudos engine.
///
/// Events are broadcast after state changes and consumed by:
/// - The SSE stream (for live progress display)
/// - Log output (via the engine's tracing calls)
#[derive(Clone, Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub enum EngineEvent {
    /// A batch run started with `total` targets selected.
    BatchStarted {
        batch_id: Uuid,
        total: u32,
        timestamp: Timestamp,
    },

    /// One kudo was given and persisted; `completed` of `total` so far.
    KudoGiven {
        batch_id: Uuid,
        target_id: String,
        completed: u32,
        total: u32,
        timestamp: Timestamp,
    },

    /// One target could not be acted upon and was skipped.
    KudoSkipped {
        batch_id: Uuid,
        target_id: String,
        reason: String,
        timestamp: Timestamp,
    },

    /// The hourly limit is reached; no batch was started.
    LimitReached {
        limit: u32,
        minutes_until_reset: i64,
        timestamp: Timestamp,
    },

    /// The quota window expired and was reset.
    WindowReset { timestamp: Timestamp },

    /// Discovery returned no eligible targets.
    NothingToDo { timestamp: Timestamp },

    /// A batch finished (possibly with skipped targets).
    BatchCompleted {
        batch_id: Uuid,
        completed: u32,
        attempted: u32,
        skipped: u32,
        timestamp: Timestamp,
    },

    /// The number of eligible feed targets changed.
    EligibilityChanged { eligible: u64, timestamp: Timestamp },

    /// Pacing settings were updated.
    SettingsUpdated { timestamp: Timestamp },

    /// Statistics were explicitly reset by the user.
    StatisticsReset { timestamp: Timestamp },
}

impl EngineEvent {
    /// Returns the timestamp of the event.
    pub fn timestamp(&self) -> Timestamp {
        match self {
            EngineEvent::BatchStarted { timestamp, .. }
            | EngineEvent::KudoGiven { timestamp, .. }
            | EngineEvent::KudoSkipped { timestamp, .. }
            | EngineEvent::LimitReached { timestamp, .. }
            | EngineEvent::WindowReset { timestamp }
            | EngineEvent::NothingToDo { timestamp }
            | EngineEvent::BatchCompleted { timestamp, .. }
            | EngineEvent::EligibilityChanged { timestamp, .. }
            | EngineEvent::SettingsUpdated { timestamp }
            | EngineEvent::StatisticsReset { timestamp } => *timestamp,
        }
    }

    /// Returns a stable event name for logging and SSE.
    pub fn event_name(&self) -> &'static str {
        match self {
            EngineEvent::BatchStarted { .. } => "batch_started",
            EngineEvent::KudoGiven { .. } => "kudo_given",
            EngineEvent::KudoSkipped { .. } => "kudo_skipped",
            EngineEvent::LimitReached { .. } => "limit_reached",
            EngineEvent::WindowReset { .. } => "window_reset",
            EngineEvent::NothingToDo { .. } => "nothing_to_do",
            EngineEvent::BatchCompleted { .. } => "batch_completed",
            EngineEvent::EligibilityChanged { .. } => "eligibility_changed",
            EngineEvent::SettingsUpdated { .. } => "settings_updated",
            EngineEvent::StatisticsReset { .. } => "statistics_reset",
        }
    }
}
