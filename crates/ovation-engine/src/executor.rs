//! Quota-gated sequential batch executor.
//!
//! One invocation: check the window (resetting it if expired), cap the
//! batch to the remaining quota, then act on each target strictly in
//! order (apply, persist, pace), so an interruption at any point leaves
//! correct partial-progress state behind. Statistics are recorded once per
//! batch; progress is broadcast as engine events.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use ovation_core::error::OvationError;
use ovation_core::events::EngineEvent;
use ovation_core::types::{QuotaSummary, Timestamp};
use ovation_store::{SettingsRepository, StatsRepository};

use crate::discovery::FeedDiscovery;
use crate::pacing;
use crate::quota::QuotaWindow;
use crate::state::{validate_transition, EngineState};

/// Terminal status of one `run_batch` invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// The batch ran to the end (possibly with skipped targets).
    Done,
    /// The hourly limit was already reached; nothing was attempted.
    Blocked,
    /// Discovery returned no eligible targets.
    Empty,
    /// The invocation aborted (discovery or storage failure).
    Failed,
    /// Another batch was already in flight.
    Busy,
}

/// Result of one `run_batch` invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub status: BatchStatus,
    /// Kudos applied and persisted.
    pub completed: u32,
    /// Targets selected for this batch.
    pub attempted: u32,
    /// Targets that failed to apply and were skipped.
    pub skipped: u32,
    /// Quota remaining after the batch.
    pub remaining: u32,
    /// Set when blocked: estimated minutes until the window resets.
    pub minutes_until_reset: Option<i64>,
    pub detail: String,
}

impl BatchReport {
    fn new(batch_id: Uuid, status: BatchStatus, detail: impl Into<String>) -> Self {
        Self {
            batch_id,
            status,
            completed: 0,
            attempted: 0,
            skipped: 0,
            remaining: 0,
            minutes_until_reset: None,
            detail: detail.into(),
        }
    }
}

/// Executor tuning knobs.
#[derive(Clone, Copy, Debug)]
pub struct ExecutorOptions {
    /// Cool-down display interval after a completed batch, in milliseconds.
    pub drain_done_ms: u64,
    /// Cool-down display interval after an empty batch, in milliseconds.
    pub drain_empty_ms: u64,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            drain_done_ms: 3000,
            drain_empty_ms: 2000,
        }
    }
}

/// The sequential batch executor.
///
/// Strictly single-flight: a `try_lock` run guard turns concurrent
/// triggers into `Busy` reports instead of racing the quota. Within a
/// batch there is exactly one action in flight at a time; action N+1
/// never begins before action N's persistence has completed.
pub struct BatchExecutor {
    feed: Arc<dyn FeedDiscovery>,
    quota: QuotaWindow,
    settings: SettingsRepository,
    stats: StatsRepository,
    event_tx: broadcast::Sender<EngineEvent>,
    state: Mutex<EngineState>,
    run_guard: tokio::sync::Mutex<()>,
    options: ExecutorOptions,
}

impl BatchExecutor {
    pub fn new(
        feed: Arc<dyn FeedDiscovery>,
        quota: QuotaWindow,
        settings: SettingsRepository,
        stats: StatsRepository,
        event_tx: broadcast::Sender<EngineEvent>,
        options: ExecutorOptions,
    ) -> Self {
        Self {
            feed,
            quota,
            settings,
            stats,
            event_tx,
            state: Mutex::new(EngineState::Idle),
            run_guard: tokio::sync::Mutex::new(()),
            options,
        }
    }

    /// Current executor state.
    pub fn state(&self) -> EngineState {
        *self.state.lock().expect("state lock poisoned")
    }

    /// Quota summary at `now`.
    pub fn quota_summary(&self, now: Timestamp) -> Result<QuotaSummary, OvationError> {
        self.quota.summary(now)
    }

    /// Number of currently eligible feed targets.
    pub async fn eligible_count(&self) -> Result<u64, OvationError> {
        let targets = self.feed.list_eligible().await?;
        Ok(targets.len() as u64)
    }

    /// Run one batch. Every outcome is a report; nothing panics or
    /// propagates past this boundary.
    pub async fn run_batch(&self) -> BatchReport {
        let batch_id = Uuid::new_v4();
        let _guard = match self.run_guard.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!(%batch_id, "Batch trigger ignored; another batch is in flight");
                return BatchReport::new(batch_id, BatchStatus::Busy, "A batch is already running");
            }
        };
        self.run_inner(batch_id).await
    }

    async fn run_inner(&self, batch_id: Uuid) -> BatchReport {
        let now = Timestamp::now();
        self.set_state(EngineState::Checking);

        // Window check. A stale count must never block a new-window run.
        let snapshot = match self.quota.reset_if_expired(now) {
            Ok((snapshot, did_reset)) => {
                if did_reset {
                    info!(%batch_id, "Quota window expired; counter reset");
                    self.emit(EngineEvent::WindowReset { timestamp: now });
                }
                snapshot
            }
            Err(e) => return self.abort(batch_id, &e),
        };

        if snapshot.remaining == 0 {
            let minutes = QuotaWindow::minutes_until_reset(now, snapshot.window_start);
            info!(
                %batch_id,
                limit = self.quota.limit(),
                minutes_until_reset = minutes,
                "Hourly kudos limit reached"
            );
            self.emit(EngineEvent::LimitReached {
                limit: self.quota.limit(),
                minutes_until_reset: minutes,
                timestamp: now,
            });
            self.set_state(EngineState::Blocked);
            self.set_state(EngineState::Idle);
            let mut report = BatchReport::new(
                batch_id,
                BatchStatus::Blocked,
                format!(
                    "Hourly kudos limit ({}) reached. Try again in about {} minutes.",
                    self.quota.limit(),
                    minutes
                ),
            );
            report.minutes_until_reset = Some(minutes);
            return report;
        }

        // Discovery, capped to the remaining quota. Order preserved.
        let discovered = match self.feed.list_eligible().await {
            Ok(targets) => targets,
            Err(e) => {
                let err = OvationError::from(e);
                return self.abort(batch_id, &err);
            }
        };
        let batch: Vec<_> = discovered
            .into_iter()
            .take(snapshot.remaining as usize)
            .collect();

        if batch.is_empty() {
            info!(%batch_id, "No new kudos to give");
            self.emit(EngineEvent::NothingToDo { timestamp: now });
            self.set_state(EngineState::Draining);
            tokio::time::sleep(std::time::Duration::from_millis(self.options.drain_empty_ms))
                .await;
            self.finish_idle().await;
            let mut report = BatchReport::new(batch_id, BatchStatus::Empty, "No new kudos");
            report.remaining = snapshot.remaining;
            return report;
        }

        let total = batch.len() as u32;
        self.set_state(EngineState::Running);
        self.emit(EngineEvent::BatchStarted {
            batch_id,
            total,
            timestamp: now,
        });
        info!(%batch_id, total, remaining = snapshot.remaining, "Batch started");

        let mut completed: u32 = 0;
        let mut skipped: u32 = 0;
        let mut remaining_now = snapshot.remaining;

        for (index, target) in batch.iter().enumerate() {
            // The batch was capped up front; this guards the window being
            // consumed underneath us anyway.
            if remaining_now == 0 {
                warn!(%batch_id, "Quota exhausted mid-batch; stopping early");
                break;
            }

            match self.feed.apply(target).await {
                Ok(()) => {
                    let ts = Timestamp::now();
                    match self.quota.record_action(ts) {
                        Ok(Some(count)) => {
                            completed += 1;
                            remaining_now = self.quota.limit().saturating_sub(count);
                            debug!(
                                %batch_id,
                                target = %target.id,
                                completed,
                                total,
                                "Kudo given"
                            );
                            self.emit(EngineEvent::KudoGiven {
                                batch_id,
                                target_id: target.id.clone(),
                                completed,
                                total,
                                timestamp: ts,
                            });
                        }
                        Ok(None) => {
                            warn!(%batch_id, "Limit hit while recording; stopping early");
                            remaining_now = 0;
                        }
                        Err(e) => {
                            // Never guess a count: the action landed but was
                            // not recorded, so stop rather than drift.
                            error!(%batch_id, error = %e, "Failed to persist action count");
                            self.record_stats(batch_id, completed);
                            return self.abort_with_progress(
                                batch_id, &e, completed, total, skipped,
                            );
                        }
                    }
                }
                Err(e) => {
                    skipped += 1;
                    warn!(
                        %batch_id,
                        target = %target.id,
                        error = %e,
                        "Kudo failed to apply; skipping"
                    );
                    self.emit(EngineEvent::KudoSkipped {
                        batch_id,
                        target_id: target.id.clone(),
                        reason: e.to_string(),
                        timestamp: Timestamp::now(),
                    });
                }
            }

            // Pace before the next action; nothing to pace after the last.
            if index + 1 < batch.len() && remaining_now > 0 {
                let base = match self.settings.load() {
                    Ok(settings) => settings.min_delay_ms,
                    Err(e) => {
                        error!(%batch_id, error = %e, "Failed to read pacing settings");
                        self.record_stats(batch_id, completed);
                        return self.abort_with_progress(batch_id, &e, completed, total, skipped);
                    }
                };
                let delay = pacing::next_delay(base, &mut rand::rng());
                tokio::time::sleep(delay).await;
            }
        }

        if completed > 0 {
            if let Err(e) = self.stats.record(Timestamp::now(), completed as u64) {
                error!(%batch_id, error = %e, "Failed to record statistics");
                return self.abort_with_progress(batch_id, &e, completed, total, skipped);
            }
        }

        self.emit(EngineEvent::BatchCompleted {
            batch_id,
            completed,
            attempted: total,
            skipped,
            timestamp: Timestamp::now(),
        });
        info!(%batch_id, completed, attempted = total, skipped, "Batch completed");

        self.set_state(EngineState::Draining);
        tokio::time::sleep(std::time::Duration::from_millis(self.options.drain_done_ms)).await;
        self.finish_idle().await;

        let mut report = BatchReport::new(
            batch_id,
            BatchStatus::Done,
            format!("Kudoed {} activities", completed),
        );
        report.completed = completed;
        report.attempted = total;
        report.skipped = skipped;
        report.remaining = remaining_now;
        report
    }

    /// Record statistics on an abort path; the batch already failed, so a
    /// second storage error is only logged.
    fn record_stats(&self, batch_id: Uuid, completed: u32) {
        if completed == 0 {
            return;
        }
        if let Err(e) = self.stats.record(Timestamp::now(), completed as u64) {
            warn!(%batch_id, error = %e, "Statistics not recorded for aborted batch");
        }
    }

    fn abort(&self, batch_id: Uuid, err: &OvationError) -> BatchReport {
        error!(%batch_id, error = %err, "Batch aborted");
        self.set_state(EngineState::Idle);
        BatchReport::new(batch_id, BatchStatus::Failed, err.to_string())
    }

    fn abort_with_progress(
        &self,
        batch_id: Uuid,
        err: &OvationError,
        completed: u32,
        attempted: u32,
        skipped: u32,
    ) -> BatchReport {
        let mut report = self.abort(batch_id, err);
        report.completed = completed;
        report.attempted = attempted;
        report.skipped = skipped;
        report
    }

    /// Return to idle and refresh the displayed eligibility count.
    async fn finish_idle(&self) {
        self.set_state(EngineState::Idle);
        match self.feed.list_eligible().await {
            Ok(targets) => {
                self.emit(EngineEvent::EligibilityChanged {
                    eligible: targets.len() as u64,
                    timestamp: Timestamp::now(),
                });
            }
            Err(e) => debug!(error = %e, "Eligibility refresh failed"),
        }
    }

    fn set_state(&self, to: EngineState) {
        let mut state = self.state.lock().expect("state lock poisoned");
        if let Err(e) = validate_transition(*state, to) {
            // Transitions are fully executor-internal; this firing means a bug.
            warn!(error = %e, "Unexpected state transition");
        }
        *state = to;
    }

    fn emit(&self, event: EngineEvent) {
        // No receivers is fine; events are best-effort progress display.
        let _ = self.event_tx.send(event);
    }
}
