//! Route handler functions for all API endpoints.
//!
//! Each handler extracts parameters via axum extractors, interacts with
//! AppState services, and returns JSON responses.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use ovation_core::events::EngineEvent;
use ovation_core::types::{
    KudoSettings, QuotaSummary, SettingsPatch, StatisticsSummary, Timestamp,
};
use ovation_engine::{BatchStatus, KudoTarget, QuotaWindow};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request / response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EligibleResponse {
    pub eligible: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub reset: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SeedFeedRequest {
    /// Number of synthetic targets to generate.
    pub count: Option<u32>,
    /// Explicit target ids to seed instead.
    pub ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SeedFeedResponse {
    pub seeded: usize,
    pub eligible: u64,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// POST /kudos/run - trigger one batch.
///
/// Always returns the batch report; a concurrent trigger gets 409 with a
/// `busy` report rather than racing the quota.
pub async fn run_batch(State(state): State<AppState>) -> impl IntoResponse {
    let report = state.executor.run_batch().await;
    let status = match report.status {
        BatchStatus::Busy => StatusCode::CONFLICT,
        _ => StatusCode::OK,
    };
    (status, Json(report))
}

/// GET /kudos/quota
pub async fn quota_summary(
    State(state): State<AppState>,
) -> Result<Json<QuotaSummary>, ApiError> {
    let summary = state.executor.quota_summary(Timestamp::now())?;
    Ok(Json(summary))
}

/// GET /kudos/eligible
pub async fn eligible(State(state): State<AppState>) -> Result<Json<EligibleResponse>, ApiError> {
    let eligible = state.executor.eligible_count().await?;
    Ok(Json(EligibleResponse { eligible }))
}

/// GET /settings
pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<KudoSettings>, ApiError> {
    Ok(Json(state.settings.load()?))
}

/// PUT /settings - partial update.
pub async fn update_settings(
    State(state): State<AppState>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<KudoSettings>, ApiError> {
    let updated = state.settings.update(patch)?;
    let _ = state.event_tx.send(EngineEvent::SettingsUpdated {
        timestamp: Timestamp::now(),
    });
    tracing::info!(min_delay_ms = updated.min_delay_ms, "Settings updated");
    Ok(Json(updated))
}

/// GET /stats
pub async fn stats_summary(
    State(state): State<AppState>,
) -> Result<Json<StatisticsSummary>, ApiError> {
    Ok(Json(state.stats.summary(Timestamp::now())?))
}

/// POST /stats/reset - explicit reset only; never implicit.
pub async fn reset_statistics(
    State(state): State<AppState>,
) -> Result<Json<ResetResponse>, ApiError> {
    state.stats.reset()?;
    let _ = state.event_tx.send(EngineEvent::StatisticsReset {
        timestamp: Timestamp::now(),
    });
    tracing::info!("Statistics reset");
    Ok(Json(ResetResponse { reset: true }))
}

/// GET /stream - SSE event stream.
pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>> + Send> {
    let rx = state.event_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => {
            let data = serde_json::to_string(&event).unwrap_or_default();
            Some(Ok(Event::default().event(event.event_name()).data(data)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

// =============================================================================
// Debug endpoints (gated on settings.show_debug_controls)
// =============================================================================

fn require_debug(state: &AppState) -> Result<(), ApiError> {
    let settings = state.settings.load()?;
    if settings.show_debug_controls {
        Ok(())
    } else {
        Err(ApiError::NotFound("debug controls are disabled".to_string()))
    }
}

/// POST /debug/feed/seed - add synthetic targets to the demo feed.
pub async fn debug_seed_feed(
    State(state): State<AppState>,
    Json(request): Json<SeedFeedRequest>,
) -> Result<Json<SeedFeedResponse>, ApiError> {
    require_debug(&state)?;
    let feed = state
        .memory_feed
        .as_ref()
        .ok_or_else(|| ApiError::ServiceUnavailable("no demo feed attached".to_string()))?;

    let targets: Vec<KudoTarget> = match (request.ids, request.count) {
        (Some(ids), _) => ids.into_iter().map(KudoTarget::new).collect(),
        (None, Some(count)) => (0..count)
            .map(|_| KudoTarget::new(format!("seed-{}", uuid::Uuid::new_v4())))
            .collect(),
        (None, None) => {
            return Err(ApiError::BadRequest(
                "provide either ids or count".to_string(),
            ))
        }
    };

    let seeded = targets.len();
    feed.seed(targets);
    let eligible = state.executor.eligible_count().await?;
    Ok(Json(SeedFeedResponse { seeded, eligible }))
}

/// POST /debug/limit-notice - preview the limit-reached notification
/// without consuming quota.
pub async fn debug_limit_notice(
    State(state): State<AppState>,
) -> Result<Json<QuotaSummary>, ApiError> {
    require_debug(&state)?;
    let now = Timestamp::now();
    let summary = state.executor.quota_summary(now)?;
    let _ = state.event_tx.send(EngineEvent::LimitReached {
        limit: summary.limit,
        minutes_until_reset: QuotaWindow::minutes_until_reset(now, summary.window_start),
        timestamp: now,
    });
    Ok(Json(summary))
}
