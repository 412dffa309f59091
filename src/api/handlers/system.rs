//! Liveness of the notifier and freshness of its last poll cycle.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Cycles a report may lag behind before the notifier counts as stale.
const STALE_AFTER_INTERVALS: u32 = 3;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `starting` before the first cycle, `healthy` while cycles keep
    /// finishing on cadence, `stale` once they stop.
    status: String,
    timestamp: String,
    version: String,
    /// Configured delay between poll cycles.
    poll_interval_secs: u64,
    /// Completion time of the most recent cycle.
    last_cycle_finished_at: Option<DateTime<Utc>>,
}

fn freshness(finished_at: Option<DateTime<Utc>>, state: &AppState, now: DateTime<Utc>) -> &'static str {
    let Some(finished_at) = finished_at else {
        return "starting";
    };
    let window = state
        .poll_interval
        .checked_mul(STALE_AFTER_INTERVALS)
        .and_then(|d| chrono::Duration::from_std(d).ok())
        .unwrap_or(chrono::Duration::MAX);
    if now.signed_duration_since(finished_at) > window {
        "stale"
    } else {
        "healthy"
    }
}

/// `GET /health`: Liveness and poll freshness.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Always answers 200. The status field says whether poll cycles are finishing on cadence.",
    responses(
        (status = 200, description = "Notifier is up", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let now = Utc::now();
    let finished_at = state.reports.borrow().as_ref().map(|r| r.finished_at);
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: freshness(finished_at, &state, now).to_string(),
            timestamp: now.to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            poll_interval_secs: state.poll_interval.as_secs(),
            last_cycle_finished_at: finished_at,
        }),
    )
}

/// Routes mounted at the root level, outside `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}
