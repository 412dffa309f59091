//! Poll loop status and subscriber summary.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{StatusResponse, SubscriberSummary};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, NotifierError};

/// `GET /status`: Latest poll cycle report.
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "Status",
    summary = "Poll loop status",
    description = "Returns the report of the most recent poll cycle: degraded feed categories, notice count and delivery counts.",
    responses(
        (status = 200, description = "Current status", body = StatusResponse),
    )
)]
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let last_cycle = state.reports.borrow().clone();
    let response = StatusResponse {
        state: if last_cycle.is_some() { "running" } else { "starting" }.to_string(),
        last_cycle,
    };
    (StatusCode::OK, Json(response))
}

/// `GET /subscribers/summary`: Subscriber counts.
///
/// # Errors
///
/// Returns [`NotifierError::Store`] if the subscriber collection cannot be
/// read.
#[utoipa::path(
    get,
    path = "/api/v1/subscribers/summary",
    tag = "Status",
    summary = "Subscriber counts",
    description = "Returns how many subscribers exist and how many have notifications enabled.",
    responses(
        (status = 200, description = "Subscriber counts", body = SubscriberSummary),
        (status = 500, description = "Subscriber store unreadable", body = ErrorResponse),
    )
)]
pub async fn subscriber_summary_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, NotifierError> {
    let subscribers = state.subscribers.list().await?;
    let summary = SubscriberSummary {
        total: subscribers.len(),
        enabled: subscribers
            .iter()
            .filter(|s| s.notifications_enabled)
            .count(),
    };
    Ok((StatusCode::OK, Json(summary)))
}

/// Status routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(status_handler))
        .route("/subscribers/summary", get(subscriber_summary_handler))
}
