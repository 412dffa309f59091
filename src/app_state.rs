//! Shared application state injected into all Axum handlers.

use std::time::Duration;

use crate::service::ReportReceiver;
use crate::store::SubscriberRepository;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Latest poll cycle report.
    pub reports: ReportReceiver,
    /// Subscriber records for the summary endpoint.
    pub subscribers: SubscriberRepository,
    /// Configured poll cadence, reported by the health check.
    pub poll_interval: Duration,
}
