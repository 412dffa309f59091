//! Status and subscriber summary payloads.

use serde::Serialize;
use utoipa::ToSchema;

use crate::service::CycleReport;

/// Poll loop status.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusResponse {
    /// `"starting"` until the first cycle completes, then `"running"`.
    pub state: String,
    /// Report of the most recent cycle.
    pub last_cycle: Option<CycleReport>,
}

/// Subscriber counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct SubscriberSummary {
    /// All known subscribers.
    pub total: usize,
    /// Subscribers with notifications enabled.
    pub enabled: usize,
}
