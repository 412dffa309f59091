//! Persisted records for legacy alerts and completion tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Enemy level used when the feed omits the lower bound.
pub const DEFAULT_MIN_ENEMY_LEVEL: i64 = 1;

/// Enemy level used when the feed omits the upper bound.
pub const DEFAULT_MAX_ENEMY_LEVEL: i64 = 100;

/// An entry of the legacy alert list.
///
/// Superseded by the live categories for notifications; kept so users can
/// mark alerts as completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyAlert {
    /// Alert identity.
    pub id: String,
    /// Mission name.
    pub mission: String,
    /// Mission type label.
    pub mission_type: String,
    /// Canonical reward string.
    pub reward: String,
    /// Node the alert runs on.
    pub location: String,
    /// Enemy faction.
    pub enemy: String,
    /// Lowest enemy level.
    pub min_enemy_level: i64,
    /// Highest enemy level.
    pub max_enemy_level: i64,
    /// Start instant.
    pub start: DateTime<Utc>,
    /// End instant.
    pub end: DateTime<Utc>,
    /// Whether the alert is flagged active.
    pub active: bool,
}

impl LegacyAlert {
    /// Active and not yet ended at `now`.
    #[must_use]
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.active && self.end > now
    }
}

/// A user's record of having completed an alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedAlert {
    /// Completed alert id.
    pub alert_id: String,
    /// User who completed it.
    pub user_id: i64,
    /// When it was marked.
    pub completed_at: DateTime<Utc>,
}
