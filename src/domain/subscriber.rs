//! Subscribers and their reward filters.

use serde::{Deserialize, Serialize};

use super::notice::Notice;

/// Locale tag given to new subscribers.
pub const DEFAULT_LOCALE: &str = "en";

/// A chat user who receives notifications.
///
/// Created on first contact, mutated by filter and enable/disable commands,
/// never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    /// Opaque numeric user identity.
    pub user_id: i64,
    /// Chat destination messages are sent to.
    pub destination: String,
    /// Case-insensitive substring filters, in insertion order.
    #[serde(default)]
    pub filters: Vec<String>,
    /// Whether the subscriber wants notifications at all.
    #[serde(default = "default_enabled")]
    pub notifications_enabled: bool,
    /// Locale tag.
    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_enabled() -> bool {
    true
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

impl Subscriber {
    /// Creates an enabled subscriber with no filters.
    #[must_use]
    pub fn new(user_id: i64, destination: impl Into<String>) -> Self {
        Self {
            user_id,
            destination: destination.into(),
            filters: Vec::new(),
            notifications_enabled: true,
            locale: default_locale(),
        }
    }

    /// Returns `true` if `reward` passes the filters.
    ///
    /// An empty filter list accepts everything; otherwise at least one
    /// filter must be a case-insensitive substring of the reward.
    #[must_use]
    pub fn is_interested(&self, reward: &str) -> bool {
        if self.filters.is_empty() {
            return true;
        }
        let reward = reward.to_lowercase();
        self.filters
            .iter()
            .any(|filter| reward.contains(&filter.to_lowercase()))
    }

    /// Returns `true` if the notice should be delivered to this subscriber.
    ///
    /// Notices without a reward are always relevant; notices with several
    /// rewards are relevant if any of them passes.
    #[must_use]
    pub fn wants(&self, notice: &Notice) -> bool {
        let rewards = notice.rewards();
        rewards.is_empty() || rewards.iter().any(|reward| self.is_interested(reward))
    }

    /// Adds a filter unless a case-insensitive duplicate exists.
    ///
    /// Returns `true` if the filter list changed.
    pub fn add_filter(&mut self, filter: &str) -> bool {
        let filter = filter.trim();
        if filter.is_empty() || self.has_filter(filter) {
            return false;
        }
        self.filters.push(filter.to_string());
        true
    }

    /// Removes every filter equal to `filter` ignoring case.
    ///
    /// Returns `true` if anything was removed.
    pub fn remove_filter(&mut self, filter: &str) -> bool {
        let before = self.filters.len();
        let needle = filter.trim().to_lowercase();
        self.filters.retain(|f| f.to_lowercase() != needle);
        self.filters.len() != before
    }

    fn has_filter(&self, filter: &str) -> bool {
        let needle = filter.to_lowercase();
        self.filters.iter().any(|f| f.to_lowercase() == needle)
    }
}
