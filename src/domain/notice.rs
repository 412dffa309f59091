//! Notices produced by diffing two snapshots.
//!
//! A [`Notice`] is one notification-worthy change. A [`Delta`] is the
//! ordered set of notices for one poll cycle: events first, then
//! invasions, the challenge batch, the trader and the boss rotation, each
//! group in current-snapshot order.

use serde::Serialize;

use super::snapshot::{BossRotation, ChallengeFact, Invasion, RotatingTrader, TimedFact};
use super::FactId;

/// A single notification-worthy change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "notice_type", rename_all = "snake_case")]
pub enum Notice {
    /// A timed event appeared.
    NewEvent {
        /// The new event.
        event: TimedFact,
    },

    /// A live invasion appeared.
    NewInvasion {
        /// The new invasion.
        invasion: Invasion,
    },

    /// At least one challenge appeared; carries the full current set.
    ChallengeBatch {
        /// Every challenge in the current snapshot.
        challenges: Vec<ChallengeFact>,
        /// Ids of the challenges that are new this cycle.
        new_ids: Vec<FactId>,
    },

    /// The trader appeared or one of its tracked fields changed.
    TraderChanged {
        /// Current trader state.
        trader: RotatingTrader,
    },

    /// The boss rotation appeared or changed.
    BossRotationChanged {
        /// Current rotation.
        rotation: BossRotation,
    },
}

impl Notice {
    /// Reward strings that subscriber filters are matched against.
    ///
    /// Empty for notices that carry no reward; those are always relevant.
    #[must_use]
    pub fn rewards(&self) -> Vec<&str> {
        match self {
            Self::NewEvent { event } => vec![event.reward.as_str()],
            Self::NewInvasion { invasion } => vec![
                invasion.attacker.reward.as_str(),
                invasion.defender.reward.as_str(),
            ],
            Self::ChallengeBatch { .. }
            | Self::TraderChanged { .. }
            | Self::BossRotationChanged { .. } => Vec::new(),
        }
    }

    /// Returns the notice type as a static string slice.
    #[must_use]
    pub const fn notice_type_str(&self) -> &'static str {
        match self {
            Self::NewEvent { .. } => "new_event",
            Self::NewInvasion { .. } => "new_invasion",
            Self::ChallengeBatch { .. } => "challenge_batch",
            Self::TraderChanged { .. } => "trader_changed",
            Self::BossRotationChanged { .. } => "boss_rotation_changed",
        }
    }
}

/// Ordered notices for one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Delta {
    notices: Vec<Notice>,
}

impl Delta {
    /// Creates an empty delta.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Appends a notice.
    pub fn push(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Returns the notices in order.
    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Number of notices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notices.len()
    }

    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snapshot::InvasionSide;

    fn invasion(attacker_reward: &str, defender_reward: &str) -> Invasion {
        Invasion {
            id: FactId::from("inv-1"),
            location: "Tolstoj (Mercury)".to_string(),
            description: "Grineer Offensive".to_string(),
            attacker: InvasionSide {
                faction: "Grineer".to_string(),
                reward: attacker_reward.to_string(),
            },
            defender: InvasionSide {
                faction: "Corpus".to_string(),
                reward: defender_reward.to_string(),
            },
            progress: 37.5,
            completed: false,
        }
    }

    #[test]
    fn invasion_exposes_both_rewards() {
        let notice = Notice::NewInvasion {
            invasion: invasion("3x Fieldron", "1x Detonite Injector"),
        };
        assert_eq!(notice.rewards(), vec!["3x Fieldron", "1x Detonite Injector"]);
        assert_eq!(notice.notice_type_str(), "new_invasion");
    }

    #[test]
    fn batch_carries_no_reward() {
        let notice = Notice::ChallengeBatch {
            challenges: Vec::new(),
            new_ids: Vec::new(),
        };
        assert!(notice.rewards().is_empty());
    }

    #[test]
    fn delta_preserves_push_order() {
        let mut delta = Delta::empty();
        assert!(delta.is_empty());
        delta.push(Notice::NewInvasion {
            invasion: invasion("a", "b"),
        });
        delta.push(Notice::ChallengeBatch {
            challenges: Vec::new(),
            new_ids: Vec::new(),
        });
        assert_eq!(delta.len(), 2);
        let kinds: Vec<&str> = delta.notices().iter().map(Notice::notice_type_str).collect();
        assert_eq!(kinds, vec!["new_invasion", "challenge_batch"]);
    }

    #[test]
    fn notice_serializes_with_tag() {
        let notice = Notice::NewInvasion {
            invasion: invasion("a", "b"),
        };
        let json = serde_json::to_string(&notice).unwrap_or_default();
        assert!(json.contains("\"notice_type\":\"new_invasion\""));
    }
}
