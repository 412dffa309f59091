//! Canonical snapshot of the live game state.
//!
//! A [`Snapshot`] is built once per poll cycle by the feed normalizer and
//! never mutated afterwards; the poll loop shares it behind an `Arc`.
//! Every string field is already resolved to its display value (fallback
//! literals applied, rewards rendered).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::FactId;

/// Feed categories that make up a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FeedCategory {
    /// Timed events.
    Events,
    /// Faction invasions.
    Invasions,
    /// Nightwave challenge set.
    Nightwave,
    /// Rotating void trader.
    Trader,
    /// Weekly boss rotation.
    BossRotation,
    /// Day/night cycles of the open-world regions.
    Cycles,
}

impl FeedCategory {
    /// All categories in snapshot order.
    pub const ALL: [Self; 6] = [
        Self::Events,
        Self::Invasions,
        Self::Nightwave,
        Self::Trader,
        Self::BossRotation,
        Self::Cycles,
    ];

    /// Stable lowercase name used in logs and the status API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Events => "events",
            Self::Invasions => "invasions",
            Self::Nightwave => "nightwave",
            Self::Trader => "trader",
            Self::BossRotation => "boss_rotation",
            Self::Cycles => "cycles",
        }
    }
}

impl fmt::Display for FeedCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A timed event with a reward.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedFact {
    /// Canonical identity.
    pub id: FactId,
    /// Free-text description.
    pub description: String,
    /// Enemy faction.
    pub faction: String,
    /// Node or region the event runs on.
    pub location: String,
    /// When the event ends, if known.
    pub expiry: Option<DateTime<Utc>>,
    /// Whether the feed marks the event as running.
    pub active: bool,
    /// Canonical reward string.
    pub reward: String,
}

/// One side of an invasion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvasionSide {
    /// Faction name.
    pub faction: String,
    /// Canonical reward string for siding with this faction.
    pub reward: String,
}

/// A live (not completed) faction invasion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invasion {
    /// Canonical identity.
    pub id: FactId,
    /// Node the invasion runs on.
    pub location: String,
    /// Free-text description.
    pub description: String,
    /// Attacking side.
    pub attacker: InvasionSide,
    /// Defending side.
    pub defender: InvasionSide,
    /// Progress magnitude in percent, always in `0.0..=100.0`.
    pub progress: f64,
    /// Always `false` inside a snapshot; kept for rendering symmetry.
    pub completed: bool,
}

/// How often a challenge rotates. The variants are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    /// Rotates every day.
    Daily,
    /// Rotates every week.
    Weekly,
    /// Harder weekly challenge.
    EliteWeekly,
}

impl Cadence {
    /// Maps the feed's two boolean flags onto a single cadence.
    #[must_use]
    pub const fn from_flags(is_daily: bool, is_elite: bool) -> Self {
        if is_daily {
            Self::Daily
        } else if is_elite {
            Self::EliteWeekly
        } else {
            Self::Weekly
        }
    }
}

/// A single nightwave challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChallengeFact {
    /// Canonical identity.
    pub id: FactId,
    /// Short title.
    pub title: String,
    /// What the player has to do.
    pub description: String,
    /// Standing awarded on completion.
    pub standing: i64,
    /// Rotation cadence.
    pub cadence: Cadence,
    /// When the challenge rotates out, if known.
    pub expiry: Option<DateTime<Utc>>,
}

/// One item sold by the rotating trader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraderItem {
    /// Item name.
    pub name: String,
    /// Price in ducats.
    pub ducats: i64,
    /// Price in credits.
    pub credits: i64,
}

/// The rotating void trader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RotatingTrader {
    /// Whether the trader is currently at a relay.
    pub active: bool,
    /// Relay name.
    pub location: String,
    /// Next arrival; meaningful while inactive.
    pub arrival: Option<DateTime<Utc>>,
    /// Departure; meaningful while active.
    pub departure: Option<DateTime<Utc>>,
    /// Current inventory in feed order.
    pub inventory: Vec<TraderItem>,
}

impl RotatingTrader {
    /// Compares only the tracked fields (activity, location, arrival,
    /// departure). Inventory churn alone is not a change.
    #[must_use]
    pub fn tracked_fields_eq(&self, other: &Self) -> bool {
        self.active == other.active
            && self.location == other.location
            && self.arrival == other.arrival
            && self.departure == other.departure
    }
}

/// The weekly boss rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BossRotation {
    /// Boss name.
    pub boss: String,
    /// Mission type labels in order.
    pub missions: Vec<String>,
    /// When the rotation ends, if known.
    pub expiry: Option<DateTime<Utc>>,
}

/// Day/night state of one open-world region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleState {
    /// Region key (e.g. `"cetus"`).
    pub region: String,
    /// State label (e.g. `"day"`, `"warm"`).
    pub state: String,
    /// Instant at which the current state ends.
    pub ends_at: Option<DateTime<Utc>>,
    /// Whether the region is in its day phase.
    pub is_day: bool,
}

/// Full canonical picture of the tracked facts as of one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    /// When the snapshot was assembled.
    pub taken_at: DateTime<Utc>,
    /// Timed events in feed order.
    pub events: Vec<TimedFact>,
    /// Live invasions in feed order.
    pub invasions: Vec<Invasion>,
    /// Nightwave challenges in feed order.
    pub challenges: Vec<ChallengeFact>,
    /// The void trader, if the feed answered.
    pub trader: Option<RotatingTrader>,
    /// The boss rotation, if the feed answered.
    pub boss_rotation: Option<BossRotation>,
    /// Region cycles in fixed region order.
    pub cycles: Vec<CycleState>,
    /// Categories whose fetch or parse failed this cycle; they are empty.
    pub degraded: Vec<FeedCategory>,
}

impl Snapshot {
    /// Returns `true` if every category came back without error.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.degraded.is_empty()
    }

    /// Looks up a region cycle by key.
    #[must_use]
    pub fn cycle(&self, region: &str) -> Option<&CycleState> {
        self.cycles.iter().find(|c| c.region == region)
    }
}
