//! Domain layer: canonical snapshot model, differ and subscribers.
//!
//! Everything here is plain data plus pure functions. Fetching, storing
//! and sending live in the `feed`, `store`, `chat` and `service` layers.

pub mod differ;
pub mod fact_id;
pub mod notice;
pub mod records;
pub mod reward;
pub mod snapshot;
pub mod subscriber;

pub use differ::diff;
pub use fact_id::FactId;
pub use notice::{Delta, Notice};
pub use records::{CompletedAlert, LegacyAlert};
pub use reward::{NO_REWARD, Reward};
pub use snapshot::{
    BossRotation, Cadence, ChallengeFact, CycleState, FeedCategory, Invasion, InvasionSide,
    RotatingTrader, Snapshot, TimedFact, TraderItem,
};
pub use subscriber::Subscriber;
