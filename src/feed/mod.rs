//! Feed layer: upstream transport and normalization.
//!
//! [`FeedSource`] is the only thing the notifier needs from the upstream
//! HTTP API: "give me the JSON body of this resource". [`HttpFeedClient`]
//! implements it with `reqwest`; tests substitute in-memory sources. The
//! [`Normalizer`] fans out over every category, tolerates partial failure
//! and assembles one [`crate::domain::Snapshot`].

pub mod client;
pub mod normalizer;
pub mod parse;

use std::future::Future;

use serde_json::Value;

use crate::error::NotifierError;

pub use client::HttpFeedClient;
pub use normalizer::Normalizer;

/// Feed resource names.
pub mod resources {
    /// Timed events.
    pub const EVENTS: &str = "events";
    /// Faction invasions.
    pub const INVASIONS: &str = "invasions";
    /// Nightwave season with its active challenges.
    pub const NIGHTWAVE: &str = "nightwave";
    /// The rotating void trader.
    pub const VOID_TRADER: &str = "voidTrader";
    /// The weekly boss rotation.
    pub const ARCHON_HUNT: &str = "archonHunt";
    /// Legacy alert list.
    pub const ALERTS: &str = "alerts";
    /// Cycle resources paired with the region key used in snapshots.
    pub const CYCLES: [(&str, &str); 4] = [
        ("earthCycle", "earth"),
        ("cetusCycle", "cetus"),
        ("vallisCycle", "vallis"),
        ("cambionCycle", "cambion"),
    ];
}

/// Fetches raw JSON bodies from the upstream feed.
pub trait FeedSource: Send + Sync {
    /// Returns the parsed JSON body of `resource`.
    ///
    /// Implementations return [`NotifierError::FeedTransport`],
    /// [`NotifierError::FeedStatus`] or [`NotifierError::Parse`] on failure.
    fn fetch(&self, resource: &str) -> impl Future<Output = Result<Value, NotifierError>> + Send;
}
