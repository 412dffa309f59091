//! Concurrent fetch-and-normalize of every feed category.
//!
//! One call to [`Normalizer::snapshot`] fetches all categories at once and
//! waits for all of them, so a cycle takes as long as the slowest category.
//! A category whose fetch or parse fails is logged, left empty and listed
//! in [`Snapshot::degraded`]; the other categories are unaffected.

use std::sync::Arc;

use chrono::Utc;
use futures_util::future::join_all;
use serde_json::Value;

use super::{FeedSource, parse, resources};
use crate::domain::{CycleState, FeedCategory, LegacyAlert, Snapshot};
use crate::error::NotifierError;

/// Builds canonical snapshots from a [`FeedSource`].
#[derive(Debug)]
pub struct Normalizer<F> {
    source: Arc<F>,
}

impl<F> Clone for Normalizer<F> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<F: FeedSource> Normalizer<F> {
    /// Creates a normalizer over `source`.
    #[must_use]
    pub fn new(source: Arc<F>) -> Self {
        Self { source }
    }

    /// Fetches every category concurrently and assembles a snapshot.
    ///
    /// Never fails: a failing category is empty and marked degraded.
    pub async fn snapshot(&self) -> Snapshot {
        let (events, invasions, challenges, trader, boss_rotation, cycles) = tokio::join!(
            self.category(resources::EVENTS, parse::events),
            self.category(resources::INVASIONS, parse::invasions),
            self.category(resources::NIGHTWAVE, parse::nightwave),
            self.category(resources::VOID_TRADER, parse::trader),
            self.category(resources::ARCHON_HUNT, parse::boss_rotation),
            self.cycles(),
        );

        let mut degraded = Vec::new();
        let mut settle = |category: FeedCategory, ok: bool| {
            if !ok {
                degraded.push(category);
            }
        };
        settle(FeedCategory::Events, events.is_ok());
        settle(FeedCategory::Invasions, invasions.is_ok());
        settle(FeedCategory::Nightwave, challenges.is_ok());
        settle(FeedCategory::Trader, trader.is_ok());
        settle(FeedCategory::BossRotation, boss_rotation.is_ok());
        let (cycles, cycles_complete) = cycles;
        settle(FeedCategory::Cycles, cycles_complete);

        let snapshot = Snapshot {
            taken_at: Utc::now(),
            events: events.unwrap_or_default(),
            invasions: invasions.unwrap_or_default(),
            challenges: challenges.unwrap_or_default(),
            trader: trader.ok(),
            boss_rotation: boss_rotation.ok(),
            cycles,
            degraded,
        };

        tracing::debug!(
            events = snapshot.events.len(),
            invasions = snapshot.invasions.len(),
            challenges = snapshot.challenges.len(),
            trader = snapshot.trader.is_some(),
            boss_rotation = snapshot.boss_rotation.is_some(),
            cycles = snapshot.cycles.len(),
            degraded = snapshot.degraded.len(),
            "snapshot assembled"
        );
        snapshot
    }

    /// Fetches and parses the legacy alert list.
    ///
    /// # Errors
    ///
    /// Returns the transport or parse error of the `alerts` resource.
    pub async fn legacy_alerts(&self) -> Result<Vec<LegacyAlert>, NotifierError> {
        let body = self.source.fetch(resources::ALERTS).await?;
        parse::alerts(&body, Utc::now())
    }

    async fn category<T>(
        &self,
        resource: &str,
        parse: fn(&Value) -> Result<T, NotifierError>,
    ) -> Result<T, NotifierError> {
        let result = match self.source.fetch(resource).await {
            Ok(body) => parse(&body),
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            tracing::warn!(resource, error = %e, "feed category unavailable, treating as empty");
        }
        result
    }

    /// Region cycles in fixed order, plus whether every region answered.
    async fn cycles(&self) -> (Vec<CycleState>, bool) {
        let fetches = resources::CYCLES.iter().map(|&(resource, region)| async move {
            self.source
                .fetch(resource)
                .await
                .and_then(|body| parse::cycle(resource, region, &body))
        });

        let mut complete = true;
        let mut cycles = Vec::with_capacity(resources::CYCLES.len());
        for (result, (resource, _)) in join_all(fetches).await.into_iter().zip(resources::CYCLES) {
            match result {
                Ok(cycle) => cycles.push(cycle),
                Err(e) => {
                    complete = false;
                    tracing::warn!(resource, error = %e, "cycle unavailable, skipping region");
                }
            }
        }
        (cycles, complete)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;

    /// Serves canned bodies; anything unknown answers HTTP 503.
    #[derive(Debug, Default)]
    struct CannedFeed {
        bodies: HashMap<&'static str, Value>,
    }

    impl FeedSource for CannedFeed {
        async fn fetch(&self, resource: &str) -> Result<Value, NotifierError> {
            self.bodies
                .get(resource)
                .cloned()
                .ok_or_else(|| NotifierError::FeedStatus {
                    resource: resource.to_string(),
                    status: 503,
                })
        }
    }

    fn full_feed() -> CannedFeed {
        let mut bodies = HashMap::new();
        bodies.insert(
            "events",
            json!([{ "id": "ev1", "node": "Earth", "active": true, "reward": "Forma" }]),
        );
        bodies.insert(
            "invasions",
            json!([
                { "id": "i1", "node": "Ose (Europa)", "completion": -37.5, "completed": false },
                { "id": "i2", "node": "Lares (Mercury)", "completion": 100, "completed": true }
            ]),
        );
        bodies.insert(
            "nightwave",
            json!({ "activeChallenges": [{ "id": "c1", "title": "Hunter", "isDaily": true }] }),
        );
        bodies.insert(
            "voidTrader",
            json!({ "active": false, "location": "Larunda Relay (Mercury)" }),
        );
        bodies.insert(
            "archonHunt",
            json!({ "boss": "Archon Nira", "missions": [{ "type": "Survival" }] }),
        );
        bodies.insert("earthCycle", json!({ "state": "day", "isDay": true }));
        bodies.insert("cetusCycle", json!({ "state": "night", "isDay": false }));
        bodies.insert("vallisCycle", json!({ "state": "cold", "isDay": false }));
        bodies.insert("cambionCycle", json!({ "state": "fass", "isDay": true }));
        CannedFeed { bodies }
    }

    #[tokio::test]
    async fn full_feed_builds_complete_snapshot() {
        let normalizer = Normalizer::new(Arc::new(full_feed()));
        let snapshot = normalizer.snapshot().await;

        assert!(snapshot.is_complete());
        assert_eq!(snapshot.events.len(), 1);
        assert_eq!(snapshot.invasions.len(), 1);
        assert_eq!(
            snapshot.invasions.first().map(|i| i.progress),
            Some(37.5)
        );
        assert_eq!(snapshot.challenges.len(), 1);
        assert!(snapshot.trader.is_some());
        assert!(snapshot.boss_rotation.is_some());
        let regions: Vec<&str> = snapshot.cycles.iter().map(|c| c.region.as_str()).collect();
        assert_eq!(regions, vec!["earth", "cetus", "vallis", "cambion"]);
    }

    #[tokio::test]
    async fn failing_categories_degrade_independently() {
        let mut feed = full_feed();
        feed.bodies.remove("invasions");
        feed.bodies.remove("cetusCycle");
        feed.bodies.insert("voidTrader", json!("maintenance"));

        let snapshot = Normalizer::new(Arc::new(feed)).snapshot().await;

        assert_eq!(
            snapshot.degraded,
            vec![
                FeedCategory::Invasions,
                FeedCategory::Trader,
                FeedCategory::Cycles
            ]
        );
        assert!(snapshot.invasions.is_empty());
        assert!(snapshot.trader.is_none());
        assert_eq!(snapshot.events.len(), 1);
        assert_eq!(snapshot.cycles.len(), 3);
        assert!(snapshot.cycle("cetus").is_none());
    }

    #[tokio::test]
    async fn unavailable_feed_yields_empty_snapshot() {
        let snapshot = Normalizer::new(Arc::new(CannedFeed::default()))
            .snapshot()
            .await;
        assert_eq!(snapshot.degraded.len(), FeedCategory::ALL.len());
        assert!(snapshot.events.is_empty());
        assert!(snapshot.cycles.is_empty());
    }

    #[tokio::test]
    async fn legacy_alerts_propagate_errors() {
        let normalizer = Normalizer::new(Arc::new(CannedFeed::default()));
        assert!(normalizer.legacy_alerts().await.is_err());

        let mut feed = CannedFeed::default();
        feed.bodies.insert("alerts", json!([{ "id": "a1" }]));
        let Ok(alerts) = Normalizer::new(Arc::new(feed)).legacy_alerts().await else {
            panic!("alerts should parse");
        };
        assert_eq!(alerts.len(), 1);
    }
}
