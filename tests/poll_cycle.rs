//! End-to-end poll cycles against in-memory feed and chat fakes.

#![allow(clippy::panic, missing_docs)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};
use tokio_test::assert_ok;

use worldstate_notifier::chat::{ChatTransport, UpdateBatch};
use worldstate_notifier::domain::{FeedCategory, Subscriber};
use worldstate_notifier::error::NotifierError;
use worldstate_notifier::feed::{FeedSource, Normalizer};
use worldstate_notifier::service::{Dispatcher, PollLoop, PollState};
use worldstate_notifier::store::{AlertRepository, DocumentStore, SubscriberRepository};

#[derive(Debug, Default)]
struct FakeFeed {
    bodies: Mutex<HashMap<String, Value>>,
}

impl FakeFeed {
    fn set(&self, resource: &str, body: Value) {
        if let Ok(mut bodies) = self.bodies.lock() {
            bodies.insert(resource.to_string(), body);
        }
    }

    fn fail(&self, resource: &str) {
        if let Ok(mut bodies) = self.bodies.lock() {
            bodies.remove(resource);
        }
    }
}

impl FeedSource for FakeFeed {
    async fn fetch(&self, resource: &str) -> Result<Value, NotifierError> {
        self.bodies
            .lock()
            .ok()
            .and_then(|bodies| bodies.get(resource).cloned())
            .ok_or_else(|| NotifierError::FeedTransport {
                resource: resource.to_string(),
                message: "connection refused".to_string(),
            })
    }
}

/// Records deliveries; destinations in `unreachable` always fail.
#[derive(Debug, Default)]
struct FakeChat {
    unreachable: Vec<String>,
    delivered: Mutex<Vec<(String, String)>>,
}

impl FakeChat {
    fn inbox(&self, destination: &str) -> Vec<String> {
        self.delivered
            .lock()
            .map(|d| {
                d.iter()
                    .filter(|(to, _)| to == destination)
                    .map(|(_, text)| text.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl ChatTransport for FakeChat {
    async fn send_message(&self, destination: &str, text: &str) -> Result<(), NotifierError> {
        if self.unreachable.iter().any(|u| u == destination) {
            return Err(NotifierError::ChatTransport("Forbidden: bot was blocked".to_string()));
        }
        if let Ok(mut delivered) = self.delivered.lock() {
            delivered.push((destination.to_string(), text.to_string()));
        }
        Ok(())
    }

    async fn next_updates(&self, _offset: i64, _timeout: Duration) -> Result<UpdateBatch, NotifierError> {
        Ok(UpdateBatch::default())
    }
}

struct World {
    _dir: tempfile::TempDir,
    feed: Arc<FakeFeed>,
    chat: Arc<FakeChat>,
    poll: PollLoop<FakeFeed, FakeChat>,
}

async fn world(subscribers: Vec<Subscriber>, unreachable: &[&str]) -> World {
    let dir = assert_ok!(tempfile::tempdir());
    let store = Arc::new(assert_ok!(DocumentStore::open(dir.path()).await));
    let repo = SubscriberRepository::new(Arc::clone(&store));
    for subscriber in subscribers {
        assert_ok!(repo.upsert(subscriber).await);
    }

    let feed = Arc::new(FakeFeed::default());
    feed.set("events", json!([]));
    feed.set(
        "invasions",
        json!([{
            "id": "inv-1",
            "node": "Ose (Europa)",
            "attackingFaction": "Grineer",
            "defendingFaction": "Corpus",
            "attackerReward": { "countedItems": [{ "count": 3, "type": "Fieldron" }] },
            "defenderReward": { "countedItems": [{ "count": 1, "type": "Detonite Injector" }] },
            "completion": 12.5
        }]),
    );
    feed.set("nightwave", json!({ "activeChallenges": [] }));
    feed.set("voidTrader", json!({ "active": false, "location": "Strata Relay (Earth)" }));
    feed.set("archonHunt", json!({ "boss": "Archon Amar", "missions": [] }));
    for cycle in ["earthCycle", "cetusCycle", "vallisCycle", "cambionCycle"] {
        feed.set(cycle, json!({ "state": "day", "isDay": true }));
    }

    let chat = Arc::new(FakeChat {
        unreachable: unreachable.iter().map(|u| (*u).to_string()).collect(),
        ..FakeChat::default()
    });
    let poll = PollLoop::new(
        Normalizer::new(Arc::clone(&feed)),
        Dispatcher::new(Arc::clone(&chat), repo),
        AlertRepository::new(store),
        Duration::from_secs(300),
    );
    World {
        _dir: dir,
        feed,
        chat,
        poll,
    }
}

fn add_invasion(feed: &FakeFeed, reward: &str) {
    feed.set(
        "invasions",
        json!([
            {
                "id": "inv-1",
                "node": "Ose (Europa)",
                "attackerReward": { "countedItems": [{ "count": 3, "type": "Fieldron" }] },
                "defenderReward": { "countedItems": [{ "count": 1, "type": "Detonite Injector" }] },
                "completion": 40.0
            },
            {
                "id": "inv-2",
                "node": "Tessera (Venus)",
                "attackingFaction": "Corpus",
                "defendingFaction": "Grineer",
                "attackerReward": reward,
                "defenderReward": { "credits": 25000 },
                "completion": -3.0
            }
        ]),
    );
}

#[tokio::test]
async fn first_cycle_is_silent() {
    let w = world(vec![Subscriber::new(1, "alice")], &[]).await;
    let (state, report) = w.poll.run_cycle(PollState::Uninitialized).await;

    assert_eq!(report.notices, 0);
    assert!(w.chat.inbox("alice").is_empty());
    assert!(report.degraded_categories.is_empty());
    assert!(state.previous().is_some_and(|s| s.invasions.len() == 1));
}

#[tokio::test]
async fn new_invasion_reaches_interested_subscribers_only() {
    let mut wants_orokin = Subscriber::new(1, "alice");
    wants_orokin.filters = vec!["orokin".to_string()];
    let mut wants_forma = Subscriber::new(2, "bob");
    wants_forma.filters = vec!["Forma".to_string()];
    let everyone = Subscriber::new(3, "carol");
    let w = world(vec![wants_orokin, wants_forma, everyone], &[]).await;

    let (state, _) = w.poll.run_cycle(PollState::Uninitialized).await;
    add_invasion(&w.feed, "Orokin Reactor Blueprint");
    let (_, report) = w.poll.run_cycle(state).await;

    assert_eq!(report.notices, 1);
    assert_eq!(report.delivered, 2);
    let alice = w.chat.inbox("alice");
    assert_eq!(alice.len(), 1);
    assert!(alice.iter().all(|m| m.contains("Tessera (Venus)")));
    assert!(alice.iter().all(|m| m.contains("25,000 credits")));
    assert!(w.chat.inbox("bob").is_empty());
    assert_eq!(w.chat.inbox("carol").len(), 1);
}

#[tokio::test]
async fn unreachable_subscriber_is_isolated() {
    let subscribers = vec![
        Subscriber::new(1, "alice"),
        Subscriber::new(2, "blocked"),
        Subscriber::new(3, "carol"),
    ];
    let w = world(subscribers, &["blocked"]).await;

    let (state, _) = w.poll.run_cycle(PollState::Uninitialized).await;
    add_invasion(&w.feed, "Forma Blueprint");
    let (_, report) = w.poll.run_cycle(state).await;

    assert_eq!(report.delivered, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(w.chat.inbox("alice").len(), 1);
    assert_eq!(w.chat.inbox("carol").len(), 1);
}

#[tokio::test]
async fn failing_category_degrades_without_blocking_others() {
    let w = world(vec![Subscriber::new(1, "alice")], &[]).await;
    let (state, _) = w.poll.run_cycle(PollState::Uninitialized).await;

    w.feed.fail("archonHunt");
    w.feed.fail("cetusCycle");
    add_invasion(&w.feed, "Forma Blueprint");
    let (state, report) = w.poll.run_cycle(state).await;

    assert_eq!(
        report.degraded_categories,
        vec![FeedCategory::BossRotation, FeedCategory::Cycles]
    );
    assert_eq!(report.notices, 1);
    assert_eq!(w.chat.inbox("alice").len(), 1);
    assert!(state.previous().is_some_and(|s| s.boss_rotation.is_none()));
}

#[tokio::test]
async fn trader_arrival_is_reported_once() {
    let w = world(vec![Subscriber::new(1, "alice")], &[]).await;
    let (state, _) = w.poll.run_cycle(PollState::Uninitialized).await;

    w.feed.set(
        "voidTrader",
        json!({
            "active": true,
            "location": "Strata Relay (Earth)",
            "inventory": [{ "item": "Primed Continuity", "ducats": 350, "credits": 100000 }]
        }),
    );
    let (state, changed) = w.poll.run_cycle(state).await;
    let (_, unchanged) = w.poll.run_cycle(state).await;

    assert_eq!(changed.notices, 1);
    assert_eq!(unchanged.notices, 0);
    let inbox = w.chat.inbox("alice");
    assert_eq!(inbox.len(), 1);
    assert!(inbox.iter().all(|m| m.contains("Primed Continuity")));
}
