//! Snapshot differ.
//!
//! [`diff`] is a pure function of the previous and current snapshot. With
//! no previous snapshot the delta is empty, so a fresh start never floods
//! subscribers with everything that is already live.

use std::collections::HashSet;

use super::notice::{Delta, Notice};
use super::snapshot::{BossRotation, RotatingTrader, Snapshot};
use super::FactId;

/// Computes the notices for `current` relative to `previous`.
///
/// - Events: new iff active and their id was absent before. Inactive
///   events still count as seen for the next cycle.
/// - Invasions: new iff their id was absent before.
/// - Challenges: if any id is new, one batch with the full current set.
/// - Trader and boss rotation: new on appearance, or when a tracked field
///   differs. A category that vanished produces nothing.
#[must_use]
pub fn diff(previous: Option<&Snapshot>, current: &Snapshot) -> Delta {
    let mut delta = Delta::empty();
    let Some(previous) = previous else {
        return delta;
    };

    let seen_events = ids(previous.events.iter().map(|e| &e.id));
    for event in &current.events {
        if event.active && !seen_events.contains(&event.id) {
            delta.push(Notice::NewEvent {
                event: event.clone(),
            });
        }
    }

    let seen_invasions = ids(previous.invasions.iter().map(|i| &i.id));
    for invasion in &current.invasions {
        if !seen_invasions.contains(&invasion.id) {
            delta.push(Notice::NewInvasion {
                invasion: invasion.clone(),
            });
        }
    }

    let seen_challenges = ids(previous.challenges.iter().map(|c| &c.id));
    let new_ids: Vec<FactId> = current
        .challenges
        .iter()
        .filter(|c| !seen_challenges.contains(&c.id))
        .map(|c| c.id.clone())
        .collect();
    if !new_ids.is_empty() {
        delta.push(Notice::ChallengeBatch {
            challenges: current.challenges.clone(),
            new_ids,
        });
    }

    if let Some(trader) = &current.trader
        && trader_changed(previous.trader.as_ref(), trader)
    {
        delta.push(Notice::TraderChanged {
            trader: trader.clone(),
        });
    }

    if let Some(rotation) = &current.boss_rotation
        && rotation_changed(previous.boss_rotation.as_ref(), rotation)
    {
        delta.push(Notice::BossRotationChanged {
            rotation: rotation.clone(),
        });
    }

    delta
}

fn ids<'a>(iter: impl Iterator<Item = &'a FactId>) -> HashSet<&'a FactId> {
    iter.collect()
}

fn trader_changed(previous: Option<&RotatingTrader>, current: &RotatingTrader) -> bool {
    previous.is_none_or(|previous| !previous.tracked_fields_eq(current))
}

fn rotation_changed(previous: Option<&BossRotation>, current: &BossRotation) -> bool {
    previous.is_none_or(|previous| {
        previous.boss != current.boss
            || previous.missions != current.missions
            || previous.expiry != current.expiry
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::snapshot::{
        Cadence, ChallengeFact, Invasion, InvasionSide, TimedFact, TraderItem,
    };
    use chrono::{Duration, TimeZone, Utc};

    fn event(id: &str) -> TimedFact {
        TimedFact {
            id: FactId::from(id),
            description: "Thermia Fractures".to_string(),
            faction: "Corpus".to_string(),
            location: "Orb Vallis".to_string(),
            expiry: None,
            active: true,
            reward: "1x Opticor Vandal".to_string(),
        }
    }

    fn invasion(id: &str) -> Invasion {
        Invasion {
            id: FactId::from(id),
            location: "Ose (Europa)".to_string(),
            description: "Corpus Siege".to_string(),
            attacker: InvasionSide {
                faction: "Corpus".to_string(),
                reward: "1x Wraith Twin Vipers Barrel".to_string(),
            },
            defender: InvasionSide {
                faction: "Grineer".to_string(),
                reward: "3x Mutagen Mass".to_string(),
            },
            progress: 12.0,
            completed: false,
        }
    }

    fn challenge(id: &str) -> ChallengeFact {
        ChallengeFact {
            id: FactId::from(id),
            title: "Rank Up".to_string(),
            description: "Gain a rank on any item".to_string(),
            standing: 1000,
            cadence: Cadence::Daily,
            expiry: None,
        }
    }

    fn trader() -> RotatingTrader {
        RotatingTrader {
            active: false,
            location: "Larunda Relay (Mercury)".to_string(),
            arrival: Utc.with_ymd_and_hms(2026, 10, 16, 13, 0, 0).single(),
            departure: Utc.with_ymd_and_hms(2026, 10, 18, 13, 0, 0).single(),
            inventory: Vec::new(),
        }
    }

    fn rotation() -> BossRotation {
        BossRotation {
            boss: "Archon Amar".to_string(),
            missions: vec![
                "Extermination".to_string(),
                "Survival".to_string(),
                "Assassination".to_string(),
            ],
            expiry: Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).single(),
        }
    }

    fn full_snapshot() -> Snapshot {
        Snapshot {
            events: vec![event("e1")],
            invasions: vec![invasion("i1"), invasion("i2")],
            challenges: vec![challenge("c1")],
            trader: Some(trader()),
            boss_rotation: Some(rotation()),
            ..Snapshot::default()
        }
    }

    #[test]
    fn first_cycle_is_silent() {
        assert!(diff(None, &full_snapshot()).is_empty());
        assert!(diff(None, &Snapshot::default()).is_empty());
    }

    #[test]
    fn identical_snapshots_produce_nothing() {
        let snapshot = full_snapshot();
        assert!(diff(Some(&snapshot), &snapshot).is_empty());
        let empty = Snapshot::default();
        assert!(diff(Some(&empty), &empty).is_empty());
    }

    #[test]
    fn new_event_appears_exactly_once_in_current_order() {
        let previous = full_snapshot();
        let mut current = full_snapshot();
        current.events = vec![event("e3"), event("e1"), event("e2")];

        let delta = diff(Some(&previous), &current);
        let ids: Vec<&str> = delta
            .notices()
            .iter()
            .filter_map(|n| match n {
                Notice::NewEvent { event } => Some(event.id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(ids, vec!["e3", "e2"]);
        assert_eq!(delta.len(), 2);
    }

    #[test]
    fn inactive_new_event_is_not_announced() {
        let previous = Snapshot::default();
        let mut ended = event("ended");
        ended.active = false;
        let current = Snapshot {
            events: vec![ended, event("live")],
            ..Snapshot::default()
        };

        let delta = diff(Some(&previous), &current);
        assert_eq!(delta.len(), 1);
        let Some(Notice::NewEvent { event }) = delta.notices().first() else {
            panic!("expected a new event notice");
        };
        assert_eq!(event.id.as_str(), "live");
    }

    #[test]
    fn event_becoming_active_after_being_seen_stays_quiet() {
        let mut previous = full_snapshot();
        if let Some(e) = previous.events.first_mut() {
            e.active = false;
        }
        let current = full_snapshot();
        assert!(diff(Some(&previous), &current).is_empty());
    }

    #[test]
    fn only_unseen_invasions_are_new() {
        let previous = full_snapshot();
        let mut current = full_snapshot();
        current.invasions.push(invasion("i3"));

        let delta = diff(Some(&previous), &current);
        assert_eq!(delta.len(), 1);
        let Some(Notice::NewInvasion { invasion }) = delta.notices().first() else {
            panic!("expected a new invasion notice");
        };
        assert_eq!(invasion.id.as_str(), "i3");
    }

    #[test]
    fn progress_change_alone_is_not_new() {
        let previous = full_snapshot();
        let mut current = full_snapshot();
        for invasion in &mut current.invasions {
            invasion.progress = 80.0;
        }
        assert!(diff(Some(&previous), &current).is_empty());
    }

    #[test]
    fn new_challenges_are_batched_with_full_set() {
        let previous = full_snapshot();
        let mut current = full_snapshot();
        current.challenges.push(challenge("c2"));
        current.challenges.push(challenge("c3"));

        let delta = diff(Some(&previous), &current);
        assert_eq!(delta.len(), 1);
        let Some(Notice::ChallengeBatch {
            challenges,
            new_ids,
        }) = delta.notices().first()
        else {
            panic!("expected a challenge batch");
        };
        assert_eq!(challenges.len(), 3);
        assert_eq!(new_ids, &vec![FactId::from("c2"), FactId::from("c3")]);
    }

    #[test]
    fn trader_tracked_field_change_is_reported() {
        let previous = full_snapshot();
        let mut current = full_snapshot();
        if let Some(trader) = current.trader.as_mut() {
            trader.active = true;
        }
        let delta = diff(Some(&previous), &current);
        assert_eq!(delta.len(), 1);
        assert_eq!(
            delta.notices().first().map(Notice::notice_type_str),
            Some("trader_changed")
        );
    }

    #[test]
    fn trader_inventory_change_is_ignored() {
        let previous = full_snapshot();
        let mut current = full_snapshot();
        if let Some(trader) = current.trader.as_mut() {
            trader.inventory.push(TraderItem {
                name: "Prisma Grakata".to_string(),
                ducats: 500,
                credits: 200_000,
            });
        }
        assert!(diff(Some(&previous), &current).is_empty());
    }

    #[test]
    fn trader_appearance_is_reported_and_disappearance_is_not() {
        let mut previous = full_snapshot();
        previous.trader = None;
        let current = full_snapshot();
        assert_eq!(diff(Some(&previous), &current).len(), 1);
        assert!(diff(Some(&current), &previous).is_empty());
    }

    #[test]
    fn rotation_mission_order_matters() {
        let previous = full_snapshot();
        let mut current = full_snapshot();
        if let Some(rotation) = current.boss_rotation.as_mut() {
            rotation.missions.reverse();
        }
        let delta = diff(Some(&previous), &current);
        assert_eq!(
            delta.notices().first().map(Notice::notice_type_str),
            Some("boss_rotation_changed")
        );
    }

    #[test]
    fn rotation_expiry_change_is_reported() {
        let previous = full_snapshot();
        let mut current = full_snapshot();
        if let Some(rotation) = current.boss_rotation.as_mut() {
            rotation.expiry = rotation.expiry.map(|e| e + Duration::days(7));
        }
        assert_eq!(diff(Some(&previous), &current).len(), 1);
    }

    #[test]
    fn groups_follow_fixed_order() {
        let previous = Snapshot::default();
        let current = full_snapshot();
        let delta = diff(Some(&previous), &current);
        let kinds: Vec<&str> = delta.notices().iter().map(Notice::notice_type_str).collect();
        assert_eq!(
            kinds,
            vec![
                "new_event",
                "new_invasion",
                "new_invasion",
                "challenge_batch",
                "trader_changed",
                "boss_rotation_changed",
            ]
        );
    }
}
