//! Tolerant mapping from raw feed JSON to the canonical model.
//!
//! Each function takes the full body of one resource. A body of the wrong
//! top-level shape is a [`NotifierError::Parse`]; anything below that
//! degrades to a fallback literal or a neutral number instead of failing.
//! Elements that are not objects are skipped with a warning.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::resources;
use crate::domain::records::{DEFAULT_MAX_ENEMY_LEVEL, DEFAULT_MIN_ENEMY_LEVEL};
use crate::domain::{
    BossRotation, Cadence, ChallengeFact, CycleState, FactId, Invasion, InvasionSide, LegacyAlert,
    NO_REWARD, Reward, RotatingTrader, TimedFact, TraderItem,
};
use crate::error::NotifierError;

/// Fallback for missing names, factions, locations and states.
pub const UNKNOWN: &str = "Unknown";

/// Fallback for missing descriptions.
pub const NO_DESCRIPTION: &str = "No description";

/// Fallback for missing challenge titles.
pub const UNTITLED: &str = "Untitled";

/// Parses the `events` body.
///
/// # Errors
///
/// Returns [`NotifierError::Parse`] if the body is not an array.
pub fn events(body: &Value) -> Result<Vec<TimedFact>, NotifierError> {
    Ok(elements(resources::EVENTS, body)?
        .map(|e| {
            let location = text(e, &["node"], UNKNOWN);
            let description = text(e, &["description", "desc"], NO_DESCRIPTION);
            let id = FactId::from_upstream(
                e.get("id").and_then(Value::as_str),
                resources::EVENTS,
                &[&location, &description, &stable_time(e)],
            );
            TimedFact {
                id,
                description,
                faction: text(e, &["faction", "affiliatedWith"], UNKNOWN),
                location,
                expiry: instant(e, "expiry"),
                active: flag(e, "active"),
                reward: event_reward(e),
            }
        })
        .collect())
}

/// Parses the `invasions` body, dropping completed invasions.
///
/// # Errors
///
/// Returns [`NotifierError::Parse`] if the body is not an array.
pub fn invasions(body: &Value) -> Result<Vec<Invasion>, NotifierError> {
    Ok(elements(resources::INVASIONS, body)?
        .filter(|i| !flag(i, "completed"))
        .map(|i| {
            let location = text(i, &["node"], UNKNOWN);
            let description = text(i, &["desc", "description"], NO_DESCRIPTION);
            let id = FactId::from_upstream(
                i.get("id").and_then(Value::as_str),
                resources::INVASIONS,
                &[&location, &description, &stable_time(i)],
            );
            Invasion {
                id,
                location,
                description,
                attacker: InvasionSide {
                    faction: side_faction(i, "attackingFaction", "attacker"),
                    reward: side_reward(i, "attackerReward", "attacker"),
                },
                defender: InvasionSide {
                    faction: side_faction(i, "defendingFaction", "defender"),
                    reward: side_reward(i, "defenderReward", "defender"),
                },
                progress: progress_magnitude(float(i, "completion")),
                completed: false,
            }
        })
        .collect())
}

/// Parses the `nightwave` body (an object with `activeChallenges`).
///
/// A season without challenges yields an empty list.
///
/// # Errors
///
/// Returns [`NotifierError::Parse`] if the body is not an object.
pub fn nightwave(body: &Value) -> Result<Vec<ChallengeFact>, NotifierError> {
    object(resources::NIGHTWAVE, body)?;
    let Some(challenges) = body.get("activeChallenges") else {
        return Ok(Vec::new());
    };
    Ok(elements(resources::NIGHTWAVE, challenges)?
        .map(|c| {
            let title = text(c, &["title"], UNTITLED);
            let id = FactId::from_upstream(
                c.get("id").and_then(Value::as_str),
                resources::NIGHTWAVE,
                &[&title, &stable_time(c)],
            );
            ChallengeFact {
                id,
                title,
                description: text(c, &["desc", "description"], NO_DESCRIPTION),
                standing: number(c, &["reputation", "standing"], 0),
                cadence: Cadence::from_flags(flag(c, "isDaily"), flag(c, "isElite")),
                expiry: instant(c, "expiry"),
            }
        })
        .collect())
}

/// Parses the `voidTrader` body.
///
/// # Errors
///
/// Returns [`NotifierError::Parse`] if the body is not an object.
pub fn trader(body: &Value) -> Result<RotatingTrader, NotifierError> {
    object(resources::VOID_TRADER, body)?;
    let inventory = match body.get("inventory") {
        Some(items) => elements(resources::VOID_TRADER, items)?
            .map(|item| TraderItem {
                name: text(item, &["item", "itemName"], UNKNOWN),
                ducats: number(item, &["ducats", "ducatPrice"], 0),
                credits: number(item, &["credits", "creditPrice"], 0),
            })
            .collect(),
        None => Vec::new(),
    };
    Ok(RotatingTrader {
        active: flag(body, "active"),
        location: text(body, &["location"], UNKNOWN),
        arrival: instant(body, "activation"),
        departure: instant(body, "expiry"),
        inventory,
    })
}

/// Parses the `archonHunt` body.
///
/// # Errors
///
/// Returns [`NotifierError::Parse`] if the body is not an object.
pub fn boss_rotation(body: &Value) -> Result<BossRotation, NotifierError> {
    object(resources::ARCHON_HUNT, body)?;
    let missions = match body.get("missions") {
        Some(missions) => elements(resources::ARCHON_HUNT, missions)?
            .map(|m| text(m, &["type"], UNKNOWN))
            .collect(),
        None => Vec::new(),
    };
    Ok(BossRotation {
        boss: text(body, &["boss"], UNKNOWN),
        missions,
        expiry: instant(body, "expiry"),
    })
}

/// Parses one region cycle body.
///
/// # Errors
///
/// Returns [`NotifierError::Parse`] if the body is not an object.
pub fn cycle(resource: &str, region: &str, body: &Value) -> Result<CycleState, NotifierError> {
    object(resource, body)?;
    Ok(CycleState {
        region: region.to_string(),
        state: text(body, &["state"], UNKNOWN),
        ends_at: instant(body, "expiry"),
        is_day: flag(body, "isDay"),
    })
}

/// Parses the legacy `alerts` body.
///
/// Missing enemy level bounds default to 1 and 100; missing start and end
/// instants default to `now`.
///
/// # Errors
///
/// Returns [`NotifierError::Parse`] if the body is not an array.
pub fn alerts(body: &Value, now: DateTime<Utc>) -> Result<Vec<LegacyAlert>, NotifierError> {
    Ok(elements(resources::ALERTS, body)?
        .map(|a| {
            let mission = a.get("mission").unwrap_or(&Value::Null);
            let location = text(mission, &["node"], UNKNOWN);
            let mission_type = text(mission, &["type"], UNKNOWN);
            let id = FactId::from_upstream(
                a.get("id").and_then(Value::as_str),
                resources::ALERTS,
                &[&location, &stable_time(a)],
            );
            LegacyAlert {
                id: id.to_string(),
                mission: mission_type.clone(),
                mission_type,
                reward: mission
                    .get("reward")
                    .map_or_else(|| NO_REWARD.to_string(), |r| Reward::from_value(r).render()),
                location,
                enemy: text(mission, &["faction"], UNKNOWN),
                min_enemy_level: number(mission, &["minEnemyLevel"], DEFAULT_MIN_ENEMY_LEVEL),
                max_enemy_level: number(mission, &["maxEnemyLevel"], DEFAULT_MAX_ENEMY_LEVEL),
                start: instant(a, "activation").unwrap_or(now),
                end: instant(a, "expiry").unwrap_or(now),
                active: a.get("active").and_then(Value::as_bool).unwrap_or(true),
            }
        })
        .collect())
}

/// Normalizes a signed completion percentage to a magnitude in `0..=100`.
#[must_use]
pub fn progress_magnitude(completion: f64) -> f64 {
    if completion.is_finite() {
        completion.abs().min(100.0)
    } else {
        0.0
    }
}

fn elements<'a>(
    resource: &str,
    body: &'a Value,
) -> Result<impl Iterator<Item = &'a Value> + use<'a>, NotifierError> {
    let Some(items) = body.as_array() else {
        return Err(NotifierError::Parse {
            resource: resource.to_string(),
            message: "expected a JSON array".to_string(),
        });
    };
    let resource = resource.to_string();
    Ok(items.iter().filter(move |item| {
        let keep = item.is_object();
        if !keep {
            tracing::warn!(resource = %resource, "skipping non-object element");
        }
        keep
    }))
}

fn object(resource: &str, body: &Value) -> Result<(), NotifierError> {
    if body.is_object() {
        Ok(())
    } else {
        Err(NotifierError::Parse {
            resource: resource.to_string(),
            message: "expected a JSON object".to_string(),
        })
    }
}

/// First non-blank string among `keys`, trimmed, or `fallback`.
fn text(value: &Value, keys: &[&str], fallback: &str) -> String {
    keys.iter()
        .filter_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

fn instant(value: &Value, key: &str) -> Option<DateTime<Utc>> {
    let raw = value.get(key)?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .ok()
}

/// Start instant if present, else expiry, else empty; used for synthesized ids.
fn stable_time(value: &Value) -> String {
    ["activation", "expiry"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string()
}

fn flag(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn number(value: &Value, keys: &[&str], default: i64) -> i64 {
    keys.iter()
        .filter_map(|key| value.get(key))
        .find_map(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f.round() as i64)))
        .unwrap_or(default)
}

fn float(value: &Value, key: &str) -> f64 {
    value.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

fn event_reward(event: &Value) -> String {
    if let Some(reward) = event.get("reward") {
        return Reward::from_value(reward).render();
    }
    let rendered: Vec<String> = event
        .get("rewards")
        .and_then(Value::as_array)
        .map(|rewards| {
            rewards
                .iter()
                .map(|r| Reward::from_value(r).render())
                .filter(|r| r != NO_REWARD)
                .collect()
        })
        .unwrap_or_default();
    if rendered.is_empty() {
        NO_REWARD.to_string()
    } else {
        rendered.join(", ")
    }
}

/// Faction from the flat key, or from the nested side object.
fn side_faction(invasion: &Value, flat_key: &str, side_key: &str) -> String {
    let flat = text(invasion, &[flat_key], "");
    if !flat.is_empty() {
        return flat;
    }
    invasion
        .get(side_key)
        .map_or_else(|| UNKNOWN.to_string(), |side| text(side, &["faction"], UNKNOWN))
}

/// Reward from the flat key, or from the nested side object.
fn side_reward(invasion: &Value, flat_key: &str, side_key: &str) -> String {
    let raw = invasion
        .get(flat_key)
        .or_else(|| invasion.get(side_key).and_then(|side| side.get("reward")));
    raw.map_or_else(|| NO_REWARD.to_string(), |r| Reward::from_value(r).render())
}
