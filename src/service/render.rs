//! Plain-text message templates.
//!
//! Notices and on-demand views share the same per-fact blocks, so a new
//! invasion notification and the `/invasions` view look alike. Instants
//! are printed in UTC.

use chrono::{DateTime, Utc};

use crate::domain::reward::group_thousands;
use crate::domain::{
    BossRotation, Cadence, ChallengeFact, CycleState, FactId, Invasion, LegacyAlert, Notice,
    RotatingTrader, Snapshot, Subscriber, TimedFact,
};

/// Shown where an instant is absent.
const UNKNOWN_TIME: &str = "unknown";

/// Shown where a countdown has run out.
pub const EXPIRED: &str = "expired";

/// Renders the message sent for one notice.
#[must_use]
pub fn notice(notice: &Notice) -> String {
    match notice {
        Notice::NewEvent { event: e } => format!("🚨 New event!\n\n{}", event(e)),
        Notice::NewInvasion { invasion: i } => format!("⚔️ New invasion!\n\n{}", invasion(i)),
        Notice::ChallengeBatch {
            challenges,
            new_ids,
        } => format!(
            "🌟 New nightwave challenges!\n\n{}",
            challenge_list(challenges, new_ids)
        ),
        Notice::TraderChanged { trader: t } => trader(t),
        Notice::BossRotationChanged { rotation } => {
            format!("🎭 New archon hunt!\n\n{}", boss_rotation(rotation))
        }
    }
}

fn event(event: &TimedFact) -> String {
    format!(
        "📍 {}\n👾 {}\n📝 {}\n💎 Reward: {}\n⏰ Until: {}",
        event.location,
        event.faction,
        event.description,
        event.reward,
        instant(event.expiry)
    )
}

fn invasion(invasion: &Invasion) -> String {
    format!(
        "📍 {}\n🔵 {} ({})\n🔴 {} ({})\n📊 Progress: {:.1}%",
        invasion.location,
        invasion.attacker.faction,
        invasion.attacker.reward,
        invasion.defender.faction,
        invasion.defender.reward,
        invasion.progress
    )
}

fn challenge(challenge: &ChallengeFact, is_new: bool) -> String {
    let marker = if is_new { "🆕 " } else { "" };
    format!(
        "• {marker}{} ({} standing)\n  {}\n  ⏰ Until: {}",
        challenge.title,
        group_thousands(challenge.standing),
        challenge.description,
        instant(challenge.expiry)
    )
}

/// Challenges grouped by cadence; ids in `new_ids` are marked.
fn challenge_list(challenges: &[ChallengeFact], new_ids: &[FactId]) -> String {
    let sections = [
        ("Daily", Cadence::Daily),
        ("Weekly", Cadence::Weekly),
        ("Elite weekly", Cadence::EliteWeekly),
    ];
    sections
        .iter()
        .filter_map(|(title, cadence)| {
            let entries: Vec<String> = challenges
                .iter()
                .filter(|c| c.cadence == *cadence)
                .map(|c| challenge(c, new_ids.contains(&c.id)))
                .collect();
            (!entries.is_empty()).then(|| format!("== {title} ==\n{}", entries.join("\n\n")))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn trader(trader: &RotatingTrader) -> String {
    let mut message = format!("👑 Void trader\n\n📍 Location: {}\n", trader.location);
    if trader.active && !trader.inventory.is_empty() {
        message.push_str("\nInventory:\n");
        let items: Vec<String> = trader
            .inventory
            .iter()
            .map(|item| {
                format!(
                    "• {} ({} ducats, {} credits)",
                    item.name,
                    item.ducats,
                    group_thousands(item.credits)
                )
            })
            .collect();
        message.push_str(&items.join("\n"));
    } else if trader.active {
        message.push_str(&format!("\n⏰ Leaves: {}", instant(trader.departure)));
    } else {
        message.push_str(&format!("\n⏰ Arrives: {}", instant(trader.arrival)));
    }
    message
}

fn boss_rotation(rotation: &BossRotation) -> String {
    let missions: Vec<String> = rotation
        .missions
        .iter()
        .enumerate()
        .map(|(i, m)| format!("{}. {m}", i + 1))
        .collect();
    format!(
        "👑 Boss: {}\n\nMissions:\n{}\n\n⏰ Until: {}",
        rotation.boss,
        missions.join("\n"),
        instant(rotation.expiry)
    )
}

/// `/events` view: active events of the latest snapshot.
#[must_use]
pub fn events_view(snapshot: &Snapshot) -> String {
    let active: Vec<String> = snapshot
        .events
        .iter()
        .filter(|e| e.active)
        .map(event)
        .collect();
    if active.is_empty() {
        return "There are no active events right now.".to_string();
    }
    format!("🚨 Active events:\n\n{}", active.join("\n\n"))
}

/// `/invasions` view.
#[must_use]
pub fn invasions_view(snapshot: &Snapshot) -> String {
    if snapshot.invasions.is_empty() {
        return "There are no active invasions right now.".to_string();
    }
    let blocks: Vec<String> = snapshot.invasions.iter().map(invasion).collect();
    format!("⚔️ Active invasions:\n\n{}", blocks.join("\n\n"))
}

/// `/nightwave` view.
#[must_use]
pub fn nightwave_view(snapshot: &Snapshot) -> String {
    if snapshot.challenges.is_empty() {
        return "There are no active nightwave challenges right now.".to_string();
    }
    format!(
        "🌟 Nightwave challenges:\n\n{}",
        challenge_list(&snapshot.challenges, &[])
    )
}

/// `/trader` view.
#[must_use]
pub fn trader_view(snapshot: &Snapshot) -> String {
    snapshot.trader.as_ref().map_or_else(
        || "Void trader information is unavailable.".to_string(),
        trader,
    )
}

/// `/archon` view.
#[must_use]
pub fn boss_rotation_view(snapshot: &Snapshot) -> String {
    snapshot.boss_rotation.as_ref().map_or_else(
        || "Archon hunt information is unavailable.".to_string(),
        |rotation| format!("🎭 Archon hunt\n\n{}", boss_rotation(rotation)),
    )
}

/// `/cycles` view with time remaining relative to `now`.
#[must_use]
pub fn cycles_view(snapshot: &Snapshot, now: DateTime<Utc>) -> String {
    if snapshot.cycles.is_empty() {
        return "Cycle information is unavailable.".to_string();
    }
    let blocks: Vec<String> = snapshot.cycles.iter().map(|c| cycle(c, now)).collect();
    format!("Current cycles:\n\n{}", blocks.join("\n\n"))
}

fn cycle(cycle: &CycleState, now: DateTime<Utc>) -> String {
    let label = match cycle.region.as_str() {
        "earth" => "🌍 Earth",
        "cetus" => "🏰 Cetus",
        "vallis" => "❄️ Orb Vallis",
        "cambion" => "🔥 Cambion Drift",
        other => other,
    };
    format!(
        "{label}\nState: {}\n⏰ Remaining: {}",
        cycle.state,
        time_remaining(cycle.ends_at, now)
    )
}

/// `/alerts` view over the stored legacy alerts.
#[must_use]
pub fn alerts_view(alerts: &[LegacyAlert]) -> String {
    if alerts.is_empty() {
        return "There are no active alerts right now.".to_string();
    }
    let blocks: Vec<String> = alerts.iter().map(alert).collect();
    format!(
        "🚨 Active alerts:\n\n{}\n\nMark one done with /done <id>.",
        blocks.join("\n\n")
    )
}

/// `/completed` view.
#[must_use]
pub fn completed_view(alerts: &[LegacyAlert]) -> String {
    if alerts.is_empty() {
        return "You have not completed any alerts yet.".to_string();
    }
    let blocks: Vec<String> = alerts.iter().map(alert).collect();
    format!("✅ Completed alerts:\n\n{}", blocks.join("\n\n"))
}

fn alert(alert: &LegacyAlert) -> String {
    format!(
        "🆔 {}\n📍 {} ({})\n👾 {} lvl {}-{}\n💎 Reward: {}\n⏰ Until: {}",
        alert.id,
        alert.location,
        alert.mission_type,
        alert.enemy,
        alert.min_enemy_level,
        alert.max_enemy_level,
        alert.reward,
        instant(Some(alert.end))
    )
}

/// `/settings` view.
#[must_use]
pub fn settings(subscriber: &Subscriber) -> String {
    format!(
        "⚙️ Your settings:\n\nNotifications: {}\nLanguage: {}\n\nReward filters:\n{}",
        if subscriber.notifications_enabled {
            "✅"
        } else {
            "❌"
        },
        subscriber.locale,
        filter_lines(subscriber)
    )
}

/// `/filters` view.
#[must_use]
pub fn filters(subscriber: &Subscriber) -> String {
    if subscriber.filters.is_empty() {
        return "You have no active filters; every reward is delivered.".to_string();
    }
    format!("Your filters:\n{}", filter_lines(subscriber))
}

fn filter_lines(subscriber: &Subscriber) -> String {
    if subscriber.filters.is_empty() {
        return "No active filters".to_string();
    }
    subscriber
        .filters
        .iter()
        .map(|f| format!("• {f}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `/help` text.
#[must_use]
pub fn help() -> &'static str {
    "Available commands:\n\n\
     /start - enable notifications\n\
     /stop - disable notifications\n\
     /addfilter <reward> - only notify about matching rewards\n\
     /removefilter <reward> - remove a reward filter\n\
     /filters - show your filters\n\
     /settings - show your settings\n\n\
     /events - active events\n\
     /invasions - active invasions\n\
     /nightwave - nightwave challenges\n\
     /trader - void trader\n\
     /archon - archon hunt\n\
     /cycles - day/night cycles\n\
     /alerts - active alerts\n\
     /done <id> - mark an alert completed\n\
     /completed - alerts you completed\n\
     /help - show this message"
}

/// Countdown from `now` to `ends_at` as `HH:MM:SS`, or [`EXPIRED`].
///
/// Hours are not wrapped at 24.
#[must_use]
pub fn time_remaining(ends_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(ends_at) = ends_at else {
        return EXPIRED.to_string();
    };
    let remaining = ends_at.signed_duration_since(now);
    if remaining < chrono::TimeDelta::zero() {
        return EXPIRED.to_string();
    }
    let secs = remaining.num_seconds();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

fn instant(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(
        || UNKNOWN_TIME.to_string(),
        |at| at.format("%Y-%m-%d %H:%M UTC").to_string(),
    )
}
