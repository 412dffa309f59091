//! Reward shapes and their canonical rendering.
//!
//! The feed sends a reward either as a plain string or as an object with
//! any combination of `credits`, `items` and `countedItems`. [`Reward`]
//! models that as a tagged union; [`Reward::render`] turns it into the
//! canonical reward string that filters are matched against.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Rendered when a reward has no displayable part.
pub const NO_REWARD: &str = "No reward";

/// Separator between rendered reward parts.
const PART_SEPARATOR: &str = ", ";

/// A stack of identical items, e.g. `3x Nitain Extract`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountedItem {
    /// Stack size.
    pub count: u32,
    /// Item name.
    pub item_type: String,
}

/// Structured reward: every part is optional and parts combine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardBundle {
    /// Credit amount; non-positive values are not rendered.
    pub credits: i64,
    /// Single items.
    pub items: Vec<String>,
    /// Counted item stacks.
    pub counted_items: Vec<CountedItem>,
}

/// Upstream reward in one of its two shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Reward {
    /// The feed already sent a display string.
    Text {
        /// Display string as sent.
        text: String,
    },
    /// The feed sent a structured object.
    Bundle(RewardBundle),
}

impl Default for Reward {
    fn default() -> Self {
        Self::Bundle(RewardBundle::default())
    }
}

impl Reward {
    /// Reads a reward from its raw JSON value.
    ///
    /// Strings become [`Reward::Text`], objects become [`Reward::Bundle`];
    /// anything else (including `null`) is an empty bundle. Malformed parts
    /// are skipped rather than failing the whole reward.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(text) => Self::Text { text: text.clone() },
            Value::Object(map) => {
                let credits = map.get("credits").and_then(as_i64).unwrap_or(0);

                let items = map
                    .get("items")
                    .and_then(Value::as_array)
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(Value::as_str)
                            .filter(|item| !item.trim().is_empty())
                            .map(|item| item.trim().to_string())
                            .collect()
                    })
                    .unwrap_or_default();

                let counted_items = map
                    .get("countedItems")
                    .and_then(Value::as_array)
                    .map(|stacks| stacks.iter().filter_map(parse_counted_item).collect())
                    .unwrap_or_default();

                Self::Bundle(RewardBundle {
                    credits,
                    items,
                    counted_items,
                })
            }
            _ => Self::default(),
        }
    }

    /// Renders the canonical reward string.
    ///
    /// Counted stacks come first, then single items, then credits, joined
    /// with `", "`. Returns [`NO_REWARD`] when nothing is displayable.
    #[must_use]
    pub fn render(&self) -> String {
        let parts: Vec<String> = match self {
            Self::Text { text } => {
                let text = text.trim();
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![text.to_string()]
                }
            }
            Self::Bundle(bundle) => {
                let mut parts = Vec::new();
                for stack in &bundle.counted_items {
                    let name = stack.item_type.trim();
                    if !name.is_empty() {
                        parts.push(format!("{}x {name}", stack.count));
                    }
                }
                parts.extend(
                    bundle
                        .items
                        .iter()
                        .map(|item| item.trim())
                        .filter(|item| !item.is_empty())
                        .map(str::to_string),
                );
                if bundle.credits > 0 {
                    parts.push(format!("{} credits", group_thousands(bundle.credits)));
                }
                parts
            }
        };

        if parts.is_empty() {
            NO_REWARD.to_string()
        } else {
            parts.join(PART_SEPARATOR)
        }
    }
}

fn parse_counted_item(value: &Value) -> Option<CountedItem> {
    let item_type = value.get("type").and_then(Value::as_str)?.trim().to_string();
    if item_type.is_empty() {
        return None;
    }
    let count = value
        .get("count")
        .and_then(as_i64)
        .and_then(|count| u32::try_from(count).ok())
        .unwrap_or(1);
    Some(CountedItem { count, item_type })
}

/// Accepts integers, floats and numeric strings.
fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Formats `12500` as `"12,500"`.
pub(crate) fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        grouped.insert(0, '-');
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn credits_only_renders_amount() {
        let reward = Reward::from_value(&json!({ "credits": 500 }));
        let rendered = reward.render();
        assert!(rendered.contains("500"));
        assert_eq!(rendered, "500 credits");
    }

    #[test]
    fn rendering_is_stable() {
        let reward = Reward::from_value(&json!({
            "credits": 12500,
            "items": ["Orokin Catalyst"],
            "countedItems": [{ "count": 2, "type": "Nitain Extract" }]
        }));
        assert_eq!(reward.render(), reward.render());
        assert_eq!(
            reward.render(),
            "2x Nitain Extract, Orokin Catalyst, 12,500 credits"
        );
    }

    #[test]
    fn empty_object_renders_sentinel() {
        assert_eq!(Reward::from_value(&json!({})).render(), NO_REWARD);
        assert_eq!(Reward::from_value(&Value::Null).render(), NO_REWARD);
    }

    #[test]
    fn string_shape_is_used_verbatim() {
        let reward = Reward::from_value(&json!("  Forma Blueprint "));
        assert_eq!(reward.render(), "Forma Blueprint");
        assert_eq!(Reward::from_value(&json!("   ")).render(), NO_REWARD);
    }

    #[test]
    fn counted_item_defaults_count_and_skips_blank_types() {
        let reward = Reward::from_value(&json!({
            "countedItems": [{ "type": "Fieldron" }, { "count": 3, "type": "  " }],
            "items": ["", "  "]
        }));
        assert_eq!(reward.render(), "1x Fieldron");
    }

    #[test]
    fn zero_or_negative_credits_are_hidden() {
        let reward = Reward::Bundle(RewardBundle {
            credits: -10,
            ..RewardBundle::default()
        });
        assert_eq!(reward.render(), NO_REWARD);
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
        assert_eq!(group_thousands(-4500), "-4,500");
    }
}
