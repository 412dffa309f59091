//! Canonical identity of a tracked feed fact.
//!
//! [`FactId`] wraps the upstream id string. When the feed omits an id, one
//! is synthesized as a name-based UUID (v5) over stable fields, so the same
//! fact keeps the same identity on every poll and the differ never reports
//! it as new twice.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for synthesized fact ids.
const FACT_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a9e_5b4d_4e0a_9c3f_8d2b_7a61_e054);

/// Non-empty identity of a fact within its category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactId(String);

impl FactId {
    /// Uses the upstream id when it is present and non-blank, otherwise
    /// synthesizes a deterministic one from `stable_parts`.
    #[must_use]
    pub fn from_upstream(upstream: Option<&str>, category: &str, stable_parts: &[&str]) -> Self {
        match upstream.map(str::trim) {
            Some(id) if !id.is_empty() => Self(id.to_string()),
            _ => Self::synthesize(category, stable_parts),
        }
    }

    /// Derives a stable id from the category name and the given fields.
    #[must_use]
    pub fn synthesize(category: &str, stable_parts: &[&str]) -> Self {
        let mut name = String::from(category);
        for part in stable_parts {
            name.push('|');
            name.push_str(part);
        }
        Self(Uuid::new_v5(&FACT_NAMESPACE, name.as_bytes()).to_string())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FactId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}
