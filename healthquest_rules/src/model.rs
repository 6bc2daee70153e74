// SPDX-License-Identifier: MIT OR Apache-2.0
//! Data shapes consumed from the HealthQuest API.
//!
//! The engine does not own these formats. It receives already-deserialized
//! records and only checks domain invariants (enum membership, positive
//! multipliers, level floor).

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Coarse mood classification attached to a reflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Negative,
    Neutral,
    Positive,
}

impl Sentiment {
    /// All sentiments, lowest first.
    pub const ALL: [Sentiment; 3] = [Self::Negative, Self::Neutral, Self::Positive];

    /// Returns the wire label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Negative => "negative",
            Self::Neutral => "neutral",
            Self::Positive => "positive",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "positive" => Ok(Self::Positive),
            "neutral" => Ok(Self::Neutral),
            "negative" => Ok(Self::Negative),
            other => Err(EngineError::validation(format!(
                "unknown sentiment: {other:?}"
            ))),
        }
    }
}

/// Serde adapter for log timestamps.
///
/// Accepts RFC 3339 and offset-less ISO-8601 (read as UTC, which is what the
/// backend emits). Always writes RFC 3339 in UTC.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw:?}")))
    }

    /// Parses a timestamp string in any accepted format.
    #[must_use]
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NAIVE_FORMATS.iter().find_map(|fmt| {
            NaiveDateTime::parse_from_str(raw, fmt)
                .ok()
                .map(|naive| Utc.from_utc_datetime(&naive))
        })
    }
}

fn default_category() -> String {
    "general".to_string()
}

/// One user reflection/check-in event. Append-only.
///
/// Deserialization enforces the same invariants as [`ActivityLog::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawActivityLog")]
pub struct ActivityLog {
    /// Instant of logging.
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Sentiment of the reflection, produced externally.
    pub sentiment: Sentiment,
    /// Reward multiplier applied at logging time.
    pub multiplier: f64,
    /// Free text reflection.
    #[serde(default)]
    pub reflection: String,
    /// Free-form label such as `daily_activity`.
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coaching_message: Option<String>,
}

/// Wire form of [`ActivityLog`] before validation.
#[derive(Deserialize)]
struct RawActivityLog {
    #[serde(with = "timestamp")]
    timestamp: DateTime<Utc>,
    sentiment: Sentiment,
    multiplier: f64,
    #[serde(default)]
    reflection: String,
    #[serde(default = "default_category")]
    category: String,
    #[serde(default)]
    coaching_message: Option<String>,
}

impl TryFrom<RawActivityLog> for ActivityLog {
    type Error = EngineError;

    fn try_from(raw: RawActivityLog) -> Result<Self> {
        let log = Self {
            timestamp: raw.timestamp,
            sentiment: raw.sentiment,
            multiplier: raw.multiplier,
            reflection: raw.reflection,
            category: raw.category,
            coaching_message: raw.coaching_message,
        };
        log.validate()?;
        Ok(log)
    }
}

impl ActivityLog {
    /// Creates a log entry, rejecting non-positive multipliers.
    pub fn new(timestamp: DateTime<Utc>, sentiment: Sentiment, multiplier: f64) -> Result<Self> {
        let log = Self {
            timestamp,
            sentiment,
            multiplier,
            reflection: String::new(),
            category: default_category(),
            coaching_message: None,
        };
        log.validate()?;
        Ok(log)
    }

    /// Sets the reflection text.
    #[must_use]
    pub fn with_reflection(mut self, reflection: impl Into<String>) -> Self {
        self.reflection = reflection.into();
        self
    }

    /// Sets the category label.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Checks the `multiplier > 0` invariant.
    pub fn validate(&self) -> Result<()> {
        if !self.multiplier.is_finite() || self.multiplier <= 0.0 {
            return Err(EngineError::validation(format!(
                "activity log multiplier must be positive, got {}",
                self.multiplier
            )));
        }
        Ok(())
    }
}

/// User record as returned by the API. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default)]
    pub username: String,
    pub level: u32,
    #[serde(rename = "currentXP")]
    pub current_xp: u64,
    #[serde(rename = "nextLevelXP")]
    pub next_level_xp: u64,
    pub health: u32,
    pub max_health: u32,
    #[serde(default)]
    pub quests_completed: u32,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    /// Unlocked ability ids.
    #[serde(default)]
    pub abilities: Vec<String>,
    /// Lifetime XP, when the API provides it.
    #[serde(rename = "totalXP", default, skip_serializing_if = "Option::is_none")]
    pub total_xp: Option<u64>,
}

impl UserRecord {
    /// Checks domain ranges.
    pub fn validate(&self) -> Result<()> {
        if self.level == 0 {
            return Err(EngineError::validation(format!(
                "user {:?} has level 0, levels start at 1",
                self.username
            )));
        }
        if self.max_health == 0 {
            return Err(EngineError::validation(format!(
                "user {:?} has zero max health",
                self.username
            )));
        }
        if self.health > self.max_health {
            return Err(EngineError::validation(format!(
                "user {:?} health {} exceeds max health {}",
                self.username, self.health, self.max_health
            )));
        }
        Ok(())
    }

    /// Unlocked abilities as a set.
    #[must_use]
    pub fn unlocked_abilities(&self) -> BTreeSet<String> {
        self.abilities.iter().cloned().collect()
    }
}

/// Coaching payload from the external AI collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachingResponse {
    pub sentiment: String,
    pub message: String,
}

impl CoachingResponse {
    /// Parses the sentiment label. Unknown labels are rejected.
    pub fn sentiment(&self) -> Result<Sentiment> {
        self.sentiment.parse()
    }
}
