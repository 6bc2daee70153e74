// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine configuration.
//!
//! Configuration is explicit: build it in code, load it from JSON, or read
//! it from `HEALTHQUEST_*` environment variables, then hand it to
//! [`RulesEngine::new`](crate::RulesEngine::new). The engine never reads
//! ambient state after construction.

use serde::{Deserialize, Serialize};

use crate::difficulty::DifficultyConfig;
use crate::error::{EngineError, Result};
use crate::progression::ProgressionConfig;
use crate::reward::{RewardTable, DEFAULT_REFLECTION_BASE_XP};
use crate::streak::DayBoundary;

/// Environment variable for the positive-sentiment multiplier.
pub const ENV_MULTIPLIER_POS: &str = "HEALTHQUEST_MULTIPLIER_POS";
/// Environment variable for the neutral-sentiment multiplier.
pub const ENV_MULTIPLIER_NEU: &str = "HEALTHQUEST_MULTIPLIER_NEU";
/// Environment variable for the negative-sentiment multiplier.
pub const ENV_MULTIPLIER_NEG: &str = "HEALTHQUEST_MULTIPLIER_NEG";
/// Environment variable for the reflection base XP.
pub const ENV_REFLECTION_BASE_XP: &str = "HEALTHQUEST_REFLECTION_BASE_XP";
/// Environment variable for a fixed day boundary offset in minutes east of UTC.
pub const ENV_UTC_OFFSET_MINUTES: &str = "HEALTHQUEST_UTC_OFFSET_MINUTES";
/// Environment variable for the difficulty lower clamp.
pub const ENV_DIFFICULTY_MIN: &str = "HEALTHQUEST_DIFFICULTY_MIN";
/// Environment variable for the difficulty upper clamp.
pub const ENV_DIFFICULTY_MAX: &str = "HEALTHQUEST_DIFFICULTY_MAX";
/// Environment variable for the sentiment window size.
pub const ENV_DIFFICULTY_WINDOW: &str = "HEALTHQUEST_DIFFICULTY_WINDOW";
/// Environment variable for XP per level.
pub const ENV_BASE_XP_PER_LEVEL: &str = "HEALTHQUEST_BASE_XP_PER_LEVEL";
/// Environment variable for the level cap.
pub const ENV_MAX_LEVEL: &str = "HEALTHQUEST_MAX_LEVEL";

/// Helpers for parsing environment values.
mod env_parse {
    use std::fmt::Display;
    use std::str::FromStr;

    use crate::error::{EngineError, Result};

    fn parse_value<T>(lookup: &dyn Fn(&str) -> Option<String>, key: &str) -> Option<Result<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        lookup(key).map(|val| {
            val.trim()
                .parse()
                .map_err(|e| EngineError::config(format!("invalid {key}: {e}")))
        })
    }

    /// Parse an f64 from an environment variable.
    pub fn parse_f64(lookup: &dyn Fn(&str) -> Option<String>, key: &str) -> Option<Result<f64>> {
        parse_value(lookup, key)
    }

    /// Parse a u32 from an environment variable.
    pub fn parse_u32(lookup: &dyn Fn(&str) -> Option<String>, key: &str) -> Option<Result<u32>> {
        parse_value(lookup, key)
    }

    /// Parse a u64 from an environment variable.
    pub fn parse_u64(lookup: &dyn Fn(&str) -> Option<String>, key: &str) -> Option<Result<u64>> {
        parse_value(lookup, key)
    }

    /// Parse an i32 from an environment variable.
    pub fn parse_i32(lookup: &dyn Fn(&str) -> Option<String>, key: &str) -> Option<Result<i32>> {
        parse_value(lookup, key)
    }

    /// Parse a usize from an environment variable.
    pub fn parse_usize(
        lookup: &dyn Fn(&str) -> Option<String>,
        key: &str,
    ) -> Option<Result<usize>> {
        parse_value(lookup, key)
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sentiment multipliers.
    pub rewards: RewardTable,
    /// Base XP awarded for logging a reflection.
    pub reflection_base_xp: u32,
    /// Day boundary used for streaks and daily windows.
    pub day_boundary: DayBoundary,
    pub difficulty: DifficultyConfig,
    pub progression: ProgressionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rewards: RewardTable::default(),
            reflection_base_xp: DEFAULT_REFLECTION_BASE_XP,
            day_boundary: DayBoundary::Utc,
            difficulty: DifficultyConfig::default(),
            progression: ProgressionConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Softer rewards spread and a narrow difficulty band that leans easy.
    #[must_use]
    pub fn gentle() -> Self {
        Self {
            rewards: RewardTable::new(1.1, 1.0, 0.95),
            difficulty: DifficultyConfig {
                min: 0.5,
                max: 1.2,
                streak_weight: 0.6,
                ..DifficultyConfig::default()
            },
            ..Self::default()
        }
    }

    /// Stronger reward spread and a wider difficulty band.
    #[must_use]
    pub fn challenging() -> Self {
        Self {
            rewards: RewardTable::new(1.5, 1.0, 0.6),
            difficulty: DifficultyConfig {
                min: 0.8,
                max: 2.0,
                challenge_slope: 3.0,
                ..DifficultyConfig::default()
            },
            progression: ProgressionConfig {
                base_xp_per_level: 150,
                ..ProgressionConfig::default()
            },
            ..Self::default()
        }
    }

    /// Set the reward table.
    #[must_use]
    pub fn with_rewards(mut self, rewards: RewardTable) -> Self {
        self.rewards = rewards;
        self
    }

    /// Set the reflection base XP.
    #[must_use]
    pub fn with_reflection_base_xp(mut self, xp: u32) -> Self {
        self.reflection_base_xp = xp;
        self
    }

    /// Set the day boundary.
    #[must_use]
    pub fn with_day_boundary(mut self, boundary: DayBoundary) -> Self {
        self.day_boundary = boundary;
        self
    }

    /// Set the difficulty configuration.
    #[must_use]
    pub fn with_difficulty(mut self, difficulty: DifficultyConfig) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Set the progression configuration.
    #[must_use]
    pub fn with_progression(mut self, progression: ProgressionConfig) -> Self {
        self.progression = progression;
        self
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.rewards.validate()?;
        if self.reflection_base_xp == 0 {
            return Err(EngineError::config("reflection base XP must be positive"));
        }
        self.day_boundary.validate()?;
        self.difficulty.validate()?;
        self.progression.validate()?;
        Ok(())
    }

    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Create configuration from environment variables.
    ///
    /// Unset variables keep their defaults. The result is validated.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup: &dyn Fn(&str) -> Option<String> = &lookup;
        let mut config = Self::default();

        // Rewards
        if let Some(result) = env_parse::parse_f64(lookup, ENV_MULTIPLIER_POS) {
            config.rewards.positive = result?;
        }
        if let Some(result) = env_parse::parse_f64(lookup, ENV_MULTIPLIER_NEU) {
            config.rewards.neutral = result?;
        }
        if let Some(result) = env_parse::parse_f64(lookup, ENV_MULTIPLIER_NEG) {
            config.rewards.negative = result?;
        }
        if let Some(result) = env_parse::parse_u32(lookup, ENV_REFLECTION_BASE_XP) {
            config.reflection_base_xp = result?;
        }

        // Day boundary
        if let Some(result) = env_parse::parse_i32(lookup, ENV_UTC_OFFSET_MINUTES) {
            let minutes = result?;
            config.day_boundary = if minutes == 0 {
                DayBoundary::Utc
            } else {
                DayBoundary::FixedOffset { minutes }
            };
        }

        // Difficulty
        if let Some(result) = env_parse::parse_f64(lookup, ENV_DIFFICULTY_MIN) {
            config.difficulty.min = result?;
        }
        if let Some(result) = env_parse::parse_f64(lookup, ENV_DIFFICULTY_MAX) {
            config.difficulty.max = result?;
        }
        if let Some(result) = env_parse::parse_usize(lookup, ENV_DIFFICULTY_WINDOW) {
            config.difficulty.window = result?;
        }

        // Progression
        if let Some(result) = env_parse::parse_u64(lookup, ENV_BASE_XP_PER_LEVEL) {
            config.progression.base_xp_per_level = result?;
        }
        if let Some(result) = env_parse::parse_u32(lookup, ENV_MAX_LEVEL) {
            config.progression.max_level = result?;
        }

        config.validate()?;
        Ok(config)
    }
}
