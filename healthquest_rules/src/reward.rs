// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sentiment-driven XP rewards.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::model::Sentiment;

/// Upper bound for any reward multiplier.
pub const MAX_MULTIPLIER: f64 = 2.0;

/// XP awarded for logging a reflection, before the multiplier.
pub const DEFAULT_REFLECTION_BASE_XP: u32 = 10;

/// Multiplier applied per sentiment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardTable {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            positive: 1.2,
            neutral: 1.0,
            negative: 0.8,
        }
    }
}

impl RewardTable {
    /// Creates a table without validating it.
    #[must_use]
    pub const fn new(positive: f64, neutral: f64, negative: f64) -> Self {
        Self {
            positive,
            neutral,
            negative,
        }
    }

    /// Multiplier for a sentiment.
    #[must_use]
    pub const fn multiplier(&self, sentiment: Sentiment) -> f64 {
        match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Neutral => self.neutral,
            Sentiment::Negative => self.negative,
        }
    }

    /// Every value in (0, 2] and `positive >= neutral >= negative`.
    pub fn validate(&self) -> Result<()> {
        for sentiment in Sentiment::ALL {
            let value = self.multiplier(sentiment);
            if !value.is_finite() || value <= 0.0 || value > MAX_MULTIPLIER {
                return Err(EngineError::config(format!(
                    "{sentiment} multiplier must be in (0, {MAX_MULTIPLIER}], got {value}"
                )));
            }
        }
        if self.positive < self.neutral || self.neutral < self.negative {
            return Err(EngineError::config(format!(
                "multipliers must satisfy positive >= neutral >= negative, got {} / {} / {}",
                self.positive, self.neutral, self.negative
            )));
        }
        Ok(())
    }
}

/// XP granted for one logged activity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XpAward {
    pub sentiment: Sentiment,
    pub multiplier: f64,
    pub base_xp: u32,
    /// `round(base_xp * multiplier)`.
    pub awarded_xp: u64,
}

/// Maps sentiment to multiplier and composes XP awards.
#[derive(Debug, Clone, Copy)]
pub struct RewardEvaluator {
    table: RewardTable,
}

impl RewardEvaluator {
    /// Creates an evaluator over a validated table.
    pub fn new(table: RewardTable) -> Result<Self> {
        table.validate()?;
        Ok(Self { table })
    }

    /// The multiplier table in use.
    #[must_use]
    pub const fn table(&self) -> &RewardTable {
        &self.table
    }

    /// Awards XP for an activity with the given sentiment.
    pub fn evaluate(&self, sentiment: Sentiment, base_xp: u32) -> Result<XpAward> {
        if base_xp == 0 {
            return Err(EngineError::validation("base XP must be positive"));
        }
        let multiplier = self.table.multiplier(sentiment);
        let awarded_xp = (f64::from(base_xp) * multiplier).round() as u64;
        Ok(XpAward {
            sentiment,
            multiplier,
            base_xp,
            awarded_xp,
        })
    }

    /// Same as [`evaluate`](Self::evaluate) for a raw sentiment label.
    /// Unknown labels fail; they are never defaulted.
    pub fn evaluate_label(&self, sentiment: &str, base_xp: u32) -> Result<XpAward> {
        self.evaluate(sentiment.parse()?, base_xp)
    }
}
