// SPDX-License-Identifier: MIT OR Apache-2.0
//! Adaptive difficulty from recent mood and streak consistency.
//!
//! The adapter folds a [`DifficultySignal`] into a performance score in
//! `[0, 1]` and maps it through a piecewise, non-decreasing curve to a
//! bounded multiplier. Sentiment analysis itself happens elsewhere; only
//! labels are consumed here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::model::{ActivityLog, Sentiment};
use crate::streak::{StreakCalculator, StreakState};

/// Feedback when difficulty rises above 1.2.
pub const FEEDBACK_CHALLENGE: &str = "You're crushing your goals! Here's a greater challenge!";
/// Feedback when difficulty drops below 0.8.
pub const FEEDBACK_EASE: &str = "Let's ease up a bit. Progress is more important than perfection!";
/// Feedback otherwise.
pub const FEEDBACK_STEADY: &str = "You're on the perfect track! Keep up the great work!";

const NEUTRAL_MOOD: f64 = 0.5;

/// Difficulty curve and signal weighting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    /// Lower clamp.
    pub min: f64,
    /// Upper clamp.
    pub max: f64,
    /// Scores below this ease the difficulty.
    pub low_threshold: f64,
    /// Scores above this raise the difficulty.
    pub high_threshold: f64,
    /// Added to low scores.
    pub ease_offset: f64,
    /// Slope applied above `high_threshold`.
    pub challenge_slope: f64,
    /// Number of most recent sentiments considered.
    pub window: usize,
    /// Fewer sentiments than this count as no mood data.
    pub min_samples: usize,
    /// Share of the score taken from the streak, in `[0, 1]`.
    pub streak_weight: f64,
    /// Streak length that saturates the streak component.
    pub streak_target_days: u32,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            min: 0.5,
            max: 1.5,
            low_threshold: 0.4,
            high_threshold: 0.8,
            ease_offset: 0.3,
            challenge_slope: 2.0,
            window: 7,
            min_samples: 3,
            streak_weight: 0.4,
            streak_target_days: 7,
        }
    }
}

impl DifficultyConfig {
    /// Checks ranges and ordering.
    pub fn validate(&self) -> Result<()> {
        let finite = [
            self.min,
            self.max,
            self.low_threshold,
            self.high_threshold,
            self.ease_offset,
            self.challenge_slope,
            self.streak_weight,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(EngineError::config("difficulty settings must be finite"));
        }
        if self.min <= 0.0 || self.min > 1.0 || self.max < 1.0 {
            return Err(EngineError::config(format!(
                "difficulty range must satisfy 0 < min <= 1 <= max, got [{}, {}]",
                self.min, self.max
            )));
        }
        if !(0.0..=1.0).contains(&self.low_threshold)
            || !(0.0..=1.0).contains(&self.high_threshold)
            || self.low_threshold > self.high_threshold
        {
            return Err(EngineError::config(format!(
                "difficulty thresholds must satisfy 0 <= low <= high <= 1, got {} / {}",
                self.low_threshold, self.high_threshold
            )));
        }
        if self.ease_offset < 0.0 || self.challenge_slope < 0.0 {
            return Err(EngineError::config(
                "difficulty ease offset and challenge slope must not be negative",
            ));
        }
        if self.window == 0 || self.min_samples == 0 {
            return Err(EngineError::config(
                "difficulty window and min samples must be at least 1",
            ));
        }
        if self.min_samples > self.window {
            return Err(EngineError::config(format!(
                "difficulty min samples {} exceed the window of {}",
                self.min_samples, self.window
            )));
        }
        if !(0.0..=1.0).contains(&self.streak_weight) {
            return Err(EngineError::config(format!(
                "streak weight must be in [0, 1], got {}",
                self.streak_weight
            )));
        }
        if self.streak_target_days == 0 {
            return Err(EngineError::config("streak target days must be at least 1"));
        }
        Ok(())
    }
}

/// Inputs to the difficulty adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DifficultySignal {
    /// Sentiments oldest first.
    pub recent_sentiments: Vec<Sentiment>,
    pub streak: Option<StreakState>,
}

impl DifficultySignal {
    /// Builds a signal from sentiments only.
    #[must_use]
    pub fn from_sentiments(recent_sentiments: Vec<Sentiment>) -> Self {
        Self {
            recent_sentiments,
            streak: None,
        }
    }

    /// Builds a signal from logs, ordering sentiments by timestamp.
    #[must_use]
    pub fn from_logs(logs: &[ActivityLog], streaks: &StreakCalculator, now: DateTime<Utc>) -> Self {
        let mut ordered: Vec<&ActivityLog> = logs.iter().collect();
        ordered.sort_by_key(|log| log.timestamp);
        Self {
            recent_sentiments: ordered.iter().map(|log| log.sentiment).collect(),
            streak: Some(streaks.calculate(logs, now)),
        }
    }

    /// Attaches a streak.
    #[must_use]
    pub fn with_streak(mut self, streak: StreakState) -> Self {
        self.streak = Some(streak);
        self
    }
}

/// Difficulty response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyState {
    pub difficulty: f64,
    pub feedback: String,
    /// Score the difficulty was derived from; absent without enough data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_score: Option<f64>,
}

impl DifficultyState {
    /// Difficulty 1.0 with steady feedback.
    #[must_use]
    pub fn neutral() -> Self {
        Self {
            difficulty: 1.0,
            feedback: FEEDBACK_STEADY.to_string(),
            performance_score: None,
        }
    }
}

/// Maps performance signals to a bounded difficulty multiplier.
#[derive(Debug, Clone, Copy)]
pub struct DifficultyAdapter {
    config: DifficultyConfig,
}

impl DifficultyAdapter {
    /// Creates an adapter over a validated configuration.
    pub fn new(config: DifficultyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub const fn config(&self) -> &DifficultyConfig {
        &self.config
    }

    /// Performance score in `[0, 1]`, or `None` without enough data.
    #[must_use]
    pub fn performance_score(&self, signal: &DifficultySignal) -> Option<f64> {
        let mood = self.mood(&signal.recent_sentiments);
        match (signal.streak, mood) {
            (None, None) => None,
            (None, Some(mood)) => Some(mood),
            (Some(streak), mood) => {
                let target = self.config.streak_target_days;
                let consistency =
                    f64::from(streak.live_current().min(target)) / f64::from(target);
                let mood = mood.unwrap_or(NEUTRAL_MOOD);
                let w = self.config.streak_weight;
                Some((w * consistency + (1.0 - w) * mood).clamp(0.0, 1.0))
            }
        }
    }

    /// Maps a score to a difficulty within `[min, max]`. Non-decreasing.
    #[must_use]
    pub fn curve(&self, score: f64) -> f64 {
        let c = &self.config;
        let score = score.clamp(0.0, 1.0);
        let raw = if score > c.high_threshold {
            1.0 + (score - c.high_threshold) * c.challenge_slope
        } else if score < c.low_threshold {
            (score + c.ease_offset).min(1.0)
        } else {
            1.0
        };
        raw.clamp(c.min, c.max)
    }

    /// Computes difficulty and feedback.
    #[must_use]
    pub fn adapt(&self, signal: &DifficultySignal) -> DifficultyState {
        let Some(score) = self.performance_score(signal) else {
            debug!(
                samples = signal.recent_sentiments.len(),
                "not enough data for difficulty, using neutral"
            );
            return DifficultyState::neutral();
        };
        let difficulty = self.curve(score);
        debug!(score, difficulty, "adapted difficulty");
        DifficultyState {
            difficulty,
            feedback: feedback_for(difficulty).to_string(),
            performance_score: Some(score),
        }
    }

    fn mood(&self, sentiments: &[Sentiment]) -> Option<f64> {
        let start = sentiments.len().saturating_sub(self.config.window);
        let window = &sentiments[start..];
        if window.len() < self.config.min_samples {
            return None;
        }
        let positives = window.iter().filter(|s| **s == Sentiment::Positive).count();
        Some(positives as f64 / window.len() as f64)
    }
}

impl Default for DifficultyAdapter {
    fn default() -> Self {
        Self {
            config: DifficultyConfig::default(),
        }
    }
}

/// Feedback text for a difficulty value.
#[must_use]
pub fn feedback_for(difficulty: f64) -> &'static str {
    if difficulty > 1.2 {
        FEEDBACK_CHALLENGE
    } else if difficulty < 0.8 {
        FEEDBACK_EASE
    } else {
        FEEDBACK_STEADY
    }
}
