// SPDX-License-Identifier: MIT OR Apache-2.0
//! HealthQuest gamification rules.
//!
//! This crate turns raw activity logs and user records into rewards. It
//! provides:
//!
//! - Streaks over consecutive calendar days with an explicit day boundary
//! - Sentiment-weighted XP awards
//! - An ability tree with level and prerequisite gates
//! - Adaptive difficulty from mood and streak consistency
//! - Levels, quest completion, achievements and leaderboards
//!
//! Every operation is a pure function over in-memory data. Persistence,
//! sentiment analysis and coaching text live in other services.
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use healthquest_rules::{ActivityLog, EngineConfig, RulesEngine, Sentiment};
//!
//! let engine = RulesEngine::new(EngineConfig::default()).unwrap();
//! let logs: Vec<ActivityLog> = (1..=3)
//!     .map(|d| {
//!         let ts = Utc.with_ymd_and_hms(2024, 1, d, 9, 0, 0).unwrap();
//!         ActivityLog::new(ts, Sentiment::Positive, 1.2).unwrap()
//!     })
//!     .collect();
//!
//! let now = Utc.with_ymd_and_hms(2024, 1, 3, 23, 0, 0).unwrap();
//! let streak = engine.streak(&logs, now);
//! assert_eq!(streak.current, 3);
//! assert!(!streak.stale);
//!
//! let award = engine.reflection_reward(Sentiment::Positive).unwrap();
//! assert_eq!(award.awarded_xp, 12);
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_possible_truncation)] // rounded XP and targets are small and non-negative
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

pub mod abilities;
pub mod achievements;
pub mod config;
pub mod difficulty;
pub mod error;
pub mod leaderboard;
pub mod model;
pub mod progression;
pub mod quests;
pub mod reward;
pub mod streak;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

pub use abilities::{Ability, AbilityCatalog, AbilityStat, AbilityStatus};
pub use achievements::{
    Achievement, AchievementCatalog, AchievementCategory, AchievementContext, AchievementReport,
    AchievementTier, Criterion,
};
pub use config::EngineConfig;
pub use difficulty::{DifficultyAdapter, DifficultyConfig, DifficultySignal, DifficultyState};
pub use error::{EngineError, Result};
pub use leaderboard::{LeaderboardEntry, LeaderboardMetric};
pub use model::{ActivityLog, CoachingResponse, Sentiment, UserRecord};
pub use progression::{
    HeroState, HeroStats, LevelProgress, LevelUpOutcome, ProgressionConfig, QuestCompletion,
};
pub use quests::{ActivityType, PersonalizedQuest, Quest, QuestCatalog};
pub use reward::{RewardEvaluator, RewardTable, XpAward};
pub use streak::{DayBoundary, StreakCalculator, StreakState};

/// Neutral multiplier used when a sentiment cannot be evaluated.
pub const FALLBACK_MULTIPLIER: f64 = 1.0;

/// Rules engine built from explicit configuration and catalogs.
///
/// Immutable after construction and safe to share across threads.
#[derive(Debug, Clone)]
pub struct RulesEngine {
    config: EngineConfig,
    rewards: RewardEvaluator,
    streaks: StreakCalculator,
    difficulty: DifficultyAdapter,
    abilities: AbilityCatalog,
    achievements: AchievementCatalog,
    quests: QuestCatalog,
}

impl RulesEngine {
    /// Creates an engine with the standard catalogs.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_catalogs(
            config,
            AbilityCatalog::standard(),
            AchievementCatalog::standard(),
            QuestCatalog::standard(),
        )
    }

    /// Creates an engine with custom catalogs.
    pub fn with_catalogs(
        config: EngineConfig,
        abilities: AbilityCatalog,
        achievements: AchievementCatalog,
        quests: QuestCatalog,
    ) -> Result<Self> {
        config.validate()?;
        let engine = Self {
            rewards: RewardEvaluator::new(config.rewards)?,
            streaks: StreakCalculator::new(config.day_boundary),
            difficulty: DifficultyAdapter::new(config.difficulty)?,
            config,
            abilities,
            achievements,
            quests,
        };
        debug!(
            abilities = engine.abilities.len(),
            achievements = engine.achievements.achievements().len(),
            quests = engine.quests.quests().len(),
            "rules engine ready"
        );
        Ok(engine)
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn abilities(&self) -> &AbilityCatalog {
        &self.abilities
    }

    #[must_use]
    pub const fn achievements(&self) -> &AchievementCatalog {
        &self.achievements
    }

    #[must_use]
    pub const fn quests(&self) -> &QuestCatalog {
        &self.quests
    }

    // ---- Streaks and rewards ----

    /// Streak state of `logs` as of `now`.
    #[must_use]
    pub fn streak(&self, logs: &[ActivityLog], now: DateTime<Utc>) -> StreakState {
        self.streaks.calculate(logs, now)
    }

    /// XP award for `base_xp` at the given sentiment.
    pub fn reward(&self, sentiment: Sentiment, base_xp: u32) -> Result<XpAward> {
        self.rewards.evaluate(sentiment, base_xp)
    }

    /// XP award for a raw sentiment label.
    pub fn reward_label(&self, sentiment: &str, base_xp: u32) -> Result<XpAward> {
        self.rewards.evaluate_label(sentiment, base_xp)
    }

    /// XP award for logging a reflection.
    pub fn reflection_reward(&self, sentiment: Sentiment) -> Result<XpAward> {
        self.rewards.evaluate(sentiment, self.config.reflection_base_xp)
    }

    /// Multiplier for a raw sentiment label, falling back to 1.0 on unknown labels.
    #[must_use]
    pub fn multiplier_or_default(&self, sentiment: &str) -> f64 {
        match sentiment.parse::<Sentiment>() {
            Ok(s) => self.rewards.table().multiplier(s),
            Err(e) => {
                warn!(error = %e, "using fallback multiplier");
                FALLBACK_MULTIPLIER
            }
        }
    }

    // ---- Abilities ----

    /// Classifies every ability for a user level and unlocked set.
    pub fn resolve_abilities(
        &self,
        user_level: u32,
        unlocked: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, AbilityStatus>> {
        self.abilities.resolve(user_level, unlocked)
    }

    /// Classifies every ability for a user record.
    pub fn resolve_for_user(&self, user: &UserRecord) -> Result<BTreeMap<String, AbilityStatus>> {
        self.abilities.resolve(user.level, &user.unlocked_abilities())
    }

    /// Validates that `user` may unlock ability `id` now.
    pub fn check_unlock(&self, user: &UserRecord, id: &str) -> Result<&Ability> {
        self.abilities
            .check_unlock(id, user.level, &user.unlocked_abilities())
    }

    // ---- Difficulty ----

    /// Difficulty from a prepared signal.
    #[must_use]
    pub fn difficulty(&self, signal: &DifficultySignal) -> DifficultyState {
        self.difficulty.adapt(signal)
    }

    /// Difficulty from logs: sentiments by time plus the live streak.
    #[must_use]
    pub fn adapt_difficulty(&self, logs: &[ActivityLog], now: DateTime<Utc>) -> DifficultyState {
        let signal = DifficultySignal::from_logs(logs, &self.streaks, now);
        self.difficulty.adapt(&signal)
    }

    /// Difficulty from raw sentiment labels, oldest first.
    pub fn difficulty_from_labels<S: AsRef<str>>(
        &self,
        labels: &[S],
        streak: Option<StreakState>,
    ) -> Result<DifficultyState> {
        let recent_sentiments = labels
            .iter()
            .map(|label| label.as_ref().parse())
            .collect::<Result<Vec<Sentiment>>>()?;
        let signal = DifficultySignal {
            recent_sentiments,
            streak,
        };
        Ok(self.difficulty.adapt(&signal))
    }

    /// Same as [`difficulty_from_labels`](Self::difficulty_from_labels),
    /// falling back to neutral difficulty on bad labels.
    #[must_use]
    pub fn difficulty_or_default<S: AsRef<str>>(
        &self,
        labels: &[S],
        streak: Option<StreakState>,
    ) -> DifficultyState {
        self.difficulty_from_labels(labels, streak)
            .unwrap_or_else(|e| {
                warn!(error = %e, "using neutral difficulty");
                DifficultyState::neutral()
            })
    }

    // ---- Progression and quests ----

    /// Completes quest `quest_id` for `hero`, returning the new hero state.
    pub fn complete_quest<S: AsRef<str>>(
        &self,
        hero: &HeroState,
        quest_id: &str,
        completed_today: &[S],
    ) -> Result<QuestCompletion> {
        let quest = self.quests.get(quest_id)?;
        progression::complete_quest(hero, quest, completed_today, &self.config.progression)
    }

    /// Applies an XP award to a hero.
    pub fn apply_award(&self, hero: &HeroState, award: &XpAward) -> (HeroState, LevelUpOutcome) {
        let mut hero = hero.clone();
        let outcome = hero.apply_xp(award.awarded_xp, &self.config.progression);
        (hero, outcome)
    }

    /// A quest scaled to `difficulty`.
    pub fn personalized_quest(
        &self,
        activity: ActivityType,
        difficulty: f64,
    ) -> Result<PersonalizedQuest> {
        quests::personalized_quest(activity, difficulty)
    }

    // ---- Achievements and leaderboards ----

    /// Evaluates achievements for a user. Rejects records that fail
    /// [`UserRecord::validate`].
    pub fn evaluate_achievements(
        &self,
        user: &UserRecord,
        logs: &[ActivityLog],
        now: DateTime<Utc>,
        previously_earned: &BTreeSet<String>,
    ) -> Result<AchievementReport> {
        user.validate()?;
        let streak = self.streaks.calculate(logs, now);
        let ctx = AchievementContext {
            user,
            streak: &streak,
            logs,
            now,
            boundary: self.config.day_boundary,
        };
        Ok(self.achievements.evaluate(&ctx, previously_earned))
    }

    /// Ranks users by `metric`.
    pub fn leaderboard(
        &self,
        users: &[UserRecord],
        metric: LeaderboardMetric,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>> {
        leaderboard::rank(users, metric, limit, &self.config.progression)
    }
}
