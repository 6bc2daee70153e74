// SPDX-License-Identifier: MIT OR Apache-2.0
//! Achievement definitions and evaluation.
//!
//! Achievements are threshold badges over streaks, reflections, quests and
//! hero state. Earned sets are owned by the caller: evaluation takes the
//! previously earned ids and returns the new set to persist.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::model::{ActivityLog, Sentiment, UserRecord};
use crate::streak::{DayBoundary, StreakState};

/// Achievement tier determining rarity and XP reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementTier {
    /// Common achievements, easy to unlock.
    Bronze,
    /// Uncommon achievements requiring some effort.
    Silver,
    /// Rare achievements for dedicated users.
    Gold,
    /// Legendary achievements.
    Platinum,
}

impl AchievementTier {
    /// Returns the XP reward for unlocking an achievement of this tier.
    #[must_use]
    pub const fn xp_reward(&self) -> u64 {
        match self {
            Self::Bronze => 50,
            Self::Silver => 100,
            Self::Gold => 250,
            Self::Platinum => 500,
        }
    }

    /// Returns the display name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::Platinum => "Platinum",
        }
    }
}

/// Achievement category for grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    /// Streaks and regular logging.
    Consistency,
    /// Reflections and positive outlook.
    Mindset,
    /// Quest completion.
    Questing,
    /// Levels and health.
    Growth,
}

impl AchievementCategory {
    /// Returns the display name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Consistency => "Consistency",
            Self::Mindset => "Mindset",
            Self::Questing => "Questing",
            Self::Growth => "Growth",
        }
    }
}

/// Unlock condition of an achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Criterion {
    /// Live or longest streak reaches `days`.
    StreakAtLeast { days: u32 },
    CurrentStreakAtLeast { days: u32 },
    LongestStreakAtLeast { days: u32 },
    /// Logs with positive sentiment.
    PositiveReflections { count: u32 },
    /// Distinct days with at least one positive log.
    PositiveDays { count: u32 },
    /// Logs with non-empty reflection text.
    Reflections { count: u32 },
    /// At least `logs` logs within the last `days` days, today included.
    ActiveInWindow { days: u32, logs: u32 },
    QuestsCompleted { count: u32 },
    LevelAtLeast { level: u32 },
    /// Health at max health.
    FullHealth,
}

impl Criterion {
    const fn threshold(&self) -> u32 {
        match *self {
            Self::StreakAtLeast { days }
            | Self::CurrentStreakAtLeast { days }
            | Self::LongestStreakAtLeast { days } => days,
            Self::PositiveReflections { count }
            | Self::PositiveDays { count }
            | Self::Reflections { count }
            | Self::QuestsCompleted { count } => count,
            Self::ActiveInWindow { logs, .. } => logs,
            Self::LevelAtLeast { level } => level,
            Self::FullHealth => 1,
        }
    }

    /// `(current, target)` for this criterion.
    #[must_use]
    pub fn progress(&self, ctx: &AchievementContext<'_>) -> (u64, u64) {
        let longest = ctx.streak.longest.max(ctx.user.longest_streak);
        let current = match *self {
            Self::StreakAtLeast { .. } => longest.max(ctx.streak.live_current()),
            Self::CurrentStreakAtLeast { .. } => {
                ctx.streak.live_current().max(ctx.user.current_streak)
            }
            Self::LongestStreakAtLeast { .. } => longest,
            Self::PositiveReflections { .. } => count_u32(
                ctx.logs
                    .iter()
                    .filter(|log| log.sentiment == Sentiment::Positive)
                    .count(),
            ),
            Self::PositiveDays { .. } => {
                let days: HashSet<NaiveDate> = ctx
                    .logs
                    .iter()
                    .filter(|log| log.sentiment == Sentiment::Positive)
                    .map(|log| ctx.boundary.day_of(log.timestamp))
                    .collect();
                count_u32(days.len())
            }
            Self::Reflections { .. } => count_u32(
                ctx.logs
                    .iter()
                    .filter(|log| !log.reflection.trim().is_empty())
                    .count(),
            ),
            Self::ActiveInWindow { days, .. } => {
                let today = ctx.boundary.day_of(ctx.now);
                // Windows reaching past the calendar start cover every log.
                let first = today
                    .checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
                    .unwrap_or(NaiveDate::MIN);
                count_u32(
                    ctx.logs
                        .iter()
                        .map(|log| ctx.boundary.day_of(log.timestamp))
                        .filter(|day| (first..=today).contains(day))
                        .count(),
                )
            }
            Self::QuestsCompleted { .. } => ctx.user.quests_completed,
            Self::LevelAtLeast { .. } => ctx.user.level,
            Self::FullHealth => {
                return (
                    u64::from(ctx.user.health),
                    u64::from(ctx.user.max_health.max(1)),
                );
            }
        };
        (u64::from(current), u64::from(self.threshold()))
    }

    /// Whether the criterion holds.
    #[must_use]
    pub fn is_met(&self, ctx: &AchievementContext<'_>) -> bool {
        let (current, target) = self.progress(ctx);
        current >= target
    }
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// An achievement definition.
#[derive(Debug, Clone, Serialize)]
pub struct Achievement {
    /// Unique identifier.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Description of how to unlock.
    pub description: &'static str,
    pub tier: AchievementTier,
    pub category: AchievementCategory,
    pub criterion: Criterion,
    /// Whether this is a hidden/secret achievement.
    pub hidden: bool,
}

impl Achievement {
    /// Creates a new achievement.
    #[must_use]
    pub const fn new(
        id: &'static str,
        name: &'static str,
        description: &'static str,
        tier: AchievementTier,
        category: AchievementCategory,
        criterion: Criterion,
    ) -> Self {
        Self {
            id,
            name,
            description,
            tier,
            category,
            criterion,
            hidden: false,
        }
    }

    /// Marks as a hidden achievement.
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// The application's badge set.
pub const ACHIEVEMENTS: &[Achievement] = &[
    // Consistency
    Achievement::new(
        "streak-3",
        "3-Day Streak",
        "Log 3 days in a row",
        AchievementTier::Bronze,
        AchievementCategory::Consistency,
        Criterion::StreakAtLeast { days: 3 },
    ),
    Achievement::new(
        "streak-7",
        "7-Day Streak",
        "One week streak",
        AchievementTier::Silver,
        AchievementCategory::Consistency,
        Criterion::StreakAtLeast { days: 7 },
    ),
    Achievement::new(
        "streak-14",
        "14-Day Streak",
        "Two week streak",
        AchievementTier::Gold,
        AchievementCategory::Consistency,
        Criterion::StreakAtLeast { days: 14 },
    ),
    Achievement::new(
        "consistent-5",
        "Consistent 5",
        "Log 5 activities in last 7 days",
        AchievementTier::Bronze,
        AchievementCategory::Consistency,
        Criterion::ActiveInWindow { days: 7, logs: 5 },
    ),
    Achievement::new(
        "week-warrior",
        "Week Warrior",
        "Reach a 7-day longest streak",
        AchievementTier::Silver,
        AchievementCategory::Consistency,
        Criterion::LongestStreakAtLeast { days: 7 },
    ),
    Achievement::new(
        "dedicated",
        "Dedicated",
        "Keep a current streak of 3 days",
        AchievementTier::Bronze,
        AchievementCategory::Consistency,
        Criterion::CurrentStreakAtLeast { days: 3 },
    ),
    // Mindset
    Achievement::new(
        "positive-10",
        "Positive 10",
        "10 positive reflections",
        AchievementTier::Silver,
        AchievementCategory::Mindset,
        Criterion::PositiveReflections { count: 10 },
    ),
    Achievement::new(
        "reflective",
        "Reflective",
        "Write 10 reflections",
        AchievementTier::Silver,
        AchievementCategory::Mindset,
        Criterion::Reflections { count: 10 },
    ),
    Achievement::new(
        "optimist",
        "Optimist",
        "Have 5 positive days",
        AchievementTier::Silver,
        AchievementCategory::Mindset,
        Criterion::PositiveDays { count: 5 },
    ),
    // Questing
    Achievement::new(
        "first-quest",
        "First Quest",
        "Complete your first quest",
        AchievementTier::Bronze,
        AchievementCategory::Questing,
        Criterion::QuestsCompleted { count: 1 },
    ),
    Achievement::new(
        "quest-master",
        "Quest Master",
        "Complete 50 quests",
        AchievementTier::Gold,
        AchievementCategory::Questing,
        Criterion::QuestsCompleted { count: 50 },
    ),
    // Growth
    Achievement::new(
        "level-5",
        "Level 5",
        "Reach level 5",
        AchievementTier::Bronze,
        AchievementCategory::Growth,
        Criterion::LevelAtLeast { level: 5 },
    ),
    Achievement::new(
        "healthy",
        "Healthy",
        "Be at full health",
        AchievementTier::Bronze,
        AchievementCategory::Growth,
        Criterion::FullHealth,
    ),
];

/// Get an achievement from the standard set by ID.
#[must_use]
pub fn get_achievement(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

/// Everything achievement criteria look at.
#[derive(Debug, Clone, Copy)]
pub struct AchievementContext<'a> {
    pub user: &'a UserRecord,
    pub streak: &'a StreakState,
    pub logs: &'a [ActivityLog],
    pub now: DateTime<Utc>,
    pub boundary: DayBoundary,
}

/// Progress toward one achievement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AchievementProgress {
    pub id: &'static str,
    pub current: u64,
    pub target: u64,
    pub earned: bool,
}

/// Outcome of an evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementReport {
    /// Previously earned ids plus those met now. Persist this.
    pub earned: BTreeSet<String>,
    /// Ids earned by this evaluation, in catalog order.
    pub newly_earned: Vec<String>,
    /// Tier XP for the newly earned achievements.
    pub xp_reward: u64,
}

/// Validated achievement set.
#[derive(Debug, Clone)]
pub struct AchievementCatalog {
    achievements: Vec<Achievement>,
}

impl AchievementCatalog {
    /// Builds a catalog, rejecting duplicate ids and zero thresholds.
    pub fn new(achievements: Vec<Achievement>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(achievements.len());
        for achievement in &achievements {
            if !seen.insert(achievement.id) {
                return Err(EngineError::config(format!(
                    "duplicate achievement id: {}",
                    achievement.id
                )));
            }
            let zero_window = matches!(
                achievement.criterion,
                Criterion::ActiveInWindow { days: 0, .. }
            );
            if achievement.criterion.threshold() == 0 || zero_window {
                return Err(EngineError::config(format!(
                    "achievement {} has a zero threshold",
                    achievement.id
                )));
            }
        }
        Ok(Self { achievements })
    }

    /// The standard badge set.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            achievements: ACHIEVEMENTS.to_vec(),
        }
    }

    #[must_use]
    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    pub fn get(&self, id: &str) -> Result<&Achievement> {
        self.achievements
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| EngineError::not_found(format!("achievement {id}")))
    }

    /// Get all achievements in a category.
    #[must_use]
    pub fn by_category(&self, category: AchievementCategory) -> Vec<&Achievement> {
        self.achievements
            .iter()
            .filter(|a| a.category == category)
            .collect()
    }

    /// Get all achievements of a tier.
    #[must_use]
    pub fn by_tier(&self, tier: AchievementTier) -> Vec<&Achievement> {
        self.achievements.iter().filter(|a| a.tier == tier).collect()
    }

    /// Progress toward every achievement. Already earned ones stay earned.
    #[must_use]
    pub fn progress(
        &self,
        ctx: &AchievementContext<'_>,
        previously_earned: &BTreeSet<String>,
    ) -> Vec<AchievementProgress> {
        self.achievements
            .iter()
            .map(|a| {
                let (current, target) = a.criterion.progress(ctx);
                AchievementProgress {
                    id: a.id,
                    current,
                    target,
                    earned: current >= target || previously_earned.contains(a.id),
                }
            })
            .collect()
    }

    /// Evaluates every achievement against `ctx`.
    #[must_use]
    pub fn evaluate(
        &self,
        ctx: &AchievementContext<'_>,
        previously_earned: &BTreeSet<String>,
    ) -> AchievementReport {
        let mut report = AchievementReport {
            earned: previously_earned.clone(),
            ..AchievementReport::default()
        };
        for achievement in &self.achievements {
            if previously_earned.contains(achievement.id) || !achievement.criterion.is_met(ctx) {
                continue;
            }
            report.earned.insert(achievement.id.to_string());
            report.newly_earned.push(achievement.id.to_string());
            report.xp_reward += achievement.tier.xp_reward();
        }
        debug!(
            earned = report.earned.len(),
            newly_earned = report.newly_earned.len(),
            xp_reward = report.xp_reward,
            "evaluated achievements"
        );
        report
    }
}
