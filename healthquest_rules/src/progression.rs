// SPDX-License-Identifier: MIT OR Apache-2.0
//! XP, levels and hero stats.
//!
//! Mutations are expressed as commands returning the new authoritative
//! state. Nothing here talks to storage; the caller persists the result.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::model::UserRecord;
use crate::quests::Quest;

/// Level curve and stat growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// XP needed to leave level 1; level `n` needs `n` times this.
    pub base_xp_per_level: u64,
    pub max_level: u32,
    /// Max health at level 1.
    pub base_health: u32,
    /// Max health gained per level.
    pub health_per_level: u32,
    /// Gained by every stat on level-up.
    pub stat_gain_per_level: u32,
    /// Starting value of every stat.
    pub base_stat: u32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            base_xp_per_level: 100,
            max_level: 100,
            base_health: 100,
            health_per_level: 10,
            stat_gain_per_level: 2,
            base_stat: 10,
        }
    }
}

impl ProgressionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.base_xp_per_level == 0 {
            return Err(EngineError::config("base XP per level must be positive"));
        }
        if self.max_level == 0 {
            return Err(EngineError::config("max level must be at least 1"));
        }
        if self.base_health == 0 {
            return Err(EngineError::config("base health must be positive"));
        }
        Ok(())
    }

    /// XP required to advance from `level` to the next one.
    #[must_use]
    pub const fn next_level_xp(&self, level: u32) -> u64 {
        (level as u64).saturating_mul(self.base_xp_per_level)
    }

    /// Max health at `level`.
    #[must_use]
    pub const fn max_health_at(&self, level: u32) -> u32 {
        self.base_health
            .saturating_add(level.saturating_sub(1).saturating_mul(self.health_per_level))
    }

    /// Lifetime XP for a position on the curve.
    #[must_use]
    pub fn total_xp_for(&self, level: u32, current_xp: u64) -> u64 {
        // Sum of l * base for l in 1..level.
        let below = u64::from(level.saturating_sub(1));
        let steps = below.saturating_mul(below + 1) / 2;
        steps
            .saturating_mul(self.base_xp_per_level)
            .saturating_add(current_xp)
    }

    /// Progress within the current level.
    #[must_use]
    pub fn level_progress(&self, level: u32, current_xp: u64) -> LevelProgress {
        let is_max_level = level >= self.max_level;
        let xp_for_level = self.next_level_xp(level);
        let percentage = if is_max_level || xp_for_level == 0 {
            100.0
        } else {
            ((current_xp as f64 / xp_for_level as f64) * 100.0).min(100.0)
        };
        LevelProgress {
            level,
            total_xp: self.total_xp_for(level, current_xp),
            xp_in_level: current_xp,
            xp_for_level,
            percentage,
            is_max_level,
        }
    }
}

/// Progress within the current level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub level: u32,
    /// Lifetime XP.
    pub total_xp: u64,
    /// XP earned within current level.
    pub xp_in_level: u64,
    /// XP required for next level.
    pub xp_for_level: u64,
    /// Percentage progress to next level.
    pub percentage: f64,
    pub is_max_level: bool,
}

/// Hero attributes grown on level-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroStats {
    pub strength: u32,
    pub wisdom: u32,
    pub vitality: u32,
}

impl HeroStats {
    #[must_use]
    pub const fn uniform(value: u32) -> Self {
        Self {
            strength: value,
            wisdom: value,
            vitality: value,
        }
    }

    fn grow(&mut self, by: u32) {
        self.strength = self.strength.saturating_add(by);
        self.wisdom = self.wisdom.saturating_add(by);
        self.vitality = self.vitality.saturating_add(by);
    }
}

/// A user's RPG state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroState {
    pub level: u32,
    /// XP within the current level.
    pub current_xp: u64,
    /// Lifetime XP.
    pub total_xp: u64,
    pub health: u32,
    pub max_health: u32,
    pub stats: HeroStats,
    pub quests_completed: u32,
}

impl HeroState {
    /// A fresh level 1 hero.
    #[must_use]
    pub fn new(config: &ProgressionConfig) -> Self {
        Self {
            level: 1,
            current_xp: 0,
            total_xp: 0,
            health: config.base_health,
            max_health: config.base_health,
            stats: HeroStats::uniform(config.base_stat),
            quests_completed: 0,
        }
    }

    /// Rebuilds hero state from an API user record.
    ///
    /// Stats are not part of the record and are derived from the level.
    pub fn from_record(user: &UserRecord, config: &ProgressionConfig) -> Result<Self> {
        user.validate()?;
        let gained = (user.level - 1).saturating_mul(config.stat_gain_per_level);
        Ok(Self {
            level: user.level,
            current_xp: user.current_xp,
            total_xp: user
                .total_xp
                .unwrap_or_else(|| config.total_xp_for(user.level, user.current_xp)),
            health: user.health,
            max_health: user.max_health,
            stats: HeroStats::uniform(config.base_stat.saturating_add(gained)),
            quests_completed: user.quests_completed,
        })
    }

    /// Adds XP and applies every level-up it triggers.
    pub fn apply_xp(&mut self, xp: u64, config: &ProgressionConfig) -> LevelUpOutcome {
        let starting_level = self.level;
        self.current_xp = self.current_xp.saturating_add(xp);
        self.total_xp = self.total_xp.saturating_add(xp);

        while self.level < config.max_level {
            let threshold = config.next_level_xp(self.level);
            if self.current_xp < threshold {
                break;
            }
            self.current_xp -= threshold;
            self.level += 1;
            self.stats.grow(config.stat_gain_per_level);
            self.max_health = config.max_health_at(self.level);
            self.health = self.max_health;
        }

        let levels_gained = self.level - starting_level;
        if levels_gained > 0 {
            debug!(
                from = starting_level,
                to = self.level,
                "hero leveled up"
            );
        }
        LevelUpOutcome {
            xp_gained: xp,
            leveled_up: levels_gained > 0,
            levels_gained,
            new_level: self.level,
            current_xp: self.current_xp,
            next_level_xp: config.next_level_xp(self.level),
        }
    }

    /// Progress within the current level.
    #[must_use]
    pub fn progress(&self, config: &ProgressionConfig) -> LevelProgress {
        let mut progress = config.level_progress(self.level, self.current_xp);
        progress.total_xp = self.total_xp;
        progress
    }
}

/// Result of applying XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUpOutcome {
    pub xp_gained: u64,
    pub leveled_up: bool,
    pub levels_gained: u32,
    pub new_level: u32,
    pub current_xp: u64,
    pub next_level_xp: u64,
}

/// Authoritative state after completing a quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestCompletion {
    pub quest_id: String,
    pub hero: HeroState,
    pub outcome: LevelUpOutcome,
}

/// Completes a quest for a hero.
///
/// `completed_today` holds quest ids the hero already finished today.
pub fn complete_quest<S: AsRef<str>>(
    hero: &HeroState,
    quest: &Quest,
    completed_today: &[S],
    config: &ProgressionConfig,
) -> Result<QuestCompletion> {
    if completed_today.iter().any(|id| id.as_ref() == quest.id) {
        return Err(EngineError::validation(format!(
            "quest {} already completed today",
            quest.id
        )));
    }
    let mut hero = hero.clone();
    hero.quests_completed = hero.quests_completed.saturating_add(1);
    let outcome = hero.apply_xp(quest.xp_reward, config);
    debug!(
        quest = %quest.id,
        xp = quest.xp_reward,
        level = outcome.new_level,
        "quest completed"
    );
    Ok(QuestCompletion {
        quest_id: quest.id.clone(),
        hero,
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quests::QuestCatalog;

    fn cfg() -> ProgressionConfig {
        ProgressionConfig::default()
    }

    #[test]
    fn test_new_hero() {
        let hero = HeroState::new(&cfg());
        assert_eq!(hero.level, 1);
        assert_eq!(hero.max_health, 100);
        assert_eq!(hero.stats, HeroStats::uniform(10));
    }

    #[test]
    fn test_apply_xp_no_level() {
        let mut hero = HeroState::new(&cfg());
        let outcome = hero.apply_xp(50, &cfg());
        assert!(!outcome.leveled_up);
        assert_eq!(outcome.current_xp, 50);
        assert_eq!(outcome.next_level_xp, 100);
        assert_eq!(hero.total_xp, 50);
    }

    #[test]
    fn test_apply_xp_single_level() {
        let mut hero = HeroState::new(&cfg());
        hero.health = 40;
        let outcome = hero.apply_xp(250, &cfg());
        assert!(outcome.leveled_up);
        assert_eq!(outcome.levels_gained, 1);
        assert_eq!(outcome.new_level, 2);
        assert_eq!(outcome.current_xp, 150);
        assert_eq!(outcome.next_level_xp, 200);
        assert_eq!(hero.max_health, 110);
        assert_eq!(hero.health, 110);
        assert_eq!(hero.stats, HeroStats::uniform(12));
    }

    #[test]
    fn test_apply_xp_multiple_levels() {
        let mut hero = HeroState::new(&cfg());
        // 100 + 200 + 300 = 600 reaches level 4.
        let outcome = hero.apply_xp(650, &cfg());
        assert_eq!(outcome.new_level, 4);
        assert_eq!(outcome.levels_gained, 3);
        assert_eq!(outcome.current_xp, 50);
        assert_eq!(hero.stats.wisdom, 16);
        assert_eq!(hero.total_xp, cfg().total_xp_for(4, 50));
    }

    #[test]
    fn test_apply_xp_at_max_level() {
        let config = ProgressionConfig {
            max_level: 3,
            ..ProgressionConfig::default()
        };
        let mut hero = HeroState::new(&config);
        let outcome = hero.apply_xp(10_000, &config);
        assert_eq!(outcome.new_level, 3);
        assert_eq!(outcome.current_xp, 10_000 - 300);
        assert!(hero.progress(&config).is_max_level);
    }

    #[test]
    fn test_total_xp_for() {
        let c = cfg();
        assert_eq!(c.total_xp_for(1, 0), 0);
        assert_eq!(c.total_xp_for(2, 0), 100);
        assert_eq!(c.total_xp_for(3, 20), 320);
        assert_eq!(c.total_xp_for(0, 5), 5);
    }

    #[test]
    fn test_level_progress() {
        let progress = cfg().level_progress(3, 150);
        assert_eq!(progress.xp_for_level, 300);
        assert!((progress.percentage - 50.0).abs() < 1e-9);
        assert_eq!(progress.total_xp, 450);
        assert!(!progress.is_max_level);
    }

    #[test]
    fn test_from_record() {
        let user: UserRecord = serde_json::from_str(
            r#"{"level":3,"currentXP":20,"nextLevelXP":300,"health":80,"maxHealth":120,"questsCompleted":4}"#,
        )
        .unwrap();
        let hero = HeroState::from_record(&user, &cfg()).unwrap();
        assert_eq!(hero.total_xp, 320);
        assert_eq!(hero.stats.strength, 14);
        assert_eq!(hero.quests_completed, 4);

        let mut bad = user;
        bad.level = 0;
        assert!(HeroState::from_record(&bad, &cfg()).is_err());
    }

    #[test]
    fn test_complete_quest() {
        let catalog = QuestCatalog::standard();
        let quest = catalog.get("quest_4").unwrap();
        let hero = HeroState::new(&cfg());

        let done = complete_quest::<&str>(&hero, quest, &[], &cfg()).unwrap();
        assert_eq!(done.quest_id, "quest_4");
        assert_eq!(done.hero.quests_completed, 1);
        assert_eq!(done.outcome.xp_gained, 150);
        assert!(done.outcome.leveled_up);
        assert_eq!(done.hero.current_xp, 50);
        // Input state untouched.
        assert_eq!(hero.quests_completed, 0);
    }

    #[test]
    fn test_complete_quest_twice_rejected() {
        let catalog = QuestCatalog::standard();
        let quest = catalog.get("quest_1").unwrap();
        let hero = HeroState::new(&cfg());
        let err = complete_quest(&hero, quest, &["quest_1"], &cfg()).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_config_validation() {
        assert!(cfg().validate().is_ok());
        let bad = ProgressionConfig {
            base_xp_per_level: 0,
            ..ProgressionConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
