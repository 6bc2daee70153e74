// SPDX-License-Identifier: MIT OR Apache-2.0
//! Daily quest catalog and difficulty-scaled personalized quests.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Difficulty label shown on the quest board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestDifficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestCategory {
    Fitness,
    Nutrition,
    Mental,
}

/// A daily quest definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    pub id: String,
    pub name: String,
    pub description: String,
    pub difficulty: QuestDifficulty,
    pub xp_reward: u64,
    pub category: QuestCategory,
}

impl Quest {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        difficulty: QuestDifficulty,
        xp_reward: u64,
        category: QuestCategory,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            difficulty,
            xp_reward,
            category,
        }
    }
}

/// A quest on the board with today's completion flag.
#[derive(Debug, Clone, Serialize)]
pub struct QuestBoardEntry<'a> {
    #[serde(flatten)]
    pub quest: &'a Quest,
    pub completed: bool,
}

/// Validated quest catalog.
#[derive(Debug, Clone)]
pub struct QuestCatalog {
    quests: Vec<Quest>,
}

impl QuestCatalog {
    /// Builds a catalog, rejecting duplicate ids and zero rewards.
    pub fn new(quests: Vec<Quest>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(quests.len());
        for quest in &quests {
            if !seen.insert(quest.id.as_str()) {
                return Err(EngineError::config(format!("duplicate quest id: {}", quest.id)));
            }
            if quest.xp_reward == 0 {
                return Err(EngineError::config(format!(
                    "quest {} has no XP reward",
                    quest.id
                )));
            }
        }
        Ok(Self { quests })
    }

    /// The default daily quests.
    #[must_use]
    pub fn standard() -> Self {
        use QuestCategory::{Fitness, Mental, Nutrition};
        use QuestDifficulty::{Easy, Hard, Medium};
        Self {
            quests: vec![
                Quest::new("quest_1", "Daily Steps", "Walk 10,000 steps today", Easy, 50, Fitness),
                Quest::new("quest_2", "Hydration Hero", "Drink 8 glasses of water", Medium, 75, Nutrition),
                Quest::new("quest_3", "Meditation Master", "Meditate for 15 minutes", Medium, 100, Mental),
                Quest::new("quest_4", "Strength Training", "Complete 30 push-ups", Hard, 150, Fitness),
                Quest::new("quest_5", "Healthy Meals", "Eat 3 balanced meals", Easy, 50, Nutrition),
            ],
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::new(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn quests(&self) -> &[Quest] {
        &self.quests
    }

    pub fn get(&self, id: &str) -> Result<&Quest> {
        self.quests
            .iter()
            .find(|q| q.id == id)
            .ok_or_else(|| EngineError::not_found(format!("quest {id}")))
    }

    /// All quests with their completion flag for today.
    #[must_use]
    pub fn board<S: AsRef<str>>(&self, completed_today: &[S]) -> Vec<QuestBoardEntry<'_>> {
        let done: HashSet<&str> = completed_today.iter().map(|id| id.as_ref()).collect();
        self.quests
            .iter()
            .map(|quest| QuestBoardEntry {
                quest,
                completed: done.contains(quest.id.as_str()),
            })
            .collect()
    }
}

/// Activity a personalized quest targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Movement,
    Meditation,
    Nutrition,
    Hydration,
    Sleep,
}

impl ActivityType {
    pub const ALL: [ActivityType; 5] = [
        Self::Movement,
        Self::Meditation,
        Self::Nutrition,
        Self::Hydration,
        Self::Sleep,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Movement => "movement",
            Self::Meditation => "meditation",
            Self::Nutrition => "nutrition",
            Self::Hydration => "hydration",
            Self::Sleep => "sleep",
        }
    }

    /// Target at difficulty 1.0.
    #[must_use]
    pub const fn base_target(&self) -> u32 {
        match self {
            Self::Movement => 5000,
            Self::Meditation => 10,
            Self::Nutrition => 3,
            Self::Hydration => 8,
            Self::Sleep => 7,
        }
    }

    /// Unit of the target.
    #[must_use]
    pub const fn unit(&self) -> &'static str {
        match self {
            Self::Movement => "steps",
            Self::Meditation => "minutes",
            Self::Nutrition => "meals",
            Self::Hydration => "glasses",
            Self::Sleep => "hours",
        }
    }

    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Movement => "Movement",
            Self::Meditation => "Meditation",
            Self::Nutrition => "Nutrition",
            Self::Hydration => "Hydration",
            Self::Sleep => "Sleep",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| EngineError::validation(format!("unknown activity type: {s:?}")))
    }
}

/// XP for a personalized quest at difficulty 1.0, before the 1.5 bonus.
pub const PERSONALIZED_BASE_XP: f64 = 50.0;
const PERSONALIZED_XP_BONUS: f64 = 1.5;
const GOLD_PER_XP: f64 = 0.2;

/// A quest scaled to the user's difficulty. Narrative text is produced elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalizedQuest {
    pub title: String,
    pub activity_type: ActivityType,
    pub target: u32,
    pub unit: String,
    pub difficulty: f64,
    pub xp_reward: u64,
    pub gold_reward: u64,
}

/// Scales an activity's base target and rewards by `difficulty`.
pub fn personalized_quest(activity: ActivityType, difficulty: f64) -> Result<PersonalizedQuest> {
    if !difficulty.is_finite() || difficulty <= 0.0 {
        return Err(EngineError::validation(format!(
            "difficulty must be a positive number, got {difficulty}"
        )));
    }
    let target = (f64::from(activity.base_target()) * difficulty).floor().max(1.0) as u32;
    let xp_reward = (PERSONALIZED_BASE_XP * difficulty * PERSONALIZED_XP_BONUS).floor() as u64;
    let gold_reward = (xp_reward as f64 * GOLD_PER_XP).floor() as u64;
    Ok(PersonalizedQuest {
        title: format!("{} Challenge", activity.display_name()),
        activity_type: activity,
        target,
        unit: activity.unit().to_string(),
        difficulty,
        xp_reward,
        gold_reward,
    })
}
