// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ability tree: a static prerequisite graph classified against a user.
//!
//! The catalog is checked once, when it is built. Evaluation afterwards
//! cannot fail on graph shape: every prerequisite exists, never sits in a
//! higher tier, and the graph is acyclic.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};

/// Hero stat an ability is themed around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbilityStat {
    Strength,
    Wisdom,
    Vitality,
}

/// Unlock state of a catalog node for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbilityStatus {
    /// Level or prerequisites not met.
    Locked,
    /// Can be unlocked now.
    Available,
    /// Already in the user's unlocked set.
    Unlocked,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ability {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub stat: AbilityStat,
    /// Unlock ordering hint, starting at 1.
    pub tier: u32,
    /// Minimum user level.
    pub unlock_level: u32,
    /// Prerequisite ability ids.
    #[serde(default)]
    pub requires: BTreeSet<String>,
}

impl Ability {
    /// Creates an ability with no prerequisites.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        stat: AbilityStat,
        tier: u32,
        unlock_level: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            stat,
            tier,
            unlock_level,
            requires: BTreeSet::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Adds prerequisites.
    #[must_use]
    pub fn requiring<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires.extend(ids.into_iter().map(Into::into));
        self
    }

    fn status(&self, user_level: u32, unlocked: &BTreeSet<String>) -> AbilityStatus {
        if unlocked.contains(&self.id) {
            AbilityStatus::Unlocked
        } else if user_level >= self.unlock_level && self.requires.is_subset(unlocked) {
            AbilityStatus::Available
        } else {
            AbilityStatus::Locked
        }
    }
}

/// Validated, immutable ability catalog.
#[derive(Debug, Clone)]
pub struct AbilityCatalog {
    abilities: Vec<Ability>,
    index: HashMap<String, usize>,
}

impl AbilityCatalog {
    /// Builds a catalog, rejecting malformed graphs.
    pub fn new(abilities: Vec<Ability>) -> Result<Self> {
        let mut index = HashMap::with_capacity(abilities.len());
        for (pos, ability) in abilities.iter().enumerate() {
            if ability.id.is_empty() {
                return Err(EngineError::config("ability id must not be empty"));
            }
            if ability.tier == 0 {
                return Err(EngineError::config(format!(
                    "ability {} has tier 0, tiers start at 1",
                    ability.id
                )));
            }
            if ability.unlock_level == 0 {
                return Err(EngineError::config(format!(
                    "ability {} has unlock level 0, levels start at 1",
                    ability.id
                )));
            }
            if index.insert(ability.id.clone(), pos).is_some() {
                return Err(EngineError::config(format!(
                    "duplicate ability id: {}",
                    ability.id
                )));
            }
        }

        for ability in &abilities {
            for req in &ability.requires {
                let Some(&pos) = index.get(req) else {
                    return Err(EngineError::config(format!(
                        "ability {} requires unknown ability {req}",
                        ability.id
                    )));
                };
                let prereq = &abilities[pos];
                if prereq.tier > ability.tier {
                    return Err(EngineError::config(format!(
                        "ability {} (tier {}) requires higher-tier ability {} (tier {})",
                        ability.id, ability.tier, prereq.id, prereq.tier
                    )));
                }
            }
        }

        let catalog = Self { abilities, index };
        catalog.check_acyclic()?;
        Ok(catalog)
    }

    /// Loads a catalog from a JSON array of abilities.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let abilities: Vec<Ability> = serde_json::from_str(json)?;
        Self::new(abilities)
    }

    /// The application's built-in ability tree.
    #[must_use]
    pub fn standard() -> Self {
        let abilities = standard_abilities();
        let index = abilities
            .iter()
            .enumerate()
            .map(|(pos, a)| (a.id.clone(), pos))
            .collect();
        Self { abilities, index }
    }

    /// All abilities in catalog order.
    #[must_use]
    pub fn abilities(&self) -> &[Ability] {
        &self.abilities
    }

    /// Number of abilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }

    /// Looks up an ability by id.
    pub fn get(&self, id: &str) -> Result<&Ability> {
        self.index
            .get(id)
            .map(|&pos| &self.abilities[pos])
            .ok_or_else(|| EngineError::not_found(format!("ability {id}")))
    }

    /// Classifies every ability for a user.
    pub fn resolve(
        &self,
        user_level: u32,
        unlocked: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, AbilityStatus>> {
        check_level(user_level)?;
        for id in unlocked.iter().filter(|id| !self.index.contains_key(*id)) {
            debug!(ability = %id, "ignoring unlocked id absent from catalog");
        }
        Ok(self
            .abilities
            .iter()
            .map(|a| (a.id.clone(), a.status(user_level, unlocked)))
            .collect())
    }

    /// Status of a single ability.
    pub fn status(
        &self,
        id: &str,
        user_level: u32,
        unlocked: &BTreeSet<String>,
    ) -> Result<AbilityStatus> {
        check_level(user_level)?;
        Ok(self.get(id)?.status(user_level, unlocked))
    }

    /// Abilities the user can unlock right now, in catalog order.
    pub fn available(&self, user_level: u32, unlocked: &BTreeSet<String>) -> Result<Vec<&Ability>> {
        check_level(user_level)?;
        Ok(self
            .abilities
            .iter()
            .filter(|a| a.status(user_level, unlocked) == AbilityStatus::Available)
            .collect())
    }

    /// Validates an unlock request. The unlock itself is recorded by the caller.
    pub fn check_unlock(
        &self,
        id: &str,
        user_level: u32,
        unlocked: &BTreeSet<String>,
    ) -> Result<&Ability> {
        check_level(user_level)?;
        let ability = self.get(id)?;
        if unlocked.contains(id) {
            return Err(EngineError::validation(format!(
                "ability {id} is already unlocked"
            )));
        }
        if user_level < ability.unlock_level {
            return Err(EngineError::validation(format!(
                "ability {id} requires level {}, user is level {user_level}",
                ability.unlock_level
            )));
        }
        let missing: Vec<&str> = ability
            .requires
            .iter()
            .filter(|req| !unlocked.contains(*req))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(EngineError::validation(format!(
                "ability {id} is missing prerequisites: {}",
                missing.join(", ")
            )));
        }
        Ok(ability)
    }

    /// Ability ids grouped by tier, tiers ascending.
    #[must_use]
    pub fn by_tier(&self) -> BTreeMap<u32, Vec<&str>> {
        let mut tiers: BTreeMap<u32, Vec<&str>> = BTreeMap::new();
        for ability in &self.abilities {
            tiers.entry(ability.tier).or_default().push(&ability.id);
        }
        tiers
    }

    fn check_acyclic(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }

        fn visit(catalog: &AbilityCatalog, pos: usize, marks: &mut [Mark]) -> Result<()> {
            match marks[pos] {
                Mark::Done => return Ok(()),
                Mark::InProgress => {
                    return Err(EngineError::config(format!(
                        "ability prerequisites form a cycle through {}",
                        catalog.abilities[pos].id
                    )));
                }
                Mark::Unvisited => {}
            }
            marks[pos] = Mark::InProgress;
            for req in &catalog.abilities[pos].requires {
                if let Some(&next) = catalog.index.get(req) {
                    visit(catalog, next, marks)?;
                }
            }
            marks[pos] = Mark::Done;
            Ok(())
        }

        let mut marks = vec![Mark::Unvisited; self.abilities.len()];
        for pos in 0..self.abilities.len() {
            visit(self, pos, &mut marks)?;
        }
        Ok(())
    }
}

fn check_level(user_level: u32) -> Result<()> {
    if user_level == 0 {
        return Err(EngineError::validation("user level must be at least 1"));
    }
    Ok(())
}

fn standard_abilities() -> Vec<Ability> {
    vec![
        Ability::new("iron_will", "Iron Will", AbilityStat::Wisdom, 1, 5)
            .with_description("+10% XP from meditation activities"),
        Ability::new("vitality_boost", "Vitality Boost", AbilityStat::Vitality, 1, 5)
            .with_description("+15 Max Health"),
        Ability::new("swift_steps", "Swift Steps", AbilityStat::Strength, 1, 5)
            .with_description("+10% XP from movement activities"),
        Ability::new("mental_fortress", "Mental Fortress", AbilityStat::Wisdom, 2, 10)
            .with_description("Double XP when maintaining 3+ day streak")
            .requiring(["iron_will"]),
        Ability::new("warriors_endurance", "Warrior's Endurance", AbilityStat::Strength, 2, 10)
            .with_description("+20% XP from all physical activities")
            .requiring(["swift_steps", "vitality_boost"]),
        Ability::new("zen_master", "Zen Master", AbilityStat::Wisdom, 3, 15)
            .with_description("Meditation activities restore 10 HP")
            .requiring(["mental_fortress"]),
        Ability::new("unstoppable", "Unstoppable", AbilityStat::Strength, 3, 15)
            .with_description("Complete 3 quests in one day for bonus 100 XP")
            .requiring(["warriors_endurance"]),
    ]
}
