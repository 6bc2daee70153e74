// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end rule scenarios through the public engine API.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, TimeZone, Utc};
use healthquest_rules::{
    Ability, AbilityCatalog, AbilityStat, AbilityStatus, AchievementCatalog, ActivityLog,
    ActivityType, DayBoundary, EngineConfig, EngineError, HeroState, LeaderboardMetric,
    QuestCatalog, RulesEngine, Sentiment, UserRecord,
};

fn engine() -> RulesEngine {
    RulesEngine::new(EngineConfig::default()).unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

fn log(ts: DateTime<Utc>, sentiment: Sentiment) -> ActivityLog {
    ActivityLog::new(ts, sentiment, 1.0).unwrap()
}

fn set(ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(|s| (*s).to_string()).collect()
}

#[test]
fn test_three_day_streak_then_stale() {
    let engine = engine();
    let logs = [
        log(at(2024, 1, 1, 8), Sentiment::Neutral),
        log(at(2024, 1, 2, 8), Sentiment::Neutral),
        log(at(2024, 1, 3, 8), Sentiment::Neutral),
    ];

    let state = engine.streak(&logs, at(2024, 1, 3, 23));
    assert_eq!((state.current, state.longest, state.stale), (3, 3, false));

    let state = engine.streak(&logs, at(2024, 1, 5, 0));
    assert_eq!(state.current, 3);
    assert!(state.stale);
}

#[test]
fn test_consecutive_days_property() {
    let engine = engine();
    let start = at(2024, 2, 20, 10);
    for n in 1..=20 {
        let logs: Vec<_> = (0..n)
            .map(|d| log(start + Duration::days(d), Sentiment::Positive))
            .collect();
        let now = start + Duration::days(n - 1);
        let state = engine.streak(&logs, now);
        let n = u32::try_from(n).unwrap();
        assert_eq!(state.current, n);
        assert_eq!(state.longest, n);
    }
}

#[test]
fn test_gap_streak() {
    let engine = engine();
    let logs: Vec<_> = [1, 2, 3, 5, 6]
        .iter()
        .map(|&d| log(at(2024, 1, d, 12), Sentiment::Neutral))
        .collect();

    let today = engine.streak(&logs, at(2024, 1, 6, 18));
    assert_eq!((today.longest, today.current, today.stale), (3, 2, false));

    let later = engine.streak(&logs, at(2024, 1, 10, 18));
    assert!(later.stale);
    assert_eq!(later.live_current(), 0);
}

#[test]
fn test_day_boundary_from_config() {
    let config = EngineConfig::default().with_day_boundary(DayBoundary::FixedOffset { minutes: -300 });
    let engine = RulesEngine::new(config).unwrap();
    // 03:00 UTC on Jan 2 is still Jan 1 at UTC-5.
    let logs = [
        log(at(2024, 1, 1, 12), Sentiment::Neutral),
        log(at(2024, 1, 2, 3), Sentiment::Neutral),
    ];
    let state = engine.streak(&logs, at(2024, 1, 2, 4));
    assert_eq!(state.current, 1);
    assert_eq!(state.active_days, 1);
}

#[test]
fn test_reward_ordering_and_rounding() {
    let engine = engine();
    for base in [1, 7, 10, 33, 150] {
        let pos = engine.reward(Sentiment::Positive, base).unwrap();
        let neu = engine.reward(Sentiment::Neutral, base).unwrap();
        let neg = engine.reward(Sentiment::Negative, base).unwrap();
        assert!(pos.multiplier >= neu.multiplier && neu.multiplier >= neg.multiplier);
        assert_eq!(pos.awarded_xp, (f64::from(base) * pos.multiplier).round() as u64);
    }
    assert!(matches!(
        engine.reward_label("furious", 10),
        Err(EngineError::Validation(_))
    ));
}

#[test]
fn test_ability_scenario() {
    let catalog = AbilityCatalog::new(vec![
        Ability::new("A", "A", AbilityStat::Vitality, 1, 5),
        Ability::new("B", "B", AbilityStat::Vitality, 2, 10).requiring(["A"]),
    ])
    .unwrap();
    let engine = RulesEngine::with_catalogs(
        EngineConfig::default(),
        catalog,
        AchievementCatalog::standard(),
        QuestCatalog::standard(),
    )
    .unwrap();

    let states = engine.resolve_abilities(12, &set(&[])).unwrap();
    assert_eq!(states["A"], AbilityStatus::Available);
    assert_eq!(states["B"], AbilityStatus::Locked);

    let states = engine.resolve_abilities(12, &set(&["A"])).unwrap();
    assert_eq!(states["A"], AbilityStatus::Unlocked);
    assert_eq!(states["B"], AbilityStatus::Available);

    let again = engine.resolve_abilities(12, &set(&["A"])).unwrap();
    assert_eq!(states, again);
}

#[test]
fn test_ability_catalog_from_json_rejects_cycle() {
    let json = r#"[
        {"id": "a", "name": "A", "stat": "wisdom", "tier": 1, "unlock_level": 1, "requires": ["b"]},
        {"id": "b", "name": "B", "stat": "wisdom", "tier": 1, "unlock_level": 1, "requires": ["a"]}
    ]"#;
    assert!(matches!(
        AbilityCatalog::from_json_str(json),
        Err(EngineError::Config(_))
    ));
}

#[test]
fn test_user_record_resolution() {
    let engine = engine();
    let user: UserRecord = serde_json::from_str(
        r#"{
            "username": "ada",
            "level": 10,
            "currentXP": 120,
            "nextLevelXP": 1000,
            "health": 190,
            "maxHealth": 190,
            "questsCompleted": 12,
            "currentStreak": 2,
            "longestStreak": 8,
            "abilities": ["swift_steps", "vitality_boost", "retired_ability"]
        }"#,
    )
    .unwrap();

    let states = engine.resolve_for_user(&user).unwrap();
    assert_eq!(states["warriors_endurance"], AbilityStatus::Available);
    assert_eq!(states["mental_fortress"], AbilityStatus::Locked);
    assert_eq!(states["iron_will"], AbilityStatus::Available);
    assert!(!states.contains_key("retired_ability"));

    assert!(engine.check_unlock(&user, "warriors_endurance").is_ok());
    assert!(engine.check_unlock(&user, "unstoppable").is_err());
}

#[test]
fn test_quest_completion_flow() {
    let engine = engine();
    let hero = HeroState::new(&engine.config().progression);

    let first = engine.complete_quest::<&str>(&hero, "quest_3", &[]).unwrap();
    assert!(first.outcome.leveled_up);
    assert_eq!(first.outcome.new_level, 2);
    assert_eq!(first.hero.current_xp, 0);

    let second = engine
        .complete_quest(&first.hero, "quest_2", &["quest_3"])
        .unwrap();
    assert_eq!(second.hero.quests_completed, 2);
    assert_eq!(second.hero.total_xp, 175);
    assert!(!second.outcome.leveled_up);

    let repeat = engine.complete_quest(&second.hero, "quest_3", &["quest_3", "quest_2"]);
    assert!(matches!(repeat, Err(EngineError::Validation(_))));
}

#[test]
fn test_difficulty_tracks_mood() {
    let engine = engine();
    let now = at(2024, 3, 10, 20);
    let good: Vec<_> = (0..7)
        .map(|d| log(now - Duration::days(d), Sentiment::Positive))
        .collect();
    let bad: Vec<_> = [1, 4, 8]
        .iter()
        .map(|&d| log(now - Duration::days(d), Sentiment::Negative))
        .collect();

    let up = engine.adapt_difficulty(&good, now);
    let down = engine.adapt_difficulty(&bad, now);
    assert!(up.difficulty > 1.2);
    assert!(down.difficulty < 0.8);
    assert!(down.difficulty >= 0.5);
    assert_ne!(up.feedback, down.feedback);

    let quest = engine
        .personalized_quest(ActivityType::Movement, down.difficulty)
        .unwrap();
    assert!(quest.target < 5000);
}

#[test]
fn test_difficulty_without_data_is_neutral() {
    let engine = engine();
    let state = engine.difficulty_or_default::<&str>(&[], None);
    assert_eq!(state.difficulty, 1.0);
}

#[test]
fn test_achievements_accumulate() {
    let engine = engine();
    let mut user: UserRecord = serde_json::from_str(
        r#"{"username":"ada","level":1,"currentXP":0,"nextLevelXP":100,"health":50,"maxHealth":100}"#,
    )
    .unwrap();
    let logs: Vec<_> = (1..=3)
        .map(|d| log(at(2024, 1, d, 9), Sentiment::Positive))
        .collect();

    let first = engine
        .evaluate_achievements(&user, &logs, at(2024, 1, 3, 21), &BTreeSet::new())
        .unwrap();
    assert!(first.newly_earned.contains(&"streak-3".to_string()));
    assert!(first.xp_reward > 0);

    user.quests_completed = 1;
    let second = engine
        .evaluate_achievements(&user, &logs, at(2024, 1, 3, 22), &first.earned)
        .unwrap();
    assert_eq!(second.newly_earned, vec!["first-quest".to_string()]);
    assert_eq!(second.xp_reward, 50);
    assert!(second.earned.is_superset(&first.earned));
}

#[test]
fn test_leaderboard_ranks() {
    let engine = engine();
    let users: Vec<UserRecord> = serde_json::from_str(
        r#"[
            {"username":"zed","level":4,"currentXP":10,"nextLevelXP":400,"health":1,"maxHealth":130,"questsCompleted":9},
            {"username":"amy","level":4,"currentXP":10,"nextLevelXP":400,"health":1,"maxHealth":130,"questsCompleted":3},
            {"username":"kim","level":2,"currentXP":0,"nextLevelXP":200,"health":1,"maxHealth":110,"questsCompleted":30}
        ]"#,
    )
    .unwrap();

    let board = engine.leaderboard(&users, LeaderboardMetric::TotalXp, 10).unwrap();
    let names: Vec<&str> = board.iter().map(|e| e.username.as_str()).collect();
    assert_eq!(names, vec!["amy", "zed", "kim"]);
    assert_eq!(board.iter().map(|e| e.rank).collect::<Vec<_>>(), vec![1, 2, 3]);

    let board = engine
        .leaderboard(&users, LeaderboardMetric::QuestsCompleted, 1)
        .unwrap();
    assert_eq!(board[0].username, "kim");
}

#[test]
fn test_config_from_json_drives_engine() {
    let config = EngineConfig::from_json_str(
        r#"{"rewards": {"positive": 1.5, "neutral": 1.0, "negative": 0.5}, "reflection_base_xp": 20}"#,
    )
    .unwrap();
    let engine = RulesEngine::new(config).unwrap();
    assert_eq!(engine.reflection_reward(Sentiment::Positive).unwrap().awarded_xp, 30);
    assert_eq!(engine.multiplier_or_default("unknown"), 1.0);
}
