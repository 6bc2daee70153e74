// SPDX-License-Identifier: MIT OR Apache-2.0
//! Leaderboard ranking over user records.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::model::UserRecord;
use crate::progression::ProgressionConfig;

/// Default number of entries returned.
pub const DEFAULT_LIMIT: usize = 50;

/// Value users are ranked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardMetric {
    /// Lifetime XP. Derived from level and current XP when the record lacks it.
    TotalXp,
    CurrentStreak,
    LongestStreak,
    QuestsCompleted,
}

impl LeaderboardMetric {
    fn value(self, user: &UserRecord, progression: &ProgressionConfig) -> u64 {
        match self {
            Self::TotalXp => user
                .total_xp
                .unwrap_or_else(|| progression.total_xp_for(user.level, user.current_xp)),
            Self::CurrentStreak => u64::from(user.current_streak),
            Self::LongestStreak => u64::from(user.longest_streak),
            Self::QuestsCompleted => u64::from(user.quests_completed),
        }
    }
}

/// One ranked row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based position.
    pub rank: usize,
    pub username: String,
    pub level: u32,
    pub value: u64,
}

/// Ranks users by `metric`, highest first. Ties go to the username that
/// sorts first. At most `limit` entries are returned. Every record must pass
/// [`UserRecord::validate`].
pub fn rank(
    users: &[UserRecord],
    metric: LeaderboardMetric,
    limit: usize,
    progression: &ProgressionConfig,
) -> Result<Vec<LeaderboardEntry>> {
    if limit == 0 {
        return Err(EngineError::validation("leaderboard limit must be at least 1"));
    }
    let mut scored: Vec<(u64, &UserRecord)> = users
        .iter()
        .map(|user| {
            user.validate()?;
            Ok((metric.value(user, progression), user))
        })
        .collect::<Result<_>>()?;
    scored.sort_by(|(va, a), (vb, b)| {
        Reverse(*va)
            .cmp(&Reverse(*vb))
            .then_with(|| a.username.cmp(&b.username))
    });
    Ok(scored
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(idx, (value, user))| LeaderboardEntry {
            rank: idx + 1,
            username: user.username.clone(),
            level: user.level,
            value,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, level: u32, current_xp: u64, streak: u32, quests: u32) -> UserRecord {
        UserRecord {
            username: name.to_string(),
            level,
            current_xp,
            next_level_xp: u64::from(level) * 100,
            health: 100,
            max_health: 100,
            quests_completed: quests,
            current_streak: streak,
            longest_streak: streak,
            abilities: Vec::new(),
            total_xp: None,
        }
    }

    fn users() -> Vec<UserRecord> {
        vec![
            user("cara", 2, 50, 4, 10),
            user("abe", 3, 0, 4, 2),
            user("bo", 1, 90, 9, 2),
        ]
    }

    #[test]
    fn test_rank_by_total_xp() {
        let board = rank(&users(), LeaderboardMetric::TotalXp, DEFAULT_LIMIT, &ProgressionConfig::default())
            .unwrap();
        let names: Vec<&str> = board.iter().map(|e| e.username.as_str()).collect();
        // abe: 300, cara: 150, bo: 90
        assert_eq!(names, vec!["abe", "cara", "bo"]);
        assert_eq!(board[0].value, 300);
        assert_eq!(board.iter().map(|e| e.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_explicit_total_xp_wins() {
        let mut list = users();
        list[2].total_xp = Some(10_000);
        let board = rank(&list, LeaderboardMetric::TotalXp, 1, &ProgressionConfig::default()).unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].username, "bo");
    }

    #[test]
    fn test_ties_break_by_username() {
        let board = rank(
            &users(),
            LeaderboardMetric::CurrentStreak,
            DEFAULT_LIMIT,
            &ProgressionConfig::default(),
        )
        .unwrap();
        let names: Vec<&str> = board.iter().map(|e| e.username.as_str()).collect();
        assert_eq!(names, vec!["bo", "abe", "cara"]);
        assert_eq!(board[1].rank, 2);
        assert_eq!(board[2].rank, 3);
    }

    #[test]
    fn test_quests_metric_and_limit() {
        let board = rank(&users(), LeaderboardMetric::QuestsCompleted, 2, &ProgressionConfig::default())
            .unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].username, "cara");
        assert_eq!(board[1].username, "abe");
    }

    #[test]
    fn test_zero_limit_rejected() {
        let err = rank(&users(), LeaderboardMetric::LongestStreak, 0, &ProgressionConfig::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_invalid_record_rejected() {
        let mut list = users();
        list[1].health = 101;
        let err = rank(&list, LeaderboardMetric::QuestsCompleted, DEFAULT_LIMIT, &ProgressionConfig::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_empty_users() {
        let board = rank(&[], LeaderboardMetric::TotalXp, 10, &ProgressionConfig::default()).unwrap();
        assert!(board.is_empty());
    }
}
