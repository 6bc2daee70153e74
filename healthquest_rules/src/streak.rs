// SPDX-License-Identifier: MIT OR Apache-2.0
//! Consecutive-day streaks derived from activity logs.
//!
//! Streaks are never stored. Every query recomputes them from the full log
//! list, a reference "now", and a fixed [`DayBoundary`] policy.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::model::ActivityLog;

/// Largest accepted offset for [`DayBoundary::FixedOffset`], in minutes.
pub const MAX_OFFSET_MINUTES: i32 = 18 * 60;

/// Where one calendar day ends and the next begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DayBoundary {
    /// Days roll over at midnight UTC.
    #[default]
    Utc,
    /// Days roll over at midnight in a fixed offset from UTC.
    FixedOffset {
        /// Minutes east of UTC (negative for west).
        minutes: i32,
    },
}

impl DayBoundary {
    /// Checks that the offset is a real-world UTC offset.
    pub fn validate(&self) -> Result<()> {
        if let Self::FixedOffset { minutes } = self {
            if minutes.abs() > MAX_OFFSET_MINUTES {
                return Err(EngineError::config(format!(
                    "day boundary offset must be within +/-{MAX_OFFSET_MINUTES} minutes, got {minutes}"
                )));
            }
        }
        Ok(())
    }

    /// Projects an instant onto its calendar day under this policy.
    #[must_use]
    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            Self::Utc => instant.date_naive(),
            Self::FixedOffset { minutes } => {
                (instant + Duration::minutes(i64::from(*minutes))).date_naive()
            }
        }
    }
}

/// Derived streak summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakState {
    /// Consecutive active days ending at the most recent active day.
    pub current: u32,
    /// Longest consecutive run in the whole history.
    pub longest: u32,
    /// The most recent active day is older than yesterday.
    pub stale: bool,
    /// Most recent day with at least one log.
    pub last_active_day: Option<NaiveDate>,
    /// Number of distinct days with at least one log.
    pub active_days: u32,
}

impl StreakState {
    /// Current streak as of today: zero when the streak is stale.
    #[must_use]
    pub const fn live_current(&self) -> u32 {
        if self.stale {
            0
        } else {
            self.current
        }
    }

    /// Whether a non-empty streak is still alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.current > 0 && !self.stale
    }
}

/// Computes [`StreakState`] from timestamped logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreakCalculator {
    boundary: DayBoundary,
}

impl StreakCalculator {
    /// Creates a calculator using the given day boundary.
    #[must_use]
    pub const fn new(boundary: DayBoundary) -> Self {
        Self { boundary }
    }

    /// The day boundary in use.
    #[must_use]
    pub const fn boundary(&self) -> DayBoundary {
        self.boundary
    }

    /// Streak over activity logs, as of `now`.
    #[must_use]
    pub fn calculate(&self, logs: &[ActivityLog], now: DateTime<Utc>) -> StreakState {
        self.calculate_instants(logs.iter().map(|log| log.timestamp), now)
    }

    /// Streak over bare instants, as of `now`. Order and duplicates do not matter.
    #[must_use]
    pub fn calculate_instants<I>(&self, instants: I, now: DateTime<Utc>) -> StreakState
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        let days: BTreeSet<NaiveDate> = instants
            .into_iter()
            .map(|instant| self.boundary.day_of(instant))
            .collect();
        let days: Vec<NaiveDate> = days.into_iter().collect();

        let Some(&last) = days.last() else {
            return StreakState::default();
        };

        let mut longest = 1u32;
        let mut run = 1u32;
        for pair in days.windows(2) {
            if is_next_day(pair[0], pair[1]) {
                run += 1;
                longest = longest.max(run);
            } else {
                run = 1;
            }
        }

        let mut current = 1u32;
        for pair in days.windows(2).rev() {
            if is_next_day(pair[0], pair[1]) {
                current += 1;
            } else {
                break;
            }
        }

        let today = self.boundary.day_of(now);
        let yesterday = today.pred_opt().unwrap_or(today);
        let stale = last < yesterday;

        let state = StreakState {
            current,
            longest,
            stale,
            last_active_day: Some(last),
            active_days: u32::try_from(days.len()).unwrap_or(u32::MAX),
        };
        debug!(
            current = state.current,
            longest = state.longest,
            stale = state.stale,
            active_days = state.active_days,
            "computed streak"
        );
        state
    }
}

fn is_next_day(earlier: NaiveDate, later: NaiveDate) -> bool {
    earlier.succ_opt() == Some(later)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sentiment;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn log_at(ts: DateTime<Utc>) -> ActivityLog {
        ActivityLog::new(ts, Sentiment::Neutral, 1.0).unwrap()
    }

    fn utc() -> StreakCalculator {
        StreakCalculator::new(DayBoundary::Utc)
    }

    #[test]
    fn test_empty_logs() {
        let state = utc().calculate(&[], at(2024, 1, 3, 12));
        assert_eq!(state, StreakState::default());
        assert_eq!(state.current, 0);
        assert_eq!(state.longest, 0);
        assert!(!state.stale);
    }

    #[test]
    fn test_single_log() {
        let logs = [log_at(at(2024, 3, 10, 8))];
        let state = utc().calculate(&logs, at(2024, 3, 10, 20));
        assert_eq!(state.current, 1);
        assert_eq!(state.longest, 1);
        assert!(!state.stale);
        assert_eq!(state.active_days, 1);
    }

    #[test]
    fn test_three_consecutive_days() {
        let logs = [
            log_at(at(2024, 1, 1, 9)),
            log_at(at(2024, 1, 2, 9)),
            log_at(at(2024, 1, 3, 9)),
        ];
        let state = utc().calculate(&logs, at(2024, 1, 3, 23));
        assert_eq!(state.current, 3);
        assert_eq!(state.longest, 3);
        assert!(!state.stale);
    }

    #[test]
    fn test_stale_after_missed_day() {
        let logs = [
            log_at(at(2024, 1, 1, 9)),
            log_at(at(2024, 1, 2, 9)),
            log_at(at(2024, 1, 3, 9)),
        ];
        let state = utc().calculate(&logs, at(2024, 1, 5, 0));
        assert_eq!(state.current, 3);
        assert!(state.stale);
        assert_eq!(state.live_current(), 0);
        assert!(!state.is_alive());
    }

    #[test]
    fn test_last_log_yesterday_not_stale() {
        let logs = [log_at(at(2024, 1, 2, 9)), log_at(at(2024, 1, 3, 9))];
        let state = utc().calculate(&logs, at(2024, 1, 4, 18));
        assert!(!state.stale);
        assert_eq!(state.live_current(), 2);
    }

    #[test]
    fn test_gap_splits_runs() {
        let logs: Vec<_> = [1, 2, 3, 5, 6]
            .iter()
            .map(|&d| log_at(at(2024, 1, d, 12)))
            .collect();
        let state = utc().calculate(&logs, at(2024, 1, 6, 13));
        assert_eq!(state.longest, 3);
        assert_eq!(state.current, 2);
        assert!(!state.stale);

        let later = utc().calculate(&logs, at(2024, 1, 9, 13));
        assert_eq!(later.current, 2);
        assert!(later.stale);
    }

    #[test]
    fn test_unordered_and_duplicate_logs() {
        let logs = [
            log_at(at(2024, 1, 3, 22)),
            log_at(at(2024, 1, 1, 7)),
            log_at(at(2024, 1, 3, 6)),
            log_at(at(2024, 1, 2, 12)),
            log_at(at(2024, 1, 2, 13)),
        ];
        let state = utc().calculate(&logs, at(2024, 1, 3, 23));
        assert_eq!(state.current, 3);
        assert_eq!(state.longest, 3);
        assert_eq!(state.active_days, 3);
    }

    #[test]
    fn test_month_and_year_rollover() {
        let logs = [
            log_at(at(2023, 12, 30, 10)),
            log_at(at(2023, 12, 31, 10)),
            log_at(at(2024, 1, 1, 10)),
            log_at(at(2024, 2, 29, 10)),
            log_at(at(2024, 3, 1, 10)),
        ];
        let state = utc().calculate(&logs, at(2024, 3, 1, 11));
        assert_eq!(state.longest, 3);
        assert_eq!(state.current, 2);
    }

    #[test]
    fn test_fixed_offset_changes_day() {
        // 23:30 UTC on Jan 1 is already Jan 2 at UTC+2.
        let late = Utc.with_ymd_and_hms(2024, 1, 1, 23, 30, 0).unwrap();
        let logs = [log_at(at(2024, 1, 1, 12)), log_at(late)];

        let in_utc = utc().calculate(&logs, at(2024, 1, 2, 12));
        assert_eq!(in_utc.current, 1);

        let shifted = StreakCalculator::new(DayBoundary::FixedOffset { minutes: 120 })
            .calculate(&logs, at(2024, 1, 2, 12));
        assert_eq!(shifted.current, 2);
        assert_eq!(shifted.longest, 2);
    }

    #[test]
    fn test_future_log_not_stale() {
        let logs = [log_at(at(2024, 1, 10, 12))];
        let state = utc().calculate(&logs, at(2024, 1, 8, 12));
        assert!(!state.stale);
    }

    #[test]
    fn test_day_boundary_validation() {
        assert!(DayBoundary::Utc.validate().is_ok());
        assert!(DayBoundary::FixedOffset { minutes: -300 }.validate().is_ok());
        assert!(DayBoundary::FixedOffset { minutes: 2000 }.validate().is_err());
    }

    #[test]
    fn test_day_boundary_serde() {
        let json = serde_json::to_string(&DayBoundary::FixedOffset { minutes: 330 }).unwrap();
        assert_eq!(json, r#"{"kind":"fixed_offset","minutes":330}"#);
        let back: DayBoundary = serde_json::from_str(r#"{"kind":"utc"}"#).unwrap();
        assert_eq!(back, DayBoundary::Utc);
    }

    #[test]
    fn test_long_run_counts() {
        let start = at(2024, 1, 1, 6);
        let instants: Vec<_> = (0..30).map(|d| start + Duration::days(d)).collect();
        let state = utc().calculate_instants(instants, at(2024, 1, 30, 20));
        assert_eq!(state.current, 30);
        assert_eq!(state.longest, 30);
    }
}
