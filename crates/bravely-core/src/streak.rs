//! Consecutive-day streak tracking.
//!
//! A streak counts local calendar days on which at least one session was
//! completed, with no day skipped in between. The state machine is
//! deliberately tiny: it only ever looks at the date of the last counted
//! session, and the full state can be rebuilt by replaying the distinct
//! session dates in ascending order through the same transition.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Current and best streak, plus the date that anchors the next
/// transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub current_streak: u32,
    pub longest_streak: u32,
    /// Local date of the most recent counted session, `None` until the
    /// first completion.
    pub last_session_date: Option<NaiveDate>,
}

impl StreakState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one completed-session date into the streak.
    ///
    /// Transitions, keyed on the gap from `last_session_date`:
    /// same day keeps the count, the very next day extends it by one,
    /// any longer gap resets it to one. Dates earlier than the anchor
    /// are ignored; replay handles out-of-order history instead.
    pub fn observe(&mut self, date: NaiveDate) {
        match self.last_session_date {
            None => {
                self.current_streak = 1;
                self.last_session_date = Some(date);
            }
            Some(last) => {
                let gap = (date - last).num_days();
                if gap <= 0 {
                    return;
                }
                self.current_streak = if gap == 1 { self.current_streak + 1 } else { 1 };
                self.last_session_date = Some(date);
            }
        }
        self.longest_streak = self.longest_streak.max(self.current_streak);
    }

    /// Rebuilds the streak from scratch by replaying every completed
    /// session's local date.
    ///
    /// Input order does not matter; dates are sorted and deduplicated
    /// before the replay. The trailing run of consecutive days becomes
    /// `current_streak` and the longest run anywhere in the history
    /// becomes `longest_streak`.
    pub fn recompute<I>(dates: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let mut days: Vec<NaiveDate> = dates.into_iter().collect();
        days.sort_unstable();
        days.dedup();

        let mut state = Self::new();
        for day in days {
            state.observe(day);
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn first_session_starts_a_streak() {
        let mut state = StreakState::new();
        state.observe(date(2025, 1, 1));
        assert_eq!(state.current_streak, 1);
        assert_eq!(state.longest_streak, 1);
        assert_eq!(state.last_session_date, Some(date(2025, 1, 1)));
    }

    #[test]
    fn consecutive_days_extend() {
        let mut state = StreakState::new();
        state.observe(date(2025, 1, 1));
        state.observe(date(2025, 1, 2));
        state.observe(date(2025, 1, 3));
        assert_eq!(state.current_streak, 3);
        assert_eq!(state.longest_streak, 3);
    }

    #[test]
    fn same_day_repeat_does_not_double_count() {
        let mut state = StreakState::new();
        state.observe(date(2025, 1, 1));
        state.observe(date(2025, 1, 1));
        assert_eq!(state.current_streak, 1);
        assert_eq!(state.longest_streak, 1);
    }

    #[test]
    fn gap_resets_current_but_keeps_longest() {
        let mut state = StreakState::new();
        state.observe(date(2025, 1, 1));
        state.observe(date(2025, 1, 2));
        state.observe(date(2025, 1, 5));
        assert_eq!(state.current_streak, 1);
        assert_eq!(state.longest_streak, 2);
        assert_eq!(state.last_session_date, Some(date(2025, 1, 5)));
    }

    #[test]
    fn earlier_date_is_ignored() {
        let mut state = StreakState::new();
        state.observe(date(2025, 1, 10));
        state.observe(date(2025, 1, 4));
        assert_eq!(state.current_streak, 1);
        assert_eq!(state.last_session_date, Some(date(2025, 1, 10)));
    }

    #[test]
    fn recompute_matches_incremental_for_ordered_input() {
        let days = [date(2025, 1, 1), date(2025, 1, 2), date(2025, 1, 3)];
        let replayed = StreakState::recompute(days);
        assert_eq!(replayed.current_streak, 3);
        assert_eq!(replayed.longest_streak, 3);
        assert_eq!(replayed.last_session_date, Some(date(2025, 1, 3)));
    }

    #[test]
    fn recompute_handles_unordered_and_duplicate_dates() {
        let days = [
            date(2025, 1, 5),
            date(2025, 1, 1),
            date(2025, 1, 2),
            date(2025, 1, 2),
        ];
        let state = StreakState::recompute(days);
        // Runs are 1-2 and 5: longest two, trailing one.
        assert_eq!(state.current_streak, 1);
        assert_eq!(state.longest_streak, 2);
    }

    #[test]
    fn recompute_of_empty_history_is_zeroed() {
        let state = StreakState::recompute(std::iter::empty());
        assert_eq!(state, StreakState::new());
        assert_eq!(state.current_streak, 0);
        assert!(state.last_session_date.is_none());
    }

    #[test]
    fn trailing_run_becomes_current_streak() {
        let days = [
            date(2025, 3, 1),
            date(2025, 3, 2),
            date(2025, 3, 3),
            date(2025, 3, 7),
            date(2025, 3, 8),
        ];
        let state = StreakState::recompute(days);
        assert_eq!(state.current_streak, 2);
        assert_eq!(state.longest_streak, 3);
        assert_eq!(state.last_session_date, Some(date(2025, 3, 8)));
    }
}
