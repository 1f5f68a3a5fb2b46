//! Daily, weekly, and monthly aggregates over completed sessions.
//!
//! Aggregation is a pure function of the sessions passed in plus the
//! user's clock: nothing here caches or reads storage. Incomplete
//! sessions never count, and attribution always follows the local
//! calendar date of the session's start.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::{UserClock, DAY_LABELS};
use crate::session::Session;

/// Totals for the user's current local day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TodayStats {
    pub distance_miles: f64,
    pub duration_minutes: u32,
}

/// One day's duration total in a weekly series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayTotal {
    /// Weekday label, `"Mon"` through `"Sun"`.
    pub day: String,
    pub duration_minutes: u32,
}

/// Sessions completed this local calendar month against the monthly
/// session goal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyProgress {
    pub completed_sessions: u32,
    pub goal: u32,
}

/// Sums distance and duration for sessions completed on the user's
/// current local day.
pub fn today_totals(sessions: &[Session], clock: &UserClock, now: DateTime<Utc>) -> TodayStats {
    let today = clock.local_date(now);
    let mut totals = TodayStats::default();
    for session in sessions.iter().filter(|s| s.is_complete()) {
        if session.local_start_date(clock) != today {
            continue;
        }
        totals.distance_miles += session.distance_miles.unwrap_or(0.0);
        totals.duration_minutes += session.effective_duration_minutes();
    }
    totals
}

/// Duration per day for the local Monday-to-Sunday week containing
/// `now`. Always seven entries, Monday first, zero-filled.
pub fn weekly_series(sessions: &[Session], clock: &UserClock, now: DateTime<Utc>) -> Vec<DayTotal> {
    let monday = clock.week_start(now);
    let mut series = zeroed_week();
    for session in sessions.iter().filter(|s| s.is_complete()) {
        let offset = (session.local_start_date(clock) - monday).num_days();
        if !(0..7).contains(&offset) {
            continue;
        }
        series[offset as usize].duration_minutes += session.effective_duration_minutes();
    }
    series
}

/// The all-zero weekly series, used both as the aggregation base and as
/// the degraded result when session reads fail.
pub fn zeroed_week() -> Vec<DayTotal> {
    DAY_LABELS
        .iter()
        .map(|day| DayTotal {
            day: (*day).to_string(),
            duration_minutes: 0,
        })
        .collect()
}

/// Counts sessions completed in the local calendar month containing
/// `now`, paired with the user's monthly session goal.
pub fn monthly_progress(
    sessions: &[Session],
    clock: &UserClock,
    now: DateTime<Utc>,
    goal: u32,
) -> MonthlyProgress {
    let local_now = clock.local_date(now);
    let completed = sessions
        .iter()
        .filter(|s| s.is_complete())
        .filter(|s| {
            let date = s.local_start_date(clock);
            date.year() == local_now.year() && date.month() == local_now.month()
        })
        .count();
    MonthlyProgress {
        completed_sessions: u32::try_from(completed).unwrap_or(u32::MAX),
        goal,
    }
}
