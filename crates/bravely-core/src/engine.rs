//! Progress orchestration.
//!
//! [`ExposureEngine`] owns the one write path that keeps derived state
//! honest: after every session completion or deletion it replays the
//! user's completed history to rebuild the streak, evaluates goal
//! growth, advances destination milestones, and persists the snapshot.
//! Read-side stats are computed fresh on every call and degrade to
//! zeroed results when the store read fails, since a dashboard should
//! never crash the app.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::UserClock;
use crate::error::{CoreError, DatabaseError, Result, ValidationError};
use crate::goals::{GoalEngine, GoalPolicy, GoalState};
use crate::session::Session;
use crate::stats::{self, DayTotal, MonthlyProgress, TodayStats};
use crate::streak::StreakState;

/// Narrow persistence interface the engine works against.
pub trait SessionStore {
    /// Completed sessions for a user whose start time falls in the
    /// half-open UTC window `[from, to)`, ascending by start time.
    fn list_completed_sessions(
        &self,
        user_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Session>, DatabaseError>;

    fn get_progress(&self, user_id: i64) -> Result<Option<UserProgress>, DatabaseError>;

    fn save_progress(&self, user_id: i64, progress: &UserProgress) -> Result<(), DatabaseError>;
}

/// Per-user derived state: goal values plus streak, with the clock
/// offset needed to interpret timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProgress {
    /// Minutes east of UTC for this user's local calendar.
    pub timezone_offset_minutes: i32,
    pub goals: GoalState,
    pub streak: StreakState,
}

impl UserProgress {
    pub fn new(timezone_offset_minutes: i32, goals: GoalState) -> Self {
        UserProgress {
            timezone_offset_minutes,
            goals,
            streak: StreakState::new(),
        }
    }

    pub fn clock(&self) -> UserClock {
        UserClock::from_offset_minutes(self.timezone_offset_minutes)
    }
}

/// Snapshot returned after a recompute, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressUpdate {
    pub today: TodayStats,
    pub weekly: Vec<DayTotal>,
    pub streak: StreakState,
    pub goals: GoalState,
}

/// Widest UTC window the store can be asked for. RFC 3339 text
/// comparisons in SQLite hold for four-digit years, so the window stays
/// inside them.
fn history_window() -> (DateTime<Utc>, DateTime<Utc>) {
    let from = DateTime::<Utc>::UNIX_EPOCH;
    let to = Utc
        .with_ymd_and_hms(9999, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    (from, to)
}

/// The aggregation and goal engine over a [`SessionStore`].
pub struct ExposureEngine<S> {
    store: S,
    goal_engine: GoalEngine,
}

impl<S: SessionStore> ExposureEngine<S> {
    pub fn new(store: S) -> Self {
        Self::with_policy(store, GoalPolicy::default())
    }

    pub fn with_policy(store: S, policy: GoalPolicy) -> Self {
        ExposureEngine {
            store,
            goal_engine: GoalEngine::with_policy(policy),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Recomputes progress after a session was completed.
    ///
    /// The session must already be completed and persisted; its distance
    /// is what can advance the next destination milestone.
    pub fn on_session_completed(
        &self,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<ProgressUpdate> {
        if !session.is_complete() {
            return Err(CoreError::Validation(ValidationError::InvalidValue {
                field: "end_time",
                message: "session has not been completed".to_string(),
            }));
        }
        self.refresh(session.user_id, now, session.distance_miles)
    }

    /// Recomputes progress after one of the user's sessions was deleted.
    pub fn on_session_deleted(&self, user_id: i64, now: DateTime<Utc>) -> Result<ProgressUpdate> {
        self.refresh(user_id, now, None)
    }

    /// The shared recompute pipeline: replay streak, grow goals,
    /// advance milestones, persist, then aggregate for display.
    fn refresh(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
        latest_distance_miles: Option<f64>,
    ) -> Result<ProgressUpdate> {
        let mut progress = self
            .store
            .get_progress(user_id)?
            .ok_or(CoreError::UserNotFound { user_id })?;
        let clock = progress.clock();

        let (from, to) = history_window();
        let history = self.store.list_completed_sessions(user_id, from, to)?;

        let mut streak =
            StreakState::recompute(history.iter().map(|s| s.local_start_date(&clock)));
        // The longest streak is a record: deleting the sessions behind it
        // does not lower it.
        streak.longest_streak = streak.longest_streak.max(progress.streak.longest_streak);
        progress.streak = streak;
        self.goal_engine.evaluate(&mut progress.goals, now)?;
        if let Some(distance) = latest_distance_miles {
            if let Some(reached) = progress.goals.advance_destination(distance, now) {
                tracing::info!(user_id, destination = %reached.name, "destination goal reached");
            }
        }

        self.store.save_progress(user_id, &progress)?;
        tracing::debug!(
            user_id,
            sessions = history.len(),
            current_streak = progress.streak.current_streak,
            "progress recomputed"
        );

        Ok(ProgressUpdate {
            today: stats::today_totals(&history, &clock, now),
            weekly: stats::weekly_series(&history, &clock, now),
            streak: progress.streak,
            goals: progress.goals,
        })
    }

    /// Today's totals. Store read failures degrade to zeroed totals.
    pub fn today_stats(&self, user_id: i64, now: DateTime<Utc>) -> Result<TodayStats> {
        let progress = match self.store.get_progress(user_id) {
            Ok(Some(p)) => p,
            Ok(None) => return Err(CoreError::UserNotFound { user_id }),
            Err(err) => {
                tracing::warn!(user_id, error = %err, "progress read failed, serving zeroed today stats");
                return Ok(TodayStats::default());
            }
        };
        let clock = progress.clock();
        let (from, to) = clock.day_window(clock.local_date(now));
        match self.store.list_completed_sessions(user_id, from, to) {
            Ok(sessions) => Ok(stats::today_totals(&sessions, &clock, now)),
            Err(err) => {
                tracing::warn!(user_id, error = %err, "session read failed, serving zeroed today stats");
                Ok(TodayStats::default())
            }
        }
    }

    /// This week's per-day durations, Monday first, always seven
    /// entries. Store read failures degrade to the zero series.
    pub fn weekly_stats(&self, user_id: i64, now: DateTime<Utc>) -> Result<Vec<DayTotal>> {
        let progress = match self.store.get_progress(user_id) {
            Ok(Some(p)) => p,
            Ok(None) => return Err(CoreError::UserNotFound { user_id }),
            Err(err) => {
                tracing::warn!(user_id, error = %err, "progress read failed, serving zeroed weekly stats");
                return Ok(stats::zeroed_week());
            }
        };
        let clock = progress.clock();
        let (from, to) = clock.week_window(now);
        match self.store.list_completed_sessions(user_id, from, to) {
            Ok(sessions) => Ok(stats::weekly_series(&sessions, &clock, now)),
            Err(err) => {
                tracing::warn!(user_id, error = %err, "session read failed, serving zeroed weekly stats");
                Ok(stats::zeroed_week())
            }
        }
    }

    /// Sessions completed this local month against the monthly goal.
    /// Store read failures degrade to a zeroed count.
    pub fn monthly_stats(&self, user_id: i64, now: DateTime<Utc>) -> Result<MonthlyProgress> {
        let progress = match self.store.get_progress(user_id) {
            Ok(Some(p)) => p,
            Ok(None) => return Err(CoreError::UserNotFound { user_id }),
            Err(err) => {
                tracing::warn!(user_id, error = %err, "progress read failed, serving zeroed monthly stats");
                return Ok(MonthlyProgress::default());
            }
        };
        let clock = progress.clock();
        let goal = progress.goals.monthly_session_goal;
        let (from, to) = clock.month_window(now);
        match self.store.list_completed_sessions(user_id, from, to) {
            Ok(sessions) => Ok(stats::monthly_progress(&sessions, &clock, now, goal)),
            Err(err) => {
                tracing::warn!(user_id, error = %err, "session read failed, serving zeroed monthly stats");
                Ok(MonthlyProgress { completed_sessions: 0, goal })
            }
        }
    }

    /// Current stored progress snapshot. Unlike the stats getters this
    /// propagates read failures, since callers asked for the state
    /// itself rather than an advisory aggregate.
    pub fn user_progress(&self, user_id: i64) -> Result<UserProgress> {
        self.store
            .get_progress(user_id)?
            .ok_or(CoreError::UserNotFound { user_id })
    }
}
