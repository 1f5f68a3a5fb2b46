//! SQLite persistence for sessions and per-user progress snapshots.
//!
//! Timestamps are stored as RFC 3339 TEXT in UTC, so lexicographic
//! comparison in SQL matches chronological order. Dates are `YYYY-MM-DD`
//! TEXT and list-valued fields are JSON TEXT columns.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;

use crate::engine::{SessionStore, UserProgress};
use crate::error::{CoreError, DatabaseError, Result};
use crate::goals::{GoalState, GrowthPeriod};
use crate::session::{AnnotationUpdate, CompletionParams, NewSession, Session};
use crate::storage::migrations;
use crate::streak::StreakState;

const SESSION_COLUMNS: &str = "id, user_id, start_time, end_time, duration_min, \
     distance_miles, fear_before, fear_after, mood_before, mood_after, is_active, \
     notes, mood_tag, daily_intention, tools_used, reflection";

const PROGRESS_COLUMNS: &str = "timezone_offset_min, progressive_goals_enabled, \
     growth_rate_percent, growth_period, distance_goal_miles, duration_goal_min, \
     destination_goals, last_goal_update, monthly_session_goal, current_streak, \
     longest_streak, last_session_date";

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (creating if needed) the database in the data directory.
    pub fn open() -> Result<Self> {
        let dir = super::data_dir();
        std::fs::create_dir_all(&dir)?;
        Self::open_at(&dir.join("bravely.db"))
    }

    /// Opens a database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| DatabaseError::OpenFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let db = Database { conn };
        db.init()?;
        Ok(db)
    }

    /// In-memory database, for tests and dry runs.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| DatabaseError::OpenFailed {
            path: ":memory:".to_string(),
            message: e.to_string(),
        })?;
        let db = Database { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        self.conn
            .busy_timeout(std::time::Duration::from_secs(5))
            .map_err(DatabaseError::from)?;
        migrations::migrate(&self.conn)?;
        Ok(())
    }

    // ── Users ──────────────────────────────────────────────────────────

    /// Inserts a progress snapshot for a new user and returns the
    /// assigned user id.
    pub fn register_user(&self, progress: &UserProgress) -> Result<i64> {
        let destinations = serde_json::to_string(&progress.goals.destination_goals)?;
        self.conn.execute(
            &format!(
                "INSERT INTO user_progress ({PROGRESS_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
            ),
            params![
                progress.timezone_offset_minutes,
                progress.goals.progressive_goals_enabled,
                progress.goals.growth_rate_percent,
                progress.goals.growth_period.as_str(),
                progress.goals.distance_goal_miles,
                progress.goals.duration_goal_minutes,
                destinations,
                progress.goals.last_goal_update.map(|t| t.to_rfc3339()),
                progress.goals.monthly_session_goal,
                progress.streak.current_streak,
                progress.streak.longest_streak,
                progress.streak.last_session_date.map(format_date),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    // ── Sessions ───────────────────────────────────────────────────────

    /// Validates and inserts a new in-progress session.
    pub fn create_session(&self, new: NewSession) -> Result<Session> {
        let session = Session::start(new)?;
        let tools = serde_json::to_string(&session.tools_used)?;
        self.conn.execute(
            "INSERT INTO sessions (id, user_id, start_time, fear_before, mood_before,
                                   is_active, notes, mood_tag, daily_intention, tools_used)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                session.id,
                session.user_id,
                session.start_time.to_rfc3339(),
                session.fear_before,
                session.mood_before,
                session.is_active,
                session.notes,
                session.mood_tag,
                session.daily_intention,
                tools,
            ],
        )?;
        Ok(session)
    }

    pub fn get_session(&self, id: &str) -> Result<Option<Session>> {
        let session = self
            .conn
            .query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
                params![id],
                row_to_session,
            )
            .optional()
            .map_err(DatabaseError::from)?;
        Ok(session)
    }

    /// The user's in-progress session, if any. Newest first when an
    /// aborted run left more than one behind.
    pub fn active_session(&self, user_id: i64) -> Result<Option<Session>> {
        let session = self
            .conn
            .query_row(
                &format!(
                    "SELECT {SESSION_COLUMNS} FROM sessions
                     WHERE user_id = ?1 AND is_active = 1
                     ORDER BY start_time DESC LIMIT 1"
                ),
                params![user_id],
                row_to_session,
            )
            .optional()
            .map_err(DatabaseError::from)?;
        Ok(session)
    }

    /// Validates completion input, applies it, and persists the result.
    pub fn complete_session(&self, id: &str, completion: &CompletionParams) -> Result<Session> {
        let mut session = self
            .get_session(id)?
            .ok_or_else(|| CoreError::SessionNotFound { id: id.to_string() })?;
        session.apply_completion(completion)?;
        let tools = serde_json::to_string(&session.tools_used)?;
        self.conn.execute(
            "UPDATE sessions
             SET end_time = ?1, duration_min = ?2, distance_miles = ?3,
                 fear_after = ?4, mood_after = ?5, is_active = 0,
                 notes = ?6, reflection = ?7, tools_used = ?8
             WHERE id = ?9",
            params![
                session.end_time.map(|t| t.to_rfc3339()),
                session.duration_minutes,
                session.distance_miles,
                session.fear_after,
                session.mood_after,
                session.notes,
                session.reflection,
                tools,
                id,
            ],
        )?;
        Ok(session)
    }

    /// Applies a partial annotation edit and persists the result.
    pub fn update_annotations(&self, id: &str, update: &AnnotationUpdate) -> Result<Session> {
        let mut session = self
            .get_session(id)?
            .ok_or_else(|| CoreError::SessionNotFound { id: id.to_string() })?;
        session.apply_annotations(update)?;
        let tools = serde_json::to_string(&session.tools_used)?;
        self.conn.execute(
            "UPDATE sessions
             SET notes = ?1, mood_tag = ?2, daily_intention = ?3,
                 reflection = ?4, tools_used = ?5
             WHERE id = ?6",
            params![
                session.notes,
                session.mood_tag,
                session.daily_intention,
                session.reflection,
                tools,
                id,
            ],
        )?;
        Ok(session)
    }

    /// Deletes a session and returns the deleted row, so callers know
    /// whose progress to recompute. `None` when the id is unknown.
    pub fn delete_session(&self, id: &str) -> Result<Option<Session>> {
        let session = self.get_session(id)?;
        if session.is_some() {
            self.conn
                .execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        }
        Ok(session)
    }

    /// Recent sessions for a user, newest first.
    pub fn list_sessions(&self, user_id: i64, limit: u32) -> Result<Vec<Session>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions
                 WHERE user_id = ?1
                 ORDER BY start_time DESC LIMIT ?2"
            ))
            .map_err(DatabaseError::from)?;
        let rows = stmt
            .query_map(params![user_id, limit], row_to_session)
            .map_err(DatabaseError::from)?;
        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row.map_err(DatabaseError::from)?);
        }
        Ok(sessions)
    }
}

impl SessionStore for Database {
    fn list_completed_sessions(
        &self,
        user_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Session>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions
             WHERE user_id = ?1 AND end_time IS NOT NULL
               AND start_time >= ?2 AND start_time < ?3
             ORDER BY start_time ASC"
        ))?;
        let rows = stmt.query_map(
            params![user_id, from.to_rfc3339(), to.to_rfc3339()],
            row_to_session,
        )?;
        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?);
        }
        Ok(sessions)
    }

    fn get_progress(&self, user_id: i64) -> Result<Option<UserProgress>, DatabaseError> {
        let progress = self
            .conn
            .query_row(
                &format!("SELECT {PROGRESS_COLUMNS} FROM user_progress WHERE user_id = ?1"),
                params![user_id],
                row_to_progress,
            )
            .optional()?;
        Ok(progress)
    }

    fn save_progress(&self, user_id: i64, progress: &UserProgress) -> Result<(), DatabaseError> {
        let destinations = serde_json::to_string(&progress.goals.destination_goals)
            .map_err(|e| DatabaseError::QueryFailed(format!("encode destination goals: {e}")))?;
        self.conn.execute(
            &format!(
                "INSERT OR REPLACE INTO user_progress (user_id, {PROGRESS_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
            ),
            params![
                user_id,
                progress.timezone_offset_minutes,
                progress.goals.progressive_goals_enabled,
                progress.goals.growth_rate_percent,
                progress.goals.growth_period.as_str(),
                progress.goals.distance_goal_miles,
                progress.goals.duration_goal_minutes,
                destinations,
                progress.goals.last_goal_update.map(|t| t.to_rfc3339()),
                progress.goals.monthly_session_goal,
                progress.streak.current_streak,
                progress.streak.longest_streak,
                progress.streak.last_session_date.map(format_date),
            ],
        )?;
        Ok(())
    }
}

// === Row mapping helpers ===

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn conversion_error(
    column: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(err))
}

fn parse_utc(column: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, e))
}

fn parse_date(column: usize, text: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|e| conversion_error(column, e))
}

fn parse_json<T: DeserializeOwned>(column: usize, text: &str) -> rusqlite::Result<T> {
    serde_json::from_str(text).map_err(|e| conversion_error(column, e))
}

fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<Session> {
    let start_text: String = row.get(2)?;
    let end_text: Option<String> = row.get(3)?;
    let tools_text: String = row.get(14)?;
    Ok(Session {
        id: row.get(0)?,
        user_id: row.get(1)?,
        start_time: parse_utc(2, &start_text)?,
        end_time: end_text.as_deref().map(|t| parse_utc(3, t)).transpose()?,
        duration_minutes: row.get(4)?,
        distance_miles: row.get(5)?,
        fear_before: row.get(6)?,
        fear_after: row.get(7)?,
        mood_before: row.get(8)?,
        mood_after: row.get(9)?,
        is_active: row.get(10)?,
        notes: row.get(11)?,
        mood_tag: row.get(12)?,
        daily_intention: row.get(13)?,
        tools_used: parse_json(14, &tools_text)?,
        reflection: row.get(15)?,
    })
}

fn row_to_progress(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserProgress> {
    let period_text: String = row.get(3)?;
    let growth_period = GrowthPeriod::parse(&period_text).ok_or_else(|| {
        conversion_error(
            3,
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unknown growth period: {period_text}"),
            ),
        )
    })?;
    let destinations_text: String = row.get(6)?;
    let last_update_text: Option<String> = row.get(7)?;
    let last_date_text: Option<String> = row.get(11)?;

    Ok(UserProgress {
        timezone_offset_minutes: row.get(0)?,
        goals: GoalState {
            progressive_goals_enabled: row.get(1)?,
            growth_rate_percent: row.get(2)?,
            growth_period,
            distance_goal_miles: row.get(4)?,
            duration_goal_minutes: row.get(5)?,
            destination_goals: parse_json(6, &destinations_text)?,
            last_goal_update: last_update_text
                .as_deref()
                .map(|t| parse_utc(7, t))
                .transpose()?,
            monthly_session_goal: row.get(8)?,
        },
        streak: StreakState {
            current_streak: row.get(9)?,
            longest_streak: row.get(10)?,
            last_session_date: last_date_text
                .as_deref()
                .map(|t| parse_date(11, t))
                .transpose()?,
        },
    })
}
