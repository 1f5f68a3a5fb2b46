//! Database schema migrations.
//!
//! The schema version lives in its own table and migrations apply
//! sequentially inside one transaction, so a database is either fully
//! on a version or untouched. Column additions are guarded by a
//! table-info check, which keeps every migration safe to re-run.

use rusqlite::Connection;

use crate::error::DatabaseError;

/// Version the code expects. Bump together with a new `migrate_vN`.
pub const CURRENT_VERSION: i64 = 2;

/// Brings the database up to [`CURRENT_VERSION`].
pub fn migrate(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
    )?;
    let version = current_version(conn)?;
    if version >= CURRENT_VERSION {
        return Ok(());
    }

    let tx = conn.unchecked_transaction()?;
    if version < 1 {
        migrate_v1(&tx).map_err(|e| tag("v1", e))?;
    }
    if version < 2 {
        migrate_v2(&tx).map_err(|e| tag("v2", e))?;
    }
    set_version(&tx, CURRENT_VERSION)?;
    tx.commit()?;
    Ok(())
}

/// Highest version recorded so far, zero for a fresh database.
pub fn current_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

fn set_version(conn: &Connection, version: i64) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        rusqlite::params![version],
    )?;
    Ok(())
}

fn tag(step: &str, err: DatabaseError) -> DatabaseError {
    DatabaseError::MigrationFailed(format!("{step}: {err}"))
}

/// Baseline schema: sessions, per-user progress snapshots, indexes.
fn migrate_v1(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS sessions (
            id             TEXT PRIMARY KEY,
            user_id        INTEGER NOT NULL,
            start_time     TEXT NOT NULL,
            end_time       TEXT,
            duration_min   INTEGER,
            distance_miles REAL,
            fear_before    INTEGER NOT NULL,
            fear_after     INTEGER,
            mood_before    INTEGER NOT NULL,
            mood_after     INTEGER,
            is_active      INTEGER NOT NULL DEFAULT 1,
            notes          TEXT
        );

        CREATE TABLE IF NOT EXISTS user_progress (
            user_id                   INTEGER PRIMARY KEY AUTOINCREMENT,
            timezone_offset_min       INTEGER NOT NULL DEFAULT 0,
            progressive_goals_enabled INTEGER NOT NULL DEFAULT 1,
            growth_rate_percent       REAL NOT NULL DEFAULT 5.0,
            growth_period             TEXT NOT NULL DEFAULT 'weekly',
            distance_goal_miles       REAL NOT NULL DEFAULT 1.0,
            duration_goal_min         INTEGER NOT NULL DEFAULT 15,
            destination_goals         TEXT NOT NULL DEFAULT '[]',
            last_goal_update          TEXT,
            monthly_session_goal      INTEGER NOT NULL DEFAULT 10,
            current_streak            INTEGER NOT NULL DEFAULT 0,
            longest_streak            INTEGER NOT NULL DEFAULT 0,
            last_session_date         TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_user_start
            ON sessions (user_id, start_time);
        CREATE INDEX IF NOT EXISTS idx_sessions_user_end
            ON sessions (user_id, end_time);",
    )?;
    Ok(())
}

/// Reflection-era columns: mood tag, daily intention, tools, reflection.
fn migrate_v2(conn: &Connection) -> Result<(), DatabaseError> {
    add_column_if_missing(conn, "sessions", "mood_tag", "TEXT")?;
    add_column_if_missing(conn, "sessions", "daily_intention", "TEXT")?;
    add_column_if_missing(conn, "sessions", "tools_used", "TEXT NOT NULL DEFAULT '[]'")?;
    add_column_if_missing(conn, "sessions", "reflection", "TEXT")?;
    Ok(())
}

fn add_column_if_missing(
    conn: &Connection,
    table: &str,
    column: &str,
    decl: &str,
) -> Result<(), DatabaseError> {
    if column_exists(conn, table, column)? {
        return Ok(());
    }
    conn.execute(
        &format!("ALTER TABLE {table} ADD COLUMN {column} {decl}"),
        [],
    )?;
    Ok(())
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, DatabaseError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
