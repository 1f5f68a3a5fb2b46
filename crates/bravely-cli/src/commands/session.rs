use bravely_core::{AnnotationUpdate, CompletionParams, CoreError, NewSession};
use chrono::Utc;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start a new exposure session right now
    Start {
        /// User id
        #[arg(long)]
        user: i64,
        /// Fear rating before heading out, 1-10
        #[arg(long)]
        fear: u8,
        /// Mood rating before heading out, 1-10
        #[arg(long)]
        mood: u8,
        /// Intention for this outing
        #[arg(long)]
        intention: Option<String>,
        /// One-word mood label
        #[arg(long)]
        mood_tag: Option<String>,
        /// Free-form note
        #[arg(long)]
        note: Option<String>,
        /// Coping tool planned for this outing (repeatable)
        #[arg(long = "tool")]
        tools: Vec<String>,
    },
    /// Complete a session and recompute streaks and goals
    Complete {
        /// Session id
        id: String,
        /// Fear rating after the outing, 1-10
        #[arg(long)]
        fear: u8,
        /// Mood rating after the outing, 1-10
        #[arg(long)]
        mood: u8,
        /// Override the derived duration, in minutes
        #[arg(long)]
        duration: Option<u32>,
        /// Distance covered, in miles
        #[arg(long)]
        distance: Option<f64>,
        /// Free-form note
        #[arg(long)]
        note: Option<String>,
        /// Post-session reflection
        #[arg(long)]
        reflection: Option<String>,
        /// Coping tool actually used (repeatable, replaces the planned list)
        #[arg(long = "tool")]
        tools: Vec<String>,
    },
    /// Print one session
    Show {
        /// Session id
        id: String,
    },
    /// Print the in-progress session, if any
    Active {
        /// User id
        #[arg(long)]
        user: i64,
    },
    /// List sessions, newest first
    List {
        /// User id
        #[arg(long)]
        user: i64,
        /// Maximum number of sessions to print
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Edit notes and annotations on a session
    Annotate {
        /// Session id
        id: String,
        /// Free-form note
        #[arg(long)]
        note: Option<String>,
        /// One-word mood label
        #[arg(long)]
        mood_tag: Option<String>,
        /// Intention for the outing
        #[arg(long)]
        intention: Option<String>,
        /// Post-session reflection
        #[arg(long)]
        reflection: Option<String>,
    },
    /// Delete a session and recompute streaks and goals
    Delete {
        /// Session id
        id: String,
    },
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = super::open_engine()?;
    let now = Utc::now();

    match action {
        SessionAction::Start {
            user,
            fear,
            mood,
            intention,
            mood_tag,
            note,
            tools,
        } => {
            let session = engine.store().create_session(NewSession {
                user_id: user,
                start_time: now,
                fear_before: fear,
                mood_before: mood,
                notes: note,
                mood_tag,
                daily_intention: intention,
                tools_used: tools,
            })?;
            super::print_json(&session)
        }
        SessionAction::Complete {
            id,
            fear,
            mood,
            duration,
            distance,
            note,
            reflection,
            tools,
        } => {
            let completed = engine.store().complete_session(
                &id,
                &CompletionParams {
                    end_time: now,
                    duration_minutes: duration,
                    distance_miles: distance,
                    fear_after: fear,
                    mood_after: mood,
                    notes: note,
                    reflection,
                    tools_used: if tools.is_empty() { None } else { Some(tools) },
                },
            )?;
            let update = engine.on_session_completed(&completed, now)?;
            super::print_json(&serde_json::json!({
                "session": completed,
                "progress": update,
            }))
        }
        SessionAction::Show { id } => {
            let session = engine
                .store()
                .get_session(&id)?
                .ok_or(CoreError::SessionNotFound { id })?;
            super::print_json(&session)
        }
        SessionAction::Active { user } => {
            super::print_json(&engine.store().active_session(user)?)
        }
        SessionAction::List { user, limit } => {
            super::print_json(&engine.store().list_sessions(user, limit)?)
        }
        SessionAction::Annotate {
            id,
            note,
            mood_tag,
            intention,
            reflection,
        } => {
            let session = engine.store().update_annotations(
                &id,
                &AnnotationUpdate {
                    notes: note,
                    mood_tag,
                    daily_intention: intention,
                    reflection,
                    tools_used: None,
                },
            )?;
            super::print_json(&session)
        }
        SessionAction::Delete { id } => {
            let deleted = engine
                .store()
                .delete_session(&id)?
                .ok_or(CoreError::SessionNotFound { id })?;
            let update = engine.on_session_deleted(deleted.user_id, now)?;
            super::print_json(&serde_json::json!({
                "deleted": deleted,
                "progress": update,
            }))
        }
    }
}
