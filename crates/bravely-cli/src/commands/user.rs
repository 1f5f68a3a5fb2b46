use bravely_core::{Config, Database, UserProgress};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum UserAction {
    /// Register a new user seeded from config defaults
    Register {
        /// Minutes east of UTC for the user's local calendar
        #[arg(long)]
        timezone_offset_minutes: Option<i32>,
    },
    /// Print a user's stored progress snapshot
    Show {
        /// User id
        user_id: i64,
    },
}

pub fn run(action: UserAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        UserAction::Register {
            timezone_offset_minutes,
        } => {
            let config = Config::load()?;
            config.validate()?;
            let offset =
                timezone_offset_minutes.unwrap_or(config.clock.timezone_offset_minutes);
            let progress = UserProgress::new(
                offset,
                config.goals.initial_goal_state(chrono::Utc::now()),
            );
            let db = Database::open()?;
            let user_id = db.register_user(&progress)?;
            super::print_json(&serde_json::json!({
                "user_id": user_id,
                "progress": progress,
            }))
        }
        UserAction::Show { user_id } => {
            let engine = super::open_engine()?;
            super::print_json(&engine.user_progress(user_id)?)
        }
    }
}
