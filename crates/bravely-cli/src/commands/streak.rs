use clap::Subcommand;

#[derive(Subcommand)]
pub enum StreakAction {
    /// Print the current and longest consecutive-day streak
    Show {
        /// User id
        #[arg(long)]
        user: i64,
    },
}

pub fn run(action: StreakAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        StreakAction::Show { user } => {
            let engine = super::open_engine()?;
            let progress = engine.user_progress(user)?;
            super::print_json(&progress.streak)
        }
    }
}
