use chrono::Utc;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Distance and minutes completed today
    Today {
        /// User id
        #[arg(long)]
        user: i64,
    },
    /// Minutes per day for the current week, Monday first
    Weekly {
        /// User id
        #[arg(long)]
        user: i64,
    },
    /// Completed sessions this month against the monthly goal
    Monthly {
        /// User id
        #[arg(long)]
        user: i64,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = super::open_engine()?;
    let now = Utc::now();

    match action {
        StatsAction::Today { user } => super::print_json(&engine.today_stats(user, now)?),
        StatsAction::Weekly { user } => super::print_json(&engine.weekly_stats(user, now)?),
        StatsAction::Monthly { user } => super::print_json(&engine.monthly_stats(user, now)?),
    }
}
