use bravely_core::{GrowthPeriod, SessionStore, ValidationError};
use chrono::Utc;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum GoalsAction {
    /// Print the current goal state
    Show {
        /// User id
        #[arg(long)]
        user: i64,
    },
    /// Set the growth rate, in percent per period
    SetRate {
        /// User id
        #[arg(long)]
        user: i64,
        /// Percentage, e.g. 5.0
        rate: f64,
    },
    /// Set the growth period
    SetPeriod {
        /// User id
        #[arg(long)]
        user: i64,
        /// "weekly" or "monthly"
        period: String,
    },
    /// Enable progressive growth, anchored to now
    Enable {
        /// User id
        #[arg(long)]
        user: i64,
    },
    /// Disable progressive growth, freezing current values
    Disable {
        /// User id
        #[arg(long)]
        user: i64,
    },
    /// Append a destination milestone to the route
    AddDestination {
        /// User id
        #[arg(long)]
        user: i64,
        /// Milestone name, e.g. "the corner shop"
        name: String,
        /// One-way distance, in miles
        distance_miles: f64,
    },
}

pub fn run(action: GoalsAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = super::open_engine()?;
    let now = Utc::now();

    match action {
        GoalsAction::Show { user } => {
            let progress = engine.user_progress(user)?;
            super::print_json(&progress.goals)
        }
        GoalsAction::SetRate { user, rate } => {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(ValidationError::InvalidValue {
                    field: "growth_rate_percent",
                    message: "must be a positive number".to_string(),
                }
                .into());
            }
            let mut progress = engine.user_progress(user)?;
            progress.goals.growth_rate_percent = rate;
            engine.store().save_progress(user, &progress)?;
            super::print_json(&progress.goals)
        }
        GoalsAction::SetPeriod { user, period } => {
            let parsed = GrowthPeriod::parse(&period).ok_or(ValidationError::InvalidValue {
                field: "growth_period",
                message: format!("unknown period: {period}"),
            })?;
            let mut progress = engine.user_progress(user)?;
            progress.goals.growth_period = parsed;
            engine.store().save_progress(user, &progress)?;
            super::print_json(&progress.goals)
        }
        GoalsAction::Enable { user } => {
            let mut progress = engine.user_progress(user)?;
            progress.goals.set_progressive_enabled(true, now);
            engine.store().save_progress(user, &progress)?;
            super::print_json(&progress.goals)
        }
        GoalsAction::Disable { user } => {
            let mut progress = engine.user_progress(user)?;
            progress.goals.set_progressive_enabled(false, now);
            engine.store().save_progress(user, &progress)?;
            super::print_json(&progress.goals)
        }
        GoalsAction::AddDestination {
            user,
            name,
            distance_miles,
        } => {
            let mut progress = engine.user_progress(user)?;
            progress.goals.add_destination(&name, distance_miles)?;
            engine.store().save_progress(user, &progress)?;
            super::print_json(&progress.goals)
        }
    }
}
