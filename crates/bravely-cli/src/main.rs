//! Command line interface for the Bravely exposure companion.
//!
//! Every subcommand prints its result as pretty JSON on stdout so the
//! output can be piped into `jq` or scripted against. Diagnostics go to
//! stderr via `tracing_subscriber`, controlled by `RUST_LOG`.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bravely", version, about = "Exposure session tracking, streaks, and adaptive goals")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register users and inspect their progress snapshot
    #[command(subcommand)]
    User(commands::user::UserAction),
    /// Start, complete, annotate, list, and delete sessions
    #[command(subcommand)]
    Session(commands::session::SessionAction),
    /// Today, weekly, and monthly aggregates
    #[command(subcommand)]
    Stats(commands::stats::StatsAction),
    /// Consecutive-day streak state
    #[command(subcommand)]
    Streak(commands::streak::StreakAction),
    /// Goal values, growth settings, and destination milestones
    #[command(subcommand)]
    Goals(commands::goals::GoalsAction),
    /// Motivational quotes and CBT tips
    #[command(subcommand)]
    Content(commands::content::ContentAction),
    /// Read and write the configuration file
    #[command(subcommand)]
    Config(commands::config::ConfigAction),
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::User(action) => commands::user::run(action),
        Commands::Session(action) => commands::session::run(action),
        Commands::Stats(action) => commands::stats::run(action),
        Commands::Streak(action) => commands::streak::run(action),
        Commands::Goals(action) => commands::goals::run(action),
        Commands::Content(action) => commands::content::run(action),
        Commands::Config(action) => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}
