use bravely_core::content::{default_quotes, default_tips};
use bravely_core::ContentPicker;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum ContentAction {
    /// Print a motivational quote
    Quote {
        /// Fixed seed for a reproducible pick
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print a CBT tip
    Tip {
        /// Fixed seed for a reproducible pick
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn picker(seed: Option<u64>) -> ContentPicker {
    match seed {
        Some(seed) => ContentPicker::with_seed(seed),
        None => ContentPicker::new(),
    }
}

pub fn run(action: ContentAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ContentAction::Quote { seed } => {
            let quotes = default_quotes();
            super::print_json(&picker(seed).pick_quote(&quotes))
        }
        ContentAction::Tip { seed } => {
            let tips = default_tips();
            super::print_json(&picker(seed).pick_tip(&tips))
        }
    }
}
