//! Motivational quotes and CBT tips.
//!
//! Selection is uniform over a corpus and takes the random source as
//! input, so callers can pass a fixed seed for reproducible picks.

use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CbtTip {
    pub title: String,
    pub description: String,
    pub category: String,
}

/// Built-in quote corpus, used when no external source is configured.
pub fn default_quotes() -> Vec<Quote> {
    [
        ("Every step forward is progress, no matter how small.", Some("Bravely")),
        ("Courage is not the absence of fear, but acting in spite of it.", None),
        ("The door is still the door whether you open it today or tomorrow. Today counts double.", None),
        ("Feelings are visitors. Let them come and go.", Some("Mooji")),
        ("You do not have to see the whole staircase, just take the first step.", Some("Martin Luther King Jr.")),
        ("Anxiety is a wave. You have surfed every single one so far.", None),
        ("Ten minutes outside is ten minutes your fear did not choose for you.", Some("Bravely")),
        ("Slow is smooth, smooth is fast.", None),
    ]
    .into_iter()
    .map(|(text, author)| Quote {
        text: text.to_string(),
        author: author.map(str::to_string),
    })
    .collect()
}

/// Built-in CBT tip corpus.
pub fn default_tips() -> Vec<CbtTip> {
    [
        (
            "Breathing",
            "Take slow, deep breaths. In for four counts, hold for four, out for six.",
            "grounding",
        ),
        (
            "5-4-3-2-1",
            "Name five things you can see, four you can touch, three you can hear, two you can smell, one you can taste.",
            "grounding",
        ),
        (
            "Label the thought",
            "When a catastrophic thought shows up, name it: 'that is the prediction, not the fact'.",
            "cognitive",
        ),
        (
            "Set a turnaround point",
            "Pick a landmark before you leave. Reaching it and turning back is a complete session, not a retreat.",
            "planning",
        ),
        (
            "Ride the peak",
            "Fear rises, crests, and falls on its own. Time the crest instead of fleeing it and watch the number drop.",
            "exposure",
        ),
        (
            "Drop the safety check",
            "Try one outing without your usual safety object. Note what actually happened versus what you predicted.",
            "exposure",
        ),
    ]
    .into_iter()
    .map(|(title, description, category)| CbtTip {
        title: title.to_string(),
        description: description.to_string(),
        category: category.to_string(),
    })
    .collect()
}

/// Picks one element uniformly, or `None` for an empty corpus.
pub fn pick_one<'a, T>(items: &'a [T], rng: &mut impl Rng) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(rng.gen_range(0..items.len()))
}

/// Corpus picker with an optional fixed seed for reproducibility.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentPicker {
    seed: Option<u64>,
}

impl ContentPicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: u64) -> Self {
        ContentPicker { seed: Some(seed) }
    }

    fn rng(&self) -> Mcg128Xsl64 {
        match self.seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        }
    }

    pub fn pick_quote<'a>(&self, quotes: &'a [Quote]) -> Option<&'a Quote> {
        let mut rng = self.rng();
        pick_one(quotes, &mut rng)
    }

    pub fn pick_tip<'a>(&self, tips: &'a [CbtTip]) -> Option<&'a CbtTip> {
        let mut rng = self.rng();
        pick_one(tips, &mut rng)
    }
}
