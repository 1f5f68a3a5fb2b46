//! bravely-core: session history, streaks, and adaptive goals for
//! exposure practice.
//!
//! The crate is built around one rule: completed sessions are the only
//! source of truth. Stats, streaks, and goal growth are all derived
//! views over the session table, recomputed rather than incremented, so
//! an edit or deletion anywhere in history can never leave a stale
//! counter behind.
//!
//! [`engine::ExposureEngine`] is the main entry point; it drives the
//! recompute pipeline over any [`engine::SessionStore`]. The bundled
//! store is [`storage::Database`], a SQLite file under the user's
//! config directory.

pub mod clock;
pub mod content;
pub mod engine;
pub mod error;
pub mod goals;
pub mod session;
pub mod stats;
pub mod storage;
pub mod streak;

pub use clock::{UserClock, DAY_LABELS};
pub use content::{CbtTip, ContentPicker, Quote};
pub use engine::{ExposureEngine, ProgressUpdate, SessionStore, UserProgress};
pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use goals::{DestinationGoal, GoalEngine, GoalPolicy, GoalState, GrowthPeriod};
pub use session::{AnnotationUpdate, CompletionParams, NewSession, Session};
pub use stats::{DayTotal, MonthlyProgress, TodayStats};
pub use storage::{Config, Database};
pub use streak::StreakState;
