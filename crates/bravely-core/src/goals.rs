//! Progressive goal growth and destination milestones.
//!
//! Users carry a distance goal in miles and a duration goal in minutes.
//! When progressive goals are enabled, both compound by a percentage once
//! per elapsed growth period (week or calendar month), evaluated lazily
//! whenever progress is recomputed. Growth is anchored to
//! `last_goal_update`: the anchor advances by whole periods only, so a
//! partial week carries over instead of being lost.
//!
//! Destination goals are an ordered route of named distance milestones.
//! They advance one at a time and never out of order.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ValidationError};

/// How often progressive goals compound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthPeriod {
    Weekly,
    Monthly,
}

impl GrowthPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrowthPeriod::Weekly => "weekly",
            GrowthPeriod::Monthly => "monthly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" => Some(GrowthPeriod::Weekly),
            "monthly" => Some(GrowthPeriod::Monthly),
            _ => None,
        }
    }

    /// Whole periods elapsed between two instants. Zero when `to` is not
    /// at least one full period after `from`.
    pub fn periods_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> u32 {
        if to <= from {
            return 0;
        }
        match self {
            GrowthPeriod::Weekly => {
                let weeks = (to - from).num_weeks();
                u32::try_from(weeks).unwrap_or(u32::MAX)
            }
            GrowthPeriod::Monthly => {
                let mut periods = 0u32;
                let mut cursor = from;
                while let Some(next) = cursor.checked_add_months(Months::new(1)) {
                    if next > to {
                        break;
                    }
                    cursor = next;
                    periods += 1;
                }
                periods
            }
        }
    }

    /// Advances an instant by a whole number of periods.
    pub fn advance(&self, from: DateTime<Utc>, periods: u32) -> DateTime<Utc> {
        match self {
            GrowthPeriod::Weekly => from + Duration::weeks(i64::from(periods)),
            GrowthPeriod::Monthly => from
                .checked_add_months(Months::new(periods))
                .unwrap_or(from),
        }
    }
}

/// A named distance milestone on the user's route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationGoal {
    pub name: String,
    pub distance_miles: f64,
    pub reached: bool,
    pub reached_at: Option<DateTime<Utc>>,
}

/// The full goal configuration and current values for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalState {
    pub progressive_goals_enabled: bool,
    pub growth_rate_percent: f64,
    pub growth_period: GrowthPeriod,
    pub distance_goal_miles: f64,
    pub duration_goal_minutes: u32,
    #[serde(default)]
    pub destination_goals: Vec<DestinationGoal>,
    /// Growth anchor: the instant up to which growth has been applied.
    pub last_goal_update: Option<DateTime<Utc>>,
    pub monthly_session_goal: u32,
}

impl Default for GoalState {
    fn default() -> Self {
        GoalState {
            progressive_goals_enabled: true,
            growth_rate_percent: 5.0,
            growth_period: GrowthPeriod::Weekly,
            distance_goal_miles: 1.0,
            duration_goal_minutes: 15,
            destination_goals: Vec::new(),
            last_goal_update: None,
            monthly_session_goal: 10,
        }
    }
}

impl GoalState {
    /// Appends a destination milestone to the end of the route.
    pub fn add_destination(&mut self, name: &str, distance_miles: f64) -> Result<(), ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyAnnotation { field: "destination name" });
        }
        if !distance_miles.is_finite() || distance_miles <= 0.0 {
            return Err(ValidationError::InvalidMetric {
                field: "destination distance_miles",
                value: distance_miles,
            });
        }
        self.destination_goals.push(DestinationGoal {
            name: name.trim().to_string(),
            distance_miles,
            reached: false,
            reached_at: None,
        });
        Ok(())
    }

    /// Marks at most one milestone reached: the earliest pending one,
    /// and only if `latest_distance_miles` meets its target. Later
    /// milestones stay pending even when the distance would cover them,
    /// so the route is walked strictly in order.
    pub fn advance_destination(
        &mut self,
        latest_distance_miles: f64,
        now: DateTime<Utc>,
    ) -> Option<DestinationGoal> {
        if !latest_distance_miles.is_finite() {
            return None;
        }
        let next = self.destination_goals.iter_mut().find(|g| !g.reached)?;
        if latest_distance_miles < next.distance_miles {
            return None;
        }
        next.reached = true;
        next.reached_at = Some(now);
        Some(next.clone())
    }

    /// Toggles progressive growth. Re-enabling re-anchors
    /// `last_goal_update` to `now`, so time spent disabled never turns
    /// into retroactive growth.
    pub fn set_progressive_enabled(&mut self, enabled: bool, now: DateTime<Utc>) {
        if enabled && !self.progressive_goals_enabled {
            self.last_goal_update = Some(now);
        }
        self.progressive_goals_enabled = enabled;
    }
}

/// Bounds that keep compounded goals sane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalPolicy {
    pub distance_floor_miles: f64,
    pub duration_floor_minutes: u32,
    pub max_distance_goal_miles: f64,
    pub max_duration_goal_minutes: u32,
    /// Most compounding steps applied in a single evaluation. Periods
    /// beyond the cap are dropped, not deferred, so a long absence does
    /// not snowball the goals.
    pub max_compound_steps: u32,
}

impl Default for GoalPolicy {
    fn default() -> Self {
        GoalPolicy {
            distance_floor_miles: 0.1,
            duration_floor_minutes: 5,
            max_distance_goal_miles: 26.2,
            max_duration_goal_minutes: 180,
            max_compound_steps: 12,
        }
    }
}

impl GoalPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.distance_floor_miles.is_finite() || self.distance_floor_miles <= 0.0 {
            return Err(invalid("goals.distance_floor_miles", "must be a positive number"));
        }
        if !self.max_distance_goal_miles.is_finite()
            || self.max_distance_goal_miles < self.distance_floor_miles
        {
            return Err(invalid(
                "goals.max_distance_goal_miles",
                "must be at least the distance floor",
            ));
        }
        if self.duration_floor_minutes == 0 {
            return Err(invalid("goals.duration_floor_minutes", "must be at least 1"));
        }
        if self.max_duration_goal_minutes < self.duration_floor_minutes {
            return Err(invalid(
                "goals.max_duration_goal_minutes",
                "must be at least the duration floor",
            ));
        }
        if self.max_compound_steps == 0 {
            return Err(invalid("goals.max_compound_steps", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

/// Summary of one growth evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrowthOutcome {
    pub periods_elapsed: u32,
    pub steps_applied: u32,
    pub distance_goal_miles: f64,
    pub duration_goal_minutes: u32,
}

/// Applies progressive growth to a [`GoalState`] under a [`GoalPolicy`].
#[derive(Debug, Clone, Default)]
pub struct GoalEngine {
    policy: GoalPolicy,
}

impl GoalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: GoalPolicy) -> Self {
        GoalEngine { policy }
    }

    pub fn policy(&self) -> &GoalPolicy {
        &self.policy
    }

    /// Evaluates growth as of `now` and mutates `state` in place.
    ///
    /// Growth compounds once per whole period elapsed since the anchor,
    /// up to `max_compound_steps`, then each goal is rounded to its
    /// stable precision (a tenth of a mile, a whole minute) and clamped
    /// into the policy bounds. The anchor always advances by the whole
    /// periods that elapsed, never to `now` itself, so partial periods
    /// carry over. While growth is disabled both the values and the
    /// anchor stay frozen.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when growth is due but the
    /// rate is zero, negative, or not finite.
    pub fn evaluate(
        &self,
        state: &mut GoalState,
        now: DateTime<Utc>,
    ) -> Result<GrowthOutcome, ConfigError> {
        let Some(anchor) = state.last_goal_update else {
            // First evaluation for this user: anchor without growing.
            state.last_goal_update = Some(now);
            return Ok(unchanged(state));
        };

        if !state.progressive_goals_enabled {
            return Ok(unchanged(state));
        }

        let periods = state.growth_period.periods_between(anchor, now);
        if periods == 0 {
            return Ok(unchanged(state));
        }

        if !state.growth_rate_percent.is_finite() || state.growth_rate_percent <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "goals.growth_rate_percent".to_string(),
                message: format!(
                    "must be a positive number to apply growth, got {}",
                    state.growth_rate_percent
                ),
            });
        }

        let steps = periods.min(self.policy.max_compound_steps);
        let multiplier = (1.0 + state.growth_rate_percent / 100.0).powi(steps as i32);

        let distance = round_distance_miles(state.distance_goal_miles * multiplier)
            .min(self.policy.max_distance_goal_miles)
            .max(self.policy.distance_floor_miles)
            .max(state.distance_goal_miles);

        let duration_raw = (f64::from(state.duration_goal_minutes) * multiplier)
            .round()
            .min(f64::from(self.policy.max_duration_goal_minutes));
        let duration = (duration_raw as u32)
            .max(self.policy.duration_floor_minutes)
            .max(state.duration_goal_minutes);

        state.distance_goal_miles = distance;
        state.duration_goal_minutes = duration;
        state.last_goal_update = Some(state.growth_period.advance(anchor, periods));

        tracing::debug!(
            periods,
            steps,
            distance_goal_miles = distance,
            duration_goal_minutes = duration,
            "applied progressive goal growth"
        );

        Ok(GrowthOutcome {
            periods_elapsed: periods,
            steps_applied: steps,
            distance_goal_miles: distance,
            duration_goal_minutes: duration,
        })
    }
}

fn unchanged(state: &GoalState) -> GrowthOutcome {
    GrowthOutcome {
        periods_elapsed: 0,
        steps_applied: 0,
        distance_goal_miles: state.distance_goal_miles,
        duration_goal_minutes: state.duration_goal_minutes,
    }
}

/// Rounds a distance to the nearest tenth of a mile.
pub fn round_distance_miles(miles: f64) -> f64 {
    (miles * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc_datetime(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn weekly_state(anchor: DateTime<Utc>) -> GoalState {
        GoalState {
            last_goal_update: Some(anchor),
            ..GoalState::default()
        }
    }

    #[test]
    fn three_weekly_periods_compound_then_round() {
        let anchor = utc_datetime(2025, 1, 6, 0, 0);
        let mut state = weekly_state(anchor);
        let engine = GoalEngine::new();

        // Three whole weeks plus a bit: 1.0 * 1.05^3 = 1.157625 -> 1.2.
        let now = utc_datetime(2025, 1, 27, 9, 30);
        let outcome = engine.evaluate(&mut state, now).unwrap();

        assert_eq!(outcome.periods_elapsed, 3);
        assert_eq!(outcome.steps_applied, 3);
        assert!((state.distance_goal_miles - 1.2).abs() < 1e-9);
        // 15 * 1.157625 = 17.364... -> 17 minutes.
        assert_eq!(state.duration_goal_minutes, 17);
    }

    #[test]
    fn anchor_advances_by_whole_periods_only() {
        let anchor = utc_datetime(2025, 1, 6, 0, 0);
        let mut state = weekly_state(anchor);
        let engine = GoalEngine::new();

        // Two weeks and three days elapsed.
        let now = utc_datetime(2025, 1, 23, 12, 0);
        engine.evaluate(&mut state, now).unwrap();

        assert_eq!(
            state.last_goal_update,
            Some(anchor + Duration::weeks(2)),
            "partial week must carry over, not be absorbed"
        );
    }

    #[test]
    fn partial_period_applies_nothing() {
        let anchor = utc_datetime(2025, 1, 6, 0, 0);
        let mut state = weekly_state(anchor);
        let engine = GoalEngine::new();

        let now = anchor + Duration::days(6);
        let outcome = engine.evaluate(&mut state, now).unwrap();

        assert_eq!(outcome.periods_elapsed, 0);
        assert!((state.distance_goal_miles - 1.0).abs() < 1e-9);
        assert_eq!(state.last_goal_update, Some(anchor));
    }

    #[test]
    fn evaluation_is_idempotent_at_the_same_instant() {
        let anchor = utc_datetime(2025, 1, 6, 0, 0);
        let mut state = weekly_state(anchor);
        let engine = GoalEngine::new();
        let now = utc_datetime(2025, 2, 10, 8, 0);

        engine.evaluate(&mut state, now).unwrap();
        let after_first = state.clone();
        engine.evaluate(&mut state, now).unwrap();
        assert_eq!(state, after_first);
    }

    #[test]
    fn compounding_steps_are_capped_but_anchor_still_advances() {
        let anchor = utc_datetime(2024, 1, 1, 0, 0);
        let mut state = weekly_state(anchor);
        state.growth_rate_percent = 1.0;
        let engine = GoalEngine::new();

        // Thirty weeks away from the anchor, cap is twelve steps.
        let now = anchor + Duration::weeks(30) + Duration::days(2);
        let outcome = engine.evaluate(&mut state, now).unwrap();

        assert_eq!(outcome.periods_elapsed, 30);
        assert_eq!(outcome.steps_applied, 12);
        assert_eq!(state.last_goal_update, Some(anchor + Duration::weeks(30)));
        // 1.0 * 1.01^12 = 1.1268... -> 1.1, not the 30-step value.
        assert!((state.distance_goal_miles - 1.1).abs() < 1e-9);
    }

    #[test]
    fn goals_clamp_at_policy_caps() {
        let anchor = utc_datetime(2025, 1, 1, 0, 0);
        let mut state = weekly_state(anchor);
        state.growth_rate_percent = 100.0;
        state.distance_goal_miles = 20.0;
        state.duration_goal_minutes = 170;
        let engine = GoalEngine::new();

        let now = anchor + Duration::weeks(4);
        engine.evaluate(&mut state, now).unwrap();

        assert!((state.distance_goal_miles - 26.2).abs() < 1e-9);
        assert_eq!(state.duration_goal_minutes, 180);
    }

    #[test]
    fn disabled_growth_freezes_values_and_anchor() {
        let anchor = utc_datetime(2025, 1, 6, 0, 0);
        let mut state = weekly_state(anchor);
        state.progressive_goals_enabled = false;
        let engine = GoalEngine::new();

        let now = anchor + Duration::weeks(8);
        let outcome = engine.evaluate(&mut state, now).unwrap();

        assert_eq!(outcome.steps_applied, 0);
        assert!((state.distance_goal_miles - 1.0).abs() < 1e-9);
        assert_eq!(state.last_goal_update, Some(anchor));
    }

    #[test]
    fn reenabling_reanchors_without_retroactive_growth() {
        let anchor = utc_datetime(2025, 1, 6, 0, 0);
        let mut state = weekly_state(anchor);
        state.progressive_goals_enabled = false;
        let engine = GoalEngine::new();

        let later = anchor + Duration::weeks(6);
        state.set_progressive_enabled(true, later);
        assert_eq!(state.last_goal_update, Some(later));

        let outcome = engine.evaluate(&mut state, later).unwrap();
        assert_eq!(outcome.periods_elapsed, 0);
        assert!((state.distance_goal_miles - 1.0).abs() < 1e-9);
    }

    #[test]
    fn monthly_periods_follow_the_calendar() {
        let anchor = utc_datetime(2025, 1, 15, 10, 0);
        let mut state = weekly_state(anchor);
        state.growth_period = GrowthPeriod::Monthly;
        let engine = GoalEngine::new();

        // Two whole calendar months, a few days into the third.
        let now = utc_datetime(2025, 3, 20, 10, 0);
        let outcome = engine.evaluate(&mut state, now).unwrap();

        assert_eq!(outcome.periods_elapsed, 2);
        assert_eq!(state.last_goal_update, Some(utc_datetime(2025, 3, 15, 10, 0)));
    }

    #[test]
    fn growth_due_with_bad_rate_is_an_error() {
        let anchor = utc_datetime(2025, 1, 6, 0, 0);
        let mut state = weekly_state(anchor);
        state.growth_rate_percent = 0.0;
        let engine = GoalEngine::new();

        let err = engine
            .evaluate(&mut state, anchor + Duration::weeks(2))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        // State stays untouched on error.
        assert!((state.distance_goal_miles - 1.0).abs() < 1e-9);
        assert_eq!(state.last_goal_update, Some(anchor));
    }

    #[test]
    fn bad_rate_without_due_growth_is_tolerated() {
        let anchor = utc_datetime(2025, 1, 6, 0, 0);
        let mut state = weekly_state(anchor);
        state.growth_rate_percent = 0.0;
        let engine = GoalEngine::new();

        assert!(engine.evaluate(&mut state, anchor + Duration::days(2)).is_ok());
    }

    #[test]
    fn missing_anchor_initializes_without_growth() {
        let mut state = GoalState::default();
        assert!(state.last_goal_update.is_none());
        let engine = GoalEngine::new();

        let now = utc_datetime(2025, 5, 1, 7, 0);
        let outcome = engine.evaluate(&mut state, now).unwrap();

        assert_eq!(outcome.steps_applied, 0);
        assert_eq!(state.last_goal_update, Some(now));
    }

    #[test]
    fn destinations_advance_in_order_one_per_call() {
        let mut state = GoalState::default();
        state.add_destination("mailbox", 0.1).unwrap();
        state.add_destination("corner store", 0.5).unwrap();
        let now = utc_datetime(2025, 4, 2, 16, 0);

        // Far enough for both, but only the first advances.
        let reached = state.advance_destination(2.0, now).unwrap();
        assert_eq!(reached.name, "mailbox");
        assert!(state.destination_goals[0].reached);
        assert!(!state.destination_goals[1].reached);

        let reached = state.advance_destination(2.0, now).unwrap();
        assert_eq!(reached.name, "corner store");
        assert!(state.destination_goals[1].reached);

        assert!(state.advance_destination(2.0, now).is_none());
    }

    #[test]
    fn short_distance_advances_nothing() {
        let mut state = GoalState::default();
        state.add_destination("mailbox", 0.5).unwrap();
        assert!(state
            .advance_destination(0.3, utc_datetime(2025, 4, 2, 16, 0))
            .is_none());
        assert!(!state.destination_goals[0].reached);
    }

    #[test]
    fn destination_input_is_validated() {
        let mut state = GoalState::default();
        assert!(state.add_destination("  ", 1.0).is_err());
        assert!(state.add_destination("park", 0.0).is_err());
        assert!(state.add_destination("park", f64::NAN).is_err());
    }

    #[test]
    fn default_policy_is_valid() {
        GoalPolicy::default().validate().unwrap();
    }

    #[test]
    fn policy_rejects_cap_below_floor() {
        let policy = GoalPolicy {
            max_distance_goal_miles: 0.05,
            ..GoalPolicy::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn growth_period_round_trips_through_strings() {
        assert_eq!(GrowthPeriod::parse("weekly"), Some(GrowthPeriod::Weekly));
        assert_eq!(GrowthPeriod::parse("Monthly "), Some(GrowthPeriod::Monthly));
        assert_eq!(GrowthPeriod::parse("daily"), None);
        assert_eq!(GrowthPeriod::Weekly.as_str(), "weekly");
    }

    #[test]
    fn distance_rounding_is_to_tenths() {
        assert!((round_distance_miles(1.157625) - 1.2).abs() < 1e-9);
        assert!((round_distance_miles(1.04) - 1.0).abs() < 1e-9);
        assert!((round_distance_miles(0.25) - 0.3).abs() < 1e-9);
    }
}
