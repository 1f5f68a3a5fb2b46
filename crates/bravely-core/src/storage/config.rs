//! TOML configuration with dot-path get/set access.
//!
//! The config file holds install-wide defaults: the clock offset and
//! goal parameters applied to newly registered users, plus the bounds
//! the growth engine enforces for everyone. Missing keys fall back to
//! defaults, so an empty file is a valid config.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};
use crate::goals::{GoalPolicy, GoalState, GrowthPeriod};

fn default_timezone_offset_minutes() -> i32 {
    0
}

fn default_progressive_goals_enabled() -> bool {
    true
}

fn default_growth_rate_percent() -> f64 {
    5.0
}

fn default_growth_period() -> GrowthPeriod {
    GrowthPeriod::Weekly
}

fn default_initial_distance_goal_miles() -> f64 {
    1.0
}

fn default_initial_duration_goal_minutes() -> u32 {
    15
}

fn default_monthly_session_goal() -> u32 {
    10
}

fn default_distance_floor_miles() -> f64 {
    0.1
}

fn default_duration_floor_minutes() -> u32 {
    5
}

fn default_max_distance_goal_miles() -> f64 {
    26.2
}

fn default_max_duration_goal_minutes() -> u32 {
    180
}

fn default_max_compound_steps() -> u32 {
    12
}

/// Clock defaults for new users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Minutes east of UTC applied to users registered without an
    /// explicit offset.
    #[serde(default = "default_timezone_offset_minutes")]
    pub timezone_offset_minutes: i32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        ClockConfig {
            timezone_offset_minutes: default_timezone_offset_minutes(),
        }
    }
}

impl ClockConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timezone_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::InvalidValue {
                key: "clock.timezone_offset_minutes".to_string(),
                message: "must be within one day of UTC".to_string(),
            });
        }
        Ok(())
    }
}

/// Goal defaults for new users and bounds for the growth engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalsConfig {
    #[serde(default = "default_progressive_goals_enabled")]
    pub progressive_goals_enabled: bool,
    #[serde(default = "default_growth_rate_percent")]
    pub growth_rate_percent: f64,
    #[serde(default = "default_growth_period")]
    pub growth_period: GrowthPeriod,
    #[serde(default = "default_initial_distance_goal_miles")]
    pub initial_distance_goal_miles: f64,
    #[serde(default = "default_initial_duration_goal_minutes")]
    pub initial_duration_goal_minutes: u32,
    #[serde(default = "default_monthly_session_goal")]
    pub monthly_session_goal: u32,
    #[serde(default = "default_distance_floor_miles")]
    pub distance_floor_miles: f64,
    #[serde(default = "default_duration_floor_minutes")]
    pub duration_floor_minutes: u32,
    #[serde(default = "default_max_distance_goal_miles")]
    pub max_distance_goal_miles: f64,
    #[serde(default = "default_max_duration_goal_minutes")]
    pub max_duration_goal_minutes: u32,
    #[serde(default = "default_max_compound_steps")]
    pub max_compound_steps: u32,
}

impl Default for GoalsConfig {
    fn default() -> Self {
        GoalsConfig {
            progressive_goals_enabled: default_progressive_goals_enabled(),
            growth_rate_percent: default_growth_rate_percent(),
            growth_period: default_growth_period(),
            initial_distance_goal_miles: default_initial_distance_goal_miles(),
            initial_duration_goal_minutes: default_initial_duration_goal_minutes(),
            monthly_session_goal: default_monthly_session_goal(),
            distance_floor_miles: default_distance_floor_miles(),
            duration_floor_minutes: default_duration_floor_minutes(),
            max_distance_goal_miles: default_max_distance_goal_miles(),
            max_duration_goal_minutes: default_max_duration_goal_minutes(),
            max_compound_steps: default_max_compound_steps(),
        }
    }
}

impl GoalsConfig {
    /// The growth bounds as a [`GoalPolicy`], validated.
    pub fn policy(&self) -> Result<GoalPolicy, ConfigError> {
        let policy = GoalPolicy {
            distance_floor_miles: self.distance_floor_miles,
            duration_floor_minutes: self.duration_floor_minutes,
            max_distance_goal_miles: self.max_distance_goal_miles,
            max_duration_goal_minutes: self.max_duration_goal_minutes,
            max_compound_steps: self.max_compound_steps,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let policy = self.policy()?;
        if !self.growth_rate_percent.is_finite() || self.growth_rate_percent <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "goals.growth_rate_percent".to_string(),
                message: "must be a positive number".to_string(),
            });
        }
        if self.initial_distance_goal_miles < policy.distance_floor_miles
            || self.initial_distance_goal_miles > policy.max_distance_goal_miles
        {
            return Err(ConfigError::InvalidValue {
                key: "goals.initial_distance_goal_miles".to_string(),
                message: "must fall between the distance floor and cap".to_string(),
            });
        }
        if self.initial_duration_goal_minutes < policy.duration_floor_minutes
            || self.initial_duration_goal_minutes > policy.max_duration_goal_minutes
        {
            return Err(ConfigError::InvalidValue {
                key: "goals.initial_duration_goal_minutes".to_string(),
                message: "must fall between the duration floor and cap".to_string(),
            });
        }
        if self.monthly_session_goal == 0 {
            return Err(ConfigError::InvalidValue {
                key: "goals.monthly_session_goal".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Goal state for a user registered at `registered_at`. The anchor
    /// starts at registration so the first growth period begins there.
    pub fn initial_goal_state(&self, registered_at: DateTime<Utc>) -> GoalState {
        GoalState {
            progressive_goals_enabled: self.progressive_goals_enabled,
            growth_rate_percent: self.growth_rate_percent,
            growth_period: self.growth_period,
            distance_goal_miles: self.initial_distance_goal_miles,
            duration_goal_minutes: self.initial_duration_goal_minutes,
            destination_goals: Vec::new(),
            last_goal_update: Some(registered_at),
            monthly_session_goal: self.monthly_session_goal,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub goals: GoalsConfig,
}

impl Config {
    pub fn path() -> PathBuf {
        super::data_dir().join("config.toml")
    }

    /// Loads the config file, falling back to defaults when it does not
    /// exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::path();
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config = toml::from_str(&text)
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::SaveFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        }
        let text = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(&path, text).map_err(|e| ConfigError::SaveFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.clock.validate()?;
        self.goals.validate()
    }

    /// Reads a value by dot path, for example `goals.growth_rate_percent`.
    pub fn get(&self, key: &str) -> Result<serde_json::Value> {
        let root = serde_json::to_value(self)?;
        let mut node = &root;
        for part in key.split('.') {
            node = node
                .get(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }
        Ok(node.clone())
    }

    /// Writes a value by dot path. `raw` is parsed as JSON first and
    /// treated as a bare string when that fails, so `5.0`, `true`, and
    /// `weekly` all do what they look like. The updated config must
    /// still deserialize and validate.
    pub fn set(&mut self, key: &str, raw: &str) -> Result<()> {
        let mut root = serde_json::to_value(&*self)?;
        let value: serde_json::Value = serde_json::from_str(raw)
            .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));

        let (parent_path, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        let mut node = &mut root;
        if let Some(parent) = parent_path {
            for part in parent.split('.') {
                node = node
                    .get_mut(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
            }
        }
        let slot = node
            .get_mut(leaf)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        *slot = value;

        let updated: Config = serde_json::from_value(root).map_err(|e| {
            ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}
