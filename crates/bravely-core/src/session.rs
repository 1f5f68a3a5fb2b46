//! Exposure session records and write-path validation.
//!
//! A session is created when the user steps out the door and mutated in
//! place when they complete it. Completion is what makes a session count
//! toward stats, streaks, and goals, and it is signalled by `end_time`
//! being set. Validation happens before anything touches storage so the
//! database only ever holds well-formed rows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::UserClock;
use crate::error::ValidationError;

/// Lowest accepted fear or mood rating.
pub const RATING_MIN: u8 = 1;
/// Highest accepted fear or mood rating.
pub const RATING_MAX: u8 = 10;

/// One exposure outing, from the moment the user starts until they
/// return and log how it went.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Stable unique id, a UUID string.
    pub id: String,
    pub user_id: i64,
    pub start_time: DateTime<Utc>,
    /// Set when the session completes; `None` means still in progress.
    pub end_time: Option<DateTime<Utc>>,
    /// Minutes outside, user-entered or derived from the time range.
    pub duration_minutes: Option<u32>,
    pub distance_miles: Option<f64>,
    pub fear_before: u8,
    pub fear_after: Option<u8>,
    pub mood_before: u8,
    pub mood_after: Option<u8>,
    pub is_active: bool,
    pub notes: Option<String>,
    pub mood_tag: Option<String>,
    pub daily_intention: Option<String>,
    #[serde(default)]
    pub tools_used: Vec<String>,
    pub reflection: Option<String>,
}

/// Input for starting a new session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSession {
    pub user_id: i64,
    pub start_time: DateTime<Utc>,
    pub fear_before: u8,
    pub mood_before: u8,
    pub notes: Option<String>,
    pub mood_tag: Option<String>,
    pub daily_intention: Option<String>,
    #[serde(default)]
    pub tools_used: Vec<String>,
}

/// Input for completing an in-progress session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionParams {
    pub end_time: DateTime<Utc>,
    /// Override for the derived duration, in minutes.
    pub duration_minutes: Option<u32>,
    pub distance_miles: Option<f64>,
    pub fear_after: u8,
    pub mood_after: u8,
    pub notes: Option<String>,
    pub reflection: Option<String>,
    /// `Some` replaces the recorded tool list, `None` keeps it.
    pub tools_used: Option<Vec<String>>,
}

/// Partial edit of a session's free-text fields. `None` leaves a field
/// unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotationUpdate {
    pub notes: Option<String>,
    pub mood_tag: Option<String>,
    pub daily_intention: Option<String>,
    pub reflection: Option<String>,
    pub tools_used: Option<Vec<String>>,
}

impl Session {
    /// Validates and builds a fresh in-progress session from input.
    pub fn start(new: NewSession) -> Result<Self, ValidationError> {
        new.validate()?;
        Ok(Session {
            id: Uuid::new_v4().to_string(),
            user_id: new.user_id,
            start_time: new.start_time,
            end_time: None,
            duration_minutes: None,
            distance_miles: None,
            fear_before: new.fear_before,
            fear_after: None,
            mood_before: new.mood_before,
            mood_after: None,
            is_active: true,
            notes: new.notes,
            mood_tag: new.mood_tag,
            daily_intention: new.daily_intention,
            tools_used: new.tools_used,
            reflection: None,
        })
    }

    /// A session counts toward stats, streaks, and goals only once it
    /// has an end time.
    pub fn is_complete(&self) -> bool {
        self.end_time.is_some()
    }

    /// Minutes to attribute to this session: the recorded value if the
    /// user entered one, otherwise the elapsed time, otherwise zero.
    pub fn effective_duration_minutes(&self) -> u32 {
        if let Some(minutes) = self.duration_minutes {
            return minutes;
        }
        match self.end_time {
            Some(end) => {
                let elapsed = (end - self.start_time).num_minutes();
                u32::try_from(elapsed).unwrap_or(0)
            }
            None => 0,
        }
    }

    /// The local calendar day this session belongs to. Attribution is by
    /// start time, so a 23:50 outing stays on the day it began.
    pub fn local_start_date(&self, clock: &UserClock) -> NaiveDate {
        clock.local_date(self.start_time)
    }

    /// Validates completion input and applies it to this session.
    ///
    /// Idempotent over repeated calls with the same parameters. Derives
    /// `duration_minutes` from the time range when no override is given.
    pub fn apply_completion(&mut self, params: &CompletionParams) -> Result<(), ValidationError> {
        if params.end_time < self.start_time {
            return Err(ValidationError::InvalidTimeRange {
                start: self.start_time.to_rfc3339(),
                end: params.end_time.to_rfc3339(),
            });
        }
        check_rating("fear_after", params.fear_after)?;
        check_rating("mood_after", params.mood_after)?;
        check_metric("distance_miles", params.distance_miles)?;
        check_annotation("notes", params.notes.as_deref())?;
        check_annotation("reflection", params.reflection.as_deref())?;
        if let Some(tools) = &params.tools_used {
            check_tools(tools)?;
        }

        self.end_time = Some(params.end_time);
        self.duration_minutes = Some(params.duration_minutes.unwrap_or_else(|| {
            let elapsed = (params.end_time - self.start_time).num_minutes();
            u32::try_from(elapsed).unwrap_or(0)
        }));
        self.distance_miles = params.distance_miles;
        self.fear_after = Some(params.fear_after);
        self.mood_after = Some(params.mood_after);
        self.is_active = false;
        if params.notes.is_some() {
            self.notes = params.notes.clone();
        }
        if params.reflection.is_some() {
            self.reflection = params.reflection.clone();
        }
        if let Some(tools) = &params.tools_used {
            self.tools_used = tools.clone();
        }
        Ok(())
    }

    /// Validates and applies a partial annotation edit.
    pub fn apply_annotations(&mut self, update: &AnnotationUpdate) -> Result<(), ValidationError> {
        check_annotation("notes", update.notes.as_deref())?;
        check_annotation("mood_tag", update.mood_tag.as_deref())?;
        check_annotation("daily_intention", update.daily_intention.as_deref())?;
        check_annotation("reflection", update.reflection.as_deref())?;
        if let Some(tools) = &update.tools_used {
            check_tools(tools)?;
        }

        if update.notes.is_some() {
            self.notes = update.notes.clone();
        }
        if update.mood_tag.is_some() {
            self.mood_tag = update.mood_tag.clone();
        }
        if update.daily_intention.is_some() {
            self.daily_intention = update.daily_intention.clone();
        }
        if update.reflection.is_some() {
            self.reflection = update.reflection.clone();
        }
        if let Some(tools) = &update.tools_used {
            self.tools_used = tools.clone();
        }
        Ok(())
    }
}

impl NewSession {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_rating("fear_before", self.fear_before)?;
        check_rating("mood_before", self.mood_before)?;
        check_annotation("notes", self.notes.as_deref())?;
        check_annotation("mood_tag", self.mood_tag.as_deref())?;
        check_annotation("daily_intention", self.daily_intention.as_deref())?;
        check_tools(&self.tools_used)
    }
}

fn check_rating(field: &'static str, value: u8) -> Result<(), ValidationError> {
    if !(RATING_MIN..=RATING_MAX).contains(&value) {
        return Err(ValidationError::RatingOutOfRange {
            field,
            value: i64::from(value),
        });
    }
    Ok(())
}

fn check_metric(field: &'static str, value: Option<f64>) -> Result<(), ValidationError> {
    if let Some(v) = value {
        if !v.is_finite() || v < 0.0 {
            return Err(ValidationError::InvalidMetric { field, value: v });
        }
    }
    Ok(())
}

fn check_annotation(field: &'static str, value: Option<&str>) -> Result<(), ValidationError> {
    if let Some(text) = value {
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyAnnotation { field });
        }
    }
    Ok(())
}

fn check_tools(tools: &[String]) -> Result<(), ValidationError> {
    for tool in tools {
        if tool.trim().is_empty() {
            return Err(ValidationError::EmptyAnnotation { field: "tools_used" });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc_datetime(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn new_session() -> NewSession {
        NewSession {
            user_id: 1,
            start_time: utc_datetime(2025, 1, 10, 14, 0),
            fear_before: 7,
            mood_before: 4,
            notes: None,
            mood_tag: None,
            daily_intention: Some("walk to the mailbox".into()),
            tools_used: vec!["breathing".into()],
        }
    }

    fn completion(end: DateTime<Utc>) -> CompletionParams {
        CompletionParams {
            end_time: end,
            duration_minutes: None,
            distance_miles: Some(0.4),
            fear_after: 3,
            mood_after: 6,
            notes: None,
            reflection: None,
            tools_used: None,
        }
    }

    #[test]
    fn start_builds_in_progress_session() {
        let session = Session::start(new_session()).unwrap();
        assert!(session.is_active);
        assert!(!session.is_complete());
        assert!(session.end_time.is_none());
        assert_eq!(session.fear_before, 7);
        assert!(!session.id.is_empty());
    }

    #[test]
    fn start_assigns_distinct_ids() {
        let a = Session::start(new_session()).unwrap();
        let b = Session::start(new_session()).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn rating_out_of_range_is_rejected() {
        let mut new = new_session();
        new.fear_before = 0;
        assert!(matches!(
            new.validate(),
            Err(ValidationError::RatingOutOfRange { field: "fear_before", .. })
        ));

        new.fear_before = 11;
        assert!(new.validate().is_err());

        new.fear_before = 10;
        assert!(new.validate().is_ok());
    }

    #[test]
    fn whitespace_annotation_is_rejected() {
        let mut new = new_session();
        new.notes = Some("   ".into());
        assert!(matches!(
            new.validate(),
            Err(ValidationError::EmptyAnnotation { field: "notes" })
        ));
    }

    #[test]
    fn completion_derives_duration_from_range() {
        let mut session = Session::start(new_session()).unwrap();
        session
            .apply_completion(&completion(utc_datetime(2025, 1, 10, 14, 25)))
            .unwrap();
        assert!(session.is_complete());
        assert!(!session.is_active);
        assert_eq!(session.duration_minutes, Some(25));
        assert_eq!(session.effective_duration_minutes(), 25);
        assert_eq!(session.fear_after, Some(3));
    }

    #[test]
    fn completion_honors_explicit_duration() {
        let mut session = Session::start(new_session()).unwrap();
        let mut params = completion(utc_datetime(2025, 1, 10, 15, 0));
        params.duration_minutes = Some(45);
        session.apply_completion(&params).unwrap();
        assert_eq!(session.duration_minutes, Some(45));
    }

    #[test]
    fn completion_before_start_is_rejected() {
        let mut session = Session::start(new_session()).unwrap();
        let err = session
            .apply_completion(&completion(utc_datetime(2025, 1, 10, 13, 0)))
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidTimeRange { .. }));
        assert!(!session.is_complete());
    }

    #[test]
    fn negative_distance_is_rejected() {
        let mut session = Session::start(new_session()).unwrap();
        let mut params = completion(utc_datetime(2025, 1, 10, 14, 30));
        params.distance_miles = Some(-1.0);
        assert!(matches!(
            session.apply_completion(&params),
            Err(ValidationError::InvalidMetric { field: "distance_miles", .. })
        ));
    }

    #[test]
    fn apply_completion_is_idempotent() {
        let mut session = Session::start(new_session()).unwrap();
        let params = completion(utc_datetime(2025, 1, 10, 14, 40));
        session.apply_completion(&params).unwrap();
        let first = session.clone();
        session.apply_completion(&params).unwrap();
        assert_eq!(session, first);
    }

    #[test]
    fn annotation_update_leaves_unset_fields() {
        let mut session = Session::start(new_session()).unwrap();
        let update = AnnotationUpdate {
            notes: Some("saw a neighbor".into()),
            ..Default::default()
        };
        session.apply_annotations(&update).unwrap();
        assert_eq!(session.notes.as_deref(), Some("saw a neighbor"));
        assert_eq!(session.daily_intention.as_deref(), Some("walk to the mailbox"));
        assert_eq!(session.tools_used, vec!["breathing".to_string()]);
    }

    #[test]
    fn attribution_uses_local_start_date() {
        let mut new = new_session();
        // 04:50 UTC is 23:50 the previous evening at UTC-5.
        new.start_time = utc_datetime(2025, 1, 15, 4, 50);
        let session = Session::start(new).unwrap();
        let clock = UserClock::from_offset_minutes(-300);
        assert_eq!(
            session.local_start_date(&clock),
            chrono::NaiveDate::from_ymd_opt(2025, 1, 14).unwrap()
        );
    }
}
