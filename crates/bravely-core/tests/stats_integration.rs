//! Read-side stats end to end: local windows, zeroed fallbacks.

use bravely_core::{
    CompletionParams, Database, ExposureEngine, GoalState, NewSession, TodayStats, UserProgress,
};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn utc_datetime(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn engine_with_user(offset_minutes: i32) -> (ExposureEngine<Database>, i64) {
    let db = Database::open_memory().unwrap();
    let user_id = db
        .register_user(&UserProgress::new(offset_minutes, GoalState::default()))
        .unwrap();
    (ExposureEngine::new(db), user_id)
}

fn complete_session(
    engine: &ExposureEngine<Database>,
    user_id: i64,
    start: DateTime<Utc>,
    minutes: i64,
    distance: Option<f64>,
) {
    let created = engine
        .store()
        .create_session(NewSession {
            user_id,
            start_time: start,
            fear_before: 5,
            mood_before: 5,
            notes: None,
            mood_tag: None,
            daily_intention: None,
            tools_used: Vec::new(),
        })
        .unwrap();
    engine
        .store()
        .complete_session(
            &created.id,
            &CompletionParams {
                end_time: start + Duration::minutes(minutes),
                duration_minutes: None,
                distance_miles: distance,
                fear_after: 3,
                mood_after: 7,
                notes: None,
                reflection: None,
                tools_used: None,
            },
        )
        .unwrap();
}

#[test]
fn today_totals_sum_the_local_day() {
    let (engine, user) = engine_with_user(0);
    complete_session(&engine, user, utc_datetime(2025, 6, 10, 8, 0), 20, Some(0.5));
    complete_session(&engine, user, utc_datetime(2025, 6, 10, 18, 0), 15, Some(0.4));
    complete_session(&engine, user, utc_datetime(2025, 6, 9, 9, 0), 60, Some(3.0));

    let totals = engine
        .today_stats(user, utc_datetime(2025, 6, 10, 20, 0))
        .unwrap();
    assert!((totals.distance_miles - 0.9).abs() < 1e-9);
    assert_eq!(totals.duration_minutes, 35);
}

#[test]
fn in_progress_sessions_do_not_appear_in_stats() {
    let (engine, user) = engine_with_user(0);
    engine
        .store()
        .create_session(NewSession {
            user_id: user,
            start_time: utc_datetime(2025, 6, 10, 8, 0),
            fear_before: 5,
            mood_before: 5,
            notes: None,
            mood_tag: None,
            daily_intention: None,
            tools_used: Vec::new(),
        })
        .unwrap();

    let totals = engine
        .today_stats(user, utc_datetime(2025, 6, 10, 9, 0))
        .unwrap();
    assert_eq!(totals, TodayStats::default());
}

#[test]
fn offset_user_sees_late_evening_sessions_on_the_right_day() {
    // UTC-5: 04:50 UTC on Jun 10 is 23:50 local on Jun 9.
    let (engine, user) = engine_with_user(-300);
    complete_session(&engine, user, utc_datetime(2025, 6, 10, 4, 50), 20, Some(0.2));

    // Asked late on local Jun 9, the session counts.
    let totals = engine
        .today_stats(user, utc_datetime(2025, 6, 10, 4, 55))
        .unwrap();
    assert_eq!(totals.duration_minutes, 20);

    // Asked after local midnight, it no longer does.
    let totals = engine
        .today_stats(user, utc_datetime(2025, 6, 10, 5, 30))
        .unwrap();
    assert_eq!(totals.duration_minutes, 0);
}

#[test]
fn weekly_series_is_always_monday_to_sunday() {
    let (engine, user) = engine_with_user(0);
    // 2025-06-12 is a Thursday; Monday is Jun 9.
    complete_session(&engine, user, utc_datetime(2025, 6, 9, 7, 0), 15, None);
    complete_session(&engine, user, utc_datetime(2025, 6, 11, 7, 0), 25, None);
    complete_session(&engine, user, utc_datetime(2025, 6, 6, 7, 0), 99, None); // previous week

    let week = engine
        .weekly_stats(user, utc_datetime(2025, 6, 12, 12, 0))
        .unwrap();
    let days: Vec<&str> = week.iter().map(|d| d.day.as_str()).collect();
    assert_eq!(days, vec!["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]);
    assert_eq!(week[0].duration_minutes, 15);
    assert_eq!(week[2].duration_minutes, 25);
    assert_eq!(week[4].duration_minutes, 0);
}

#[test]
fn brand_new_user_gets_zeroed_stats_without_errors() {
    let (engine, user) = engine_with_user(0);
    let now = utc_datetime(2025, 6, 10, 12, 0);

    assert_eq!(engine.today_stats(user, now).unwrap(), TodayStats::default());

    let week = engine.weekly_stats(user, now).unwrap();
    assert_eq!(week.len(), 7);
    assert!(week.iter().all(|d| d.duration_minutes == 0));

    let monthly = engine.monthly_stats(user, now).unwrap();
    assert_eq!(monthly.completed_sessions, 0);
    assert_eq!(monthly.goal, 10);
}

#[test]
fn stats_reads_do_not_change_stored_progress() {
    let (engine, user) = engine_with_user(0);
    complete_session(&engine, user, utc_datetime(2025, 6, 10, 8, 0), 20, Some(0.5));
    let before = engine.user_progress(user).unwrap();

    let now = utc_datetime(2025, 6, 10, 20, 0);
    engine.today_stats(user, now).unwrap();
    engine.weekly_stats(user, now).unwrap();
    engine.monthly_stats(user, now).unwrap();

    assert_eq!(engine.user_progress(user).unwrap(), before);
}

#[test]
fn duration_overrides_beat_elapsed_time_in_totals() {
    let (engine, user) = engine_with_user(0);
    let start = utc_datetime(2025, 6, 10, 8, 0);
    let created = engine
        .store()
        .create_session(NewSession {
            user_id: user,
            start_time: start,
            fear_before: 5,
            mood_before: 5,
            notes: None,
            mood_tag: None,
            daily_intention: None,
            tools_used: Vec::new(),
        })
        .unwrap();
    engine
        .store()
        .complete_session(
            &created.id,
            &CompletionParams {
                end_time: start + Duration::minutes(60),
                duration_minutes: Some(40), // user says 40 of the 60 counted
                distance_miles: None,
                fear_after: 4,
                mood_after: 6,
                notes: None,
                reflection: None,
                tools_used: None,
            },
        )
        .unwrap();

    let totals = engine
        .today_stats(user, utc_datetime(2025, 6, 10, 12, 0))
        .unwrap();
    assert_eq!(totals.duration_minutes, 40);
}
