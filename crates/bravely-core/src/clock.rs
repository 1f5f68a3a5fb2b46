//! Local-time resolution for per-user date attribution.
//!
//! Every timestamp in the crate is stored and compared in UTC. A
//! [`UserClock`] converts instants into the user's local calendar, which
//! decides which day a session belongs to, where week and month windows
//! begin, and whether two sessions landed on consecutive days.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Utc,
};

/// Day labels for weekly series, Monday first.
pub const DAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Fixed-offset view of a user's local calendar.
///
/// The offset is minutes east of UTC, so `-300` is five hours behind.
/// DST transitions are out of scope; users carry a plain offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserClock {
    offset: FixedOffset,
}

impl UserClock {
    /// Clock pinned to UTC.
    pub fn utc() -> Self {
        Self::from_offset_minutes(0)
    }

    /// Builds a clock from an offset in minutes east of UTC.
    ///
    /// Offsets outside the range representable by a fixed offset
    /// (beyond +/- 24 hours) fall back to UTC rather than failing.
    pub fn from_offset_minutes(minutes: i32) -> Self {
        let offset = FixedOffset::east_opt(minutes.saturating_mul(60))
            .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap());
        Self { offset }
    }

    /// The configured offset in minutes east of UTC.
    pub fn offset_minutes(&self) -> i32 {
        self.offset.local_minus_utc() / 60
    }

    /// Local calendar date of a UTC instant.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// UTC instant of a local wall-clock time.
    fn to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        let shifted = local - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        Utc.from_utc_datetime(&shifted)
    }

    /// Half-open UTC window `[start, end)` covering one local calendar day.
    pub fn day_window(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.to_utc(date.and_time(NaiveTime::MIN));
        let end = self.to_utc((date + Duration::days(1)).and_time(NaiveTime::MIN));
        (start, end)
    }

    /// Monday of the local week containing `instant`.
    pub fn week_start(&self, instant: DateTime<Utc>) -> NaiveDate {
        let date = self.local_date(instant);
        date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
    }

    /// Half-open UTC window covering the local Monday-to-Sunday week
    /// containing `instant`.
    pub fn week_window(&self, instant: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let monday = self.week_start(instant);
        let start = self.to_utc(monday.and_time(NaiveTime::MIN));
        let end = self.to_utc((monday + Duration::days(7)).and_time(NaiveTime::MIN));
        (start, end)
    }

    /// Half-open UTC window covering the local calendar month
    /// containing `instant`.
    pub fn month_window(&self, instant: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let date = self.local_date(instant);
        let first = date.with_day(1).unwrap_or(date);
        let next = first
            .checked_add_months(Months::new(1))
            .unwrap_or(first);
        let start = self.to_utc(first.and_time(NaiveTime::MIN));
        let end = self.to_utc(next.and_time(NaiveTime::MIN));
        (start, end)
    }

    /// Monday-based index of a date's weekday, 0 through 6.
    pub fn weekday_index(date: NaiveDate) -> usize {
        date.weekday().num_days_from_monday() as usize
    }

    /// Label for a date's weekday, matching [`DAY_LABELS`].
    pub fn day_label(date: NaiveDate) -> &'static str {
        DAY_LABELS[Self::weekday_index(date)]
    }
}

impl Default for UserClock {
    fn default() -> Self {
        Self::utc()
    }
}
