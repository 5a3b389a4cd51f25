//! Clock helpers pinned to Asia/Jakarta (UTC+07:00, no daylight saving).
//!
//! Timestamps are stored in UTC; everything user-facing goes through these
//! helpers so dates and day boundaries follow local office time.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc};

pub const JAKARTA_OFFSET_SECS: i32 = 7 * 3600;

pub fn jakarta() -> FixedOffset {
    FixedOffset::east_opt(JAKARTA_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Current time in Jakarta
pub fn now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&jakarta())
}

/// Current calendar date in Jakarta
pub fn today() -> NaiveDate {
    now().date_naive()
}

pub fn to_jakarta(dt: DateTime<Utc>) -> DateTime<FixedOffset> {
    dt.with_timezone(&jakarta())
}

fn local_to_jakarta(naive: NaiveDateTime) -> DateTime<FixedOffset> {
    let tz = jakarta();
    let utc = naive - Duration::seconds(i64::from(tz.local_minus_utc()));
    DateTime::from_naive_utc_and_offset(utc, tz)
}

/// 00:00:00 local time on the given date
pub fn start_of_day(date: NaiveDate) -> DateTime<FixedOffset> {
    local_to_jakarta(date.and_time(NaiveTime::MIN))
}

/// 23:59:59.999999 local time on the given date
pub fn end_of_day(date: NaiveDate) -> DateTime<FixedOffset> {
    start_of_day(date) + Duration::days(1) - Duration::microseconds(1)
}

pub fn days_ago(days: i64) -> DateTime<FixedOffset> {
    now() - Duration::days(days)
}

pub fn days_from_now(days: i64) -> DateTime<FixedOffset> {
    now() + Duration::days(days)
}

pub fn is_today(dt: DateTime<Utc>) -> bool {
    to_jakarta(dt).date_naive() == today()
}

/// First and last day of a month, `None` for an invalid year/month.
pub fn month_range(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next_first.pred_opt()?))
}

/// Whole days elapsed between two instants, never negative.
pub fn age_in_days(since: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - since).num_days().max(0)
}

/// Serde `serialize_with` helpers producing the API wire format
/// (`dd/mm/YYYY HH:MM:SS` in Jakarta time, dates as `dd/mm/YYYY`).
pub mod api_format {
    use chrono::{DateTime, NaiveDate, Utc};
    use serde::Serializer;

    pub const DATETIME: &str = "%d/%m/%Y %H:%M:%S";
    pub const DATE: &str = "%d/%m/%Y";

    pub fn datetime<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&super::to_jakarta(*dt).format(DATETIME))
    }

    pub fn option_datetime<S: Serializer>(dt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match dt {
            Some(dt) => datetime(dt, s),
            None => s.serialize_none(),
        }
    }

    pub fn option_date<S: Serializer>(d: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.collect_str(&d.format(DATE)),
            None => s.serialize_none(),
        }
    }
}
