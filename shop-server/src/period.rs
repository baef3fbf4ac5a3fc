//! Metrics windows and business-offset calendar math
//!
//! Dates arrive as `YYYY-MM-DD` (or an RFC 3339 timestamp) and leave as
//! `i64` Unix millis; the db layer only ever sees millis. Every window is
//! half-open: `created_at >= start AND created_at < end`.

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, NaiveTime, Utc};
use shared::error::AppError;

/// Longest allowed metrics window, in whole days between `start` and `end`
pub const MAX_PERIOD_DAYS: u64 = 7;

/// Milliseconds in a calendar day (fixed offsets have no DST)
pub const DAY_MS: i64 = 86_400_000;

/// Days from 0001-01-01 (CE day 1) to 1970-01-01
const UNIX_EPOCH_CE_DAYS: i64 = 719_163;

/// Inclusive range of local calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    /// Whole-day distance between `start` and `end`
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// `(start_ms, end_ms)` for the window in the given offset, `end` exclusive
    pub fn bounds(&self, offset: FixedOffset) -> (i64, i64) {
        (
            day_start_millis(self.start, offset),
            day_end_millis(self.end, offset),
        )
    }
}

/// Widest real-world UTC offset, in minutes
pub const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Build a fixed offset from minutes east of UTC, bounded to ±14 hours
pub fn parse_utc_offset(minutes: i32) -> Result<FixedOffset, AppError> {
    if !(-MAX_UTC_OFFSET_MINUTES..=MAX_UTC_OFFSET_MINUTES).contains(&minutes) {
        return Err(AppError::invalid_field(
            "utcOffset",
            "UTC offset must be within ±840 minutes",
        ));
    }
    FixedOffset::east_opt(minutes * 60)
        .ok_or_else(|| AppError::invalid_field("utcOffset", "Invalid UTC offset"))
}

/// Calendar date of `now` in the business offset
pub fn local_today(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

/// Parse a `from`/`to` query value into a local calendar date
pub fn parse_date_input(
    field: &str,
    raw: &str,
    offset: FixedOffset,
) -> Result<NaiveDate, AppError> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&offset).date_naive())
        .map_err(|_| AppError::invalid_field(field, format!("Invalid date: {raw}")))
}

/// Resolve optional `from`/`to` inputs into a window of at most 7 days
///
/// - neither: `[today - 7, today]`
/// - only `from`: `[from, from + 7]`
/// - only `to`: `[today - 7, to]`
/// - both: `[from, to]`
///
/// Runs before any query; an oversized or inverted window is `INVALID_PERIOD`.
pub fn resolve_period(
    from: Option<&str>,
    to: Option<&str>,
    today: NaiveDate,
    offset: FixedOffset,
) -> Result<Period, AppError> {
    let from = from
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_date_input("from", s, offset))
        .transpose()?;
    let to = to
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_date_input("to", s, offset))
        .transpose()?;

    let week = Days::new(MAX_PERIOD_DAYS);
    let week_ago = || today.checked_sub_days(week).ok_or_else(AppError::invalid_period);

    let period = match (from, to) {
        (None, None) => Period {
            start: week_ago()?,
            end: today,
        },
        (Some(start), None) => Period {
            start,
            end: start
                .checked_add_days(week)
                .ok_or_else(AppError::invalid_period)?,
        },
        (None, Some(end)) => Period {
            start: week_ago()?,
            end,
        },
        (Some(start), Some(end)) => Period { start, end },
    };

    if period.end < period.start || period.days() > MAX_PERIOD_DAYS as i64 {
        return Err(AppError::invalid_period());
    }
    Ok(period)
}

/// Local midnight of `date` as Unix millis
pub fn day_start_millis(date: NaiveDate, offset: FixedOffset) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
        - i64::from(offset.local_minus_utc()) * 1000
}

/// Local midnight of the day after `date`; callers use `< end`
pub fn day_end_millis(date: NaiveDate, offset: FixedOffset) -> i64 {
    day_start_millis(date, offset) + DAY_MS
}

/// Canonical calendar-day key: local days since 1970-01-01
///
/// Mirrors `(created_at + offset_ms) / 86400000` on the SQL side for
/// non-negative timestamps.
pub fn epoch_day(ms: i64, offset: FixedOffset) -> i64 {
    (ms + i64::from(offset.local_minus_utc()) * 1000).div_euclid(DAY_MS)
}

/// Inverse of [`epoch_day`]
pub fn date_from_epoch_day(day: i64) -> Option<NaiveDate> {
    i32::try_from(day + UNIX_EPOCH_CE_DAYS)
        .ok()
        .and_then(NaiveDate::from_num_days_from_ce_opt)
}

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First day of the month before the one containing `date`
pub fn previous_month_start(date: NaiveDate) -> NaiveDate {
    let first = month_start(date);
    first.pred_opt().map(month_start).unwrap_or(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_ten_day_span_rejected() {
        let err = resolve_period(Some("2024-01-01"), Some("2024-01-10"), d(2024, 2, 1), utc())
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPeriod);
    }

    #[test]
    fn test_five_day_span_accepted() {
        let p = resolve_period(Some("2024-01-01"), Some("2024-01-05"), d(2024, 2, 1), utc())
            .unwrap();
        assert_eq!(p.start, d(2024, 1, 1));
        assert_eq!(p.end, d(2024, 1, 5));
        assert_eq!(p.days(), 4);
    }

    #[test]
    fn test_exactly_seven_days_accepted() {
        let p = resolve_period(Some("2024-01-01"), Some("2024-01-08"), d(2024, 2, 1), utc())
            .unwrap();
        assert_eq!(p.days(), 7);
    }

    #[test]
    fn test_defaults_to_last_week() {
        let p = resolve_period(None, None, d(2024, 3, 10), utc()).unwrap();
        assert_eq!(p, Period { start: d(2024, 3, 3), end: d(2024, 3, 10) });
    }

    #[test]
    fn test_only_from_extends_a_week() {
        let p = resolve_period(Some("2023-12-28"), None, d(2024, 3, 10), utc()).unwrap();
        assert_eq!(p, Period { start: d(2023, 12, 28), end: d(2024, 1, 4) });
    }

    #[test]
    fn test_only_to_starts_a_week_before_today() {
        let p = resolve_period(None, Some("2024-03-09"), d(2024, 3, 10), utc()).unwrap();
        assert_eq!(p, Period { start: d(2024, 3, 3), end: d(2024, 3, 9) });

        let err = resolve_period(None, Some("2024-04-01"), d(2024, 3, 10), utc()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPeriod);
    }

    #[test]
    fn test_inverted_window_rejected() {
        let err = resolve_period(Some("2024-01-05"), Some("2024-01-01"), d(2024, 2, 1), utc())
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPeriod);
    }

    #[test]
    fn test_bad_date_is_validation_error() {
        let err = resolve_period(Some("yesterday"), None, d(2024, 2, 1), utc()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        let details = err.details.unwrap();
        assert!(details["fields"].get("from").is_some());
    }

    #[test]
    fn test_empty_inputs_count_as_absent() {
        let p = resolve_period(Some(""), Some("  "), d(2024, 3, 10), utc()).unwrap();
        assert_eq!(p.end, d(2024, 3, 10));
    }

    #[test]
    fn test_rfc3339_input_uses_local_date() {
        let minus_three = parse_utc_offset(-180).unwrap();
        let date = parse_date_input("from", "2024-01-01T02:00:00Z", minus_three).unwrap();
        assert_eq!(date, d(2023, 12, 31));
    }

    #[test]
    fn test_bounds_follow_offset() {
        let minus_three = parse_utc_offset(-180).unwrap();
        let p = Period { start: d(2024, 1, 1), end: d(2024, 1, 1) };
        let (start, end) = p.bounds(minus_three);
        // 2024-01-01T03:00:00Z
        assert_eq!(start, 1_704_078_000_000);
        assert_eq!(end - start, DAY_MS);
    }

    #[test]
    fn test_epoch_day_round_trip() {
        let minus_three = parse_utc_offset(-180).unwrap();
        let start = day_start_millis(d(2024, 1, 1), minus_three);
        assert_eq!(date_from_epoch_day(epoch_day(start, minus_three)), Some(d(2024, 1, 1)));
        // One millisecond earlier is still Dec 31 locally
        assert_eq!(
            date_from_epoch_day(epoch_day(start - 1, minus_three)),
            Some(d(2023, 12, 31))
        );
        assert_eq!(date_from_epoch_day(0), Some(d(1970, 1, 1)));
        assert_eq!(epoch_day(-1, utc()), -1);
    }

    #[test]
    fn test_local_today() {
        let now = DateTime::parse_from_rfc3339("2024-01-01T01:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(local_today(now, utc()), d(2024, 1, 1));
        assert_eq!(local_today(now, parse_utc_offset(-180).unwrap()), d(2023, 12, 31));
    }

    #[test]
    fn test_month_starts() {
        assert_eq!(month_start(d(2024, 3, 31)), d(2024, 3, 1));
        assert_eq!(previous_month_start(d(2024, 3, 31)), d(2024, 2, 1));
        assert_eq!(previous_month_start(d(2024, 1, 15)), d(2023, 12, 1));
    }

    #[test]
    fn test_utc_offset_bounds() {
        assert!(parse_utc_offset(840).is_ok());
        assert!(parse_utc_offset(-840).is_ok());
        assert_eq!(parse_utc_offset(841).unwrap_err().code, ErrorCode::ValidationFailed);
        assert_eq!(parse_utc_offset(i32::MIN).unwrap_err().code, ErrorCode::ValidationFailed);
        assert_eq!(parse_utc_offset(i32::MAX).unwrap_err().code, ErrorCode::ValidationFailed);
    }
}
