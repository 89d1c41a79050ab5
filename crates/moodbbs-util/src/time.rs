//! Clock and calendar utilities for moodbbs
//!
//! Every time-sensitive function in the core takes `now` as an explicit
//! parameter. Only the host binary reads the wall clock, through [`now`].
//!
//! # Mock Time for Development
//!
//! In debug builds, the `MOODBBS_MOCK_TIME` environment variable can be set
//! to override the system time. This is useful for exercising renewals,
//! snooze returns and day-of-month constraints without waiting for the
//! calendar.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-11-07 09:00:00`)
//!
//! Example:
//! ```bash
//! MOODBBS_MOCK_TIME="2025-11-07 09:00:00" moodbbs tick
//! ```

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone, Weekday};
use std::sync::OnceLock;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "MOODBBS_MOCK_TIME";

/// Format accepted by [`MOCK_TIME_ENV_VAR`]
pub const MOCK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Offset between mock time and real time, computed once at first use so
/// that mock time keeps advancing with the real clock.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // This is the internal implementation that wraps Local::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            let mock_time_str = std::env::var(MOCK_TIME_ENV_VAR).ok()?;
            let Ok(naive_dt) = NaiveDateTime::parse_from_str(&mock_time_str, MOCK_TIME_FORMAT) else {
                tracing::warn!(
                    mock_time = %mock_time_str,
                    expected_format = MOCK_TIME_FORMAT,
                    "Invalid mock time format"
                );
                return None;
            };
            let Some(mock_dt) = Local.from_local_datetime(&naive_dt).single() else {
                tracing::warn!(
                    mock_time = %mock_time_str,
                    "Failed to convert mock time to local timezone"
                );
                return None;
            };
            let offset = mock_dt.signed_duration_since(chrono::Local::now());
            tracing::info!(
                mock_time = %mock_time_str,
                offset_secs = offset.num_seconds(),
                "Mock time enabled"
            );
            Some(offset)
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Get the current local time, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)] // This is the wrapper that provides mock time support
pub fn now() -> DateTime<Local> {
    let real_now = chrono::Local::now();

    match get_mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// Format a DateTime with full date and time.
pub fn format_datetime_full(dt: &DateTime<Local>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Format only the calendar date.
pub fn format_date(dt: &DateTime<Local>) -> String {
    dt.format("%Y-%m-%d").to_string()
}

/// Full English weekday name ("Monday", ...)
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Parse a weekday from a full name or abbreviation.
///
/// Matching is case-insensitive and only looks at the first three letters,
/// so "fri", "Friday" and "FRIDAYS" all parse to Friday. Inputs shorter than
/// three letters are rejected.
pub fn parse_weekday(s: &str) -> Option<Weekday> {
    let lower = s.trim().to_ascii_lowercase();
    let prefix = lower.get(..3)?;

    match prefix {
        "mon" => Some(Weekday::Mon),
        "tue" => Some(Weekday::Tue),
        "wed" => Some(Weekday::Wed),
        "thu" => Some(Weekday::Thu),
        "fri" => Some(Weekday::Fri),
        "sat" => Some(Weekday::Sat),
        "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Longest span, in days, accepted for cooldowns, snoozes and history windows
pub const MAX_SPAN_DAYS: u32 = 36_500;

/// Longest span, in hours, accepted for timed mood events
pub const MAX_SPAN_HOURS: u32 = MAX_SPAN_DAYS * 24;

/// `t + days`, or `None` if the result leaves the representable range
pub fn checked_add_days(t: DateTime<Local>, days: u32) -> Option<DateTime<Local>> {
    t.checked_add_signed(chrono::Duration::days(i64::from(days)))
}

/// `t - days`, or `None` if the result leaves the representable range
pub fn checked_sub_days(t: DateTime<Local>, days: u32) -> Option<DateTime<Local>> {
    t.checked_sub_signed(chrono::Duration::days(i64::from(days)))
}

/// `t + hours`, or `None` if the result leaves the representable range
pub fn checked_add_hours(t: DateTime<Local>, hours: u32) -> Option<DateTime<Local>> {
    t.checked_add_signed(chrono::Duration::hours(i64::from(hours)))
}

/// Number of days in the given month (1-12).
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_datetime_full() {
        let dt = Local.with_ymd_and_hms(2025, 12, 25, 14, 30, 45).unwrap();
        assert_eq!(format_datetime_full(&dt), "2025-12-25 14:30:45");
        assert_eq!(format_date(&dt), "2025-12-25");
    }

    #[test]
    fn test_checked_spans() {
        let dt = Local.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(checked_add_days(dt, 2).map(|t| format_date(&t)).as_deref(), Some("2025-03-12"));
        assert_eq!(checked_sub_days(dt, 10).map(|t| format_date(&t)).as_deref(), Some("2025-02-28"));
        assert!(checked_add_days(dt, MAX_SPAN_DAYS).is_some());
        assert!(checked_add_hours(dt, MAX_SPAN_HOURS).is_some());

        assert!(checked_add_days(dt, u32::MAX).is_none());
        assert!(checked_sub_days(dt, u32::MAX).is_none());
        assert!(checked_add_hours(dt, u32::MAX).is_none());
    }

    #[test]
    fn test_parse_weekday() {
        assert_eq!(parse_weekday("Friday"), Some(Weekday::Fri));
        assert_eq!(parse_weekday("fri"), Some(Weekday::Fri));
        assert_eq!(parse_weekday(" MON "), Some(Weekday::Mon));
        assert_eq!(parse_weekday("thursdays"), Some(Weekday::Thu));

        assert_eq!(parse_weekday("fr"), None);
        assert_eq!(parse_weekday(""), None);
        assert_eq!(parse_weekday("funday"), None);
    }

    #[test]
    fn test_weekday_name_round_trips() {
        for day in [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ] {
            assert_eq!(parse_weekday(weekday_name(day)), Some(day));
        }
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2025, 1), 31);
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2025, 4), 30);
        assert_eq!(days_in_month(2025, 12), 31);
    }

    #[test]
    fn test_now_returns_time() {
        let t = now();
        assert!(t.year() >= 2020);
        assert!(t.year() <= 2100);
    }

    #[test]
    fn test_parse_mock_time_format() {
        for valid in ["2025-12-25 14:30:00", "2025-01-01 00:00:00"] {
            assert!(NaiveDateTime::parse_from_str(valid, MOCK_TIME_FORMAT).is_ok());
        }
        for invalid in ["2025-12-25", "2025-12-25T14:30:00", "not a date", ""] {
            assert!(NaiveDateTime::parse_from_str(invalid, MOCK_TIME_FORMAT).is_err());
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    fn test_is_mock_time_active_does_not_panic() {
        let _ = is_mock_time_active();
    }
}
