use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::consts::DATE_FORMAT;
use crate::error::AppError;

/// Parse a user-supplied date (CLI flag or config)
pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    // Try YYYYMMDD
    if s.len() == 8
        && let Ok(d) = NaiveDate::parse_from_str(s, "%Y%m%d")
    {
        return Ok(d);
    }
    // Try YYYY-MM-DD
    parse_day_key(s).ok_or_else(|| AppError::InvalidDate {
        input: s.to_string(),
    })
}

/// Strict day key: must be exactly the zero-padded `YYYY-MM-DD` form.
///
/// Range queries compare keys as strings, so anything that does not
/// re-format to itself is rejected.
pub(crate) fn parse_day_key(s: &str) -> Option<NaiveDate> {
    if s.len() != 10 {
        return None;
    }
    let date = NaiveDate::parse_from_str(s, DATE_FORMAT).ok()?;
    (date.format(DATE_FORMAT).to_string() == s).then_some(date)
}

pub(crate) fn format_day(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// First day of the week containing `date`
pub(crate) fn week_start(date: NaiveDate, first_day: Weekday) -> NaiveDate {
    let offset = match first_day {
        Weekday::Sun => date.weekday().num_days_from_sunday(),
        _ => date.weekday().num_days_from_monday(),
    };
    date - Days::new(u64::from(offset))
}

/// First day of the calendar month containing `date`
pub(crate) fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// The day before `date`; `None` at the calendar's lower bound
pub(crate) fn previous_day(date: NaiveDate) -> Option<NaiveDate> {
    date.pred_opt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parse_date_accepts_both_forms() {
        assert_eq!(parse_date("20260201").unwrap(), d(2026, 2, 1));
        assert_eq!(parse_date("2026-02-01").unwrap(), d(2026, 2, 1));
    }

    #[test]
    fn parse_date_rejects_garbage() {
        let err = parse_date("yesterday").unwrap_err();
        assert!(err.to_string().contains("yesterday"));
        assert!(parse_date("2026-02-30").is_err());
    }

    #[test]
    fn day_key_must_be_zero_padded() {
        assert_eq!(parse_day_key("2026-02-01"), Some(d(2026, 2, 1)));
        assert_eq!(parse_day_key("2026-2-1"), None);
        assert_eq!(parse_day_key("2026-02-1"), None);
        assert_eq!(parse_day_key("20260201"), None);
        assert_eq!(parse_day_key("2026-13-01"), None);
        assert_eq!(parse_day_key("2026-02-01x"), None);
    }

    #[test]
    fn week_start_monday_and_sunday() {
        // 2026-02-04 is a Wednesday
        assert_eq!(week_start(d(2026, 2, 4), Weekday::Mon), d(2026, 2, 2));
        assert_eq!(week_start(d(2026, 2, 4), Weekday::Sun), d(2026, 2, 1));
        // Monday is its own week start
        assert_eq!(week_start(d(2026, 2, 2), Weekday::Mon), d(2026, 2, 2));
        // Week crossing a month boundary
        assert_eq!(week_start(d(2026, 3, 1), Weekday::Mon), d(2026, 2, 23));
    }

    #[test]
    fn month_start_is_first_day() {
        assert_eq!(month_start(d(2026, 2, 17)), d(2026, 2, 1));
        assert_eq!(month_start(d(2026, 2, 1)), d(2026, 2, 1));
    }

    #[test]
    fn previous_day_crosses_month() {
        assert_eq!(previous_day(d(2026, 3, 1)), Some(d(2026, 2, 28)));
    }
}
