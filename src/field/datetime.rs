//! Date, month, time and timestamp handling.

use chrono::{Datelike, Local, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::common::config::{DATE_FORMAT, MONTH_FORMAT, TIME_FORMAT, TIMESTAMP_FORMAT};
use crate::common::messages;
use crate::common::MessageCode;

const SECONDS_PER_DAY: u32 = 86_400;
const TIME_STEP_SECONDS: u32 = 60;

// ============================================================================
// Parsing
// ============================================================================

pub fn parse_date(text: &str) -> Result<NaiveDate, MessageCode> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).map_err(|_| messages::INVALID_DATE)
}

/// Parse month text; the result is the first day of that month.
pub fn parse_month(text: &str) -> Result<NaiveDate, MessageCode> {
    let with_day = format!("01.{}", text.trim());
    let format = format!("%d.{}", MONTH_FORMAT);
    NaiveDate::parse_from_str(&with_day, &format).map_err(|_| messages::INVALID_MONTH)
}

pub fn parse_time(text: &str) -> Result<NaiveTime, MessageCode> {
    NaiveTime::parse_from_str(text.trim(), TIME_FORMAT).map_err(|_| messages::INVALID_TIME)
}

pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime, MessageCode> {
    NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT)
        .map_err(|_| messages::INVALID_TIMESTAMP)
}

// ============================================================================
// Formatting
// ============================================================================

pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_month(month: &NaiveDate) -> String {
    month.format(MONTH_FORMAT).to_string()
}

pub fn format_time(time: &NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// SQL literals in ISO form, independent of the display formats.
pub fn sql_date(date: &NaiveDate) -> String {
    format!("DATE '{}'", date.format("%Y-%m-%d"))
}

pub fn sql_time(time: &NaiveTime) -> String {
    format!("TIME '{}'", time.format("%H:%M:%S"))
}

pub fn sql_timestamp(ts: &NaiveDateTime) -> String {
    format!("TIMESTAMP '{}'", ts.format("%Y-%m-%d %H:%M:%S"))
}

/// Incremental check: only digits and the separators of `format`, no longer
/// than a rendered value.
pub fn check_partial(candidate: &str, max_len: usize) -> bool {
    candidate.chars().count() <= max_len
        && candidate
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | ':' | ' ' | '-' | '/'))
}

// ============================================================================
// Current values
// ============================================================================

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn this_month() -> NaiveDate {
    first_of_month(&today())
}

pub fn now_time() -> NaiveTime {
    whole_seconds(Local::now().time())
}

pub fn now_timestamp() -> NaiveDateTime {
    whole_seconds(Local::now().naive_local())
}

/// Drop the sub-second part; time texts carry whole seconds only.
pub fn whole_seconds<T: Timelike + Copy>(t: T) -> T {
    t.with_nanosecond(0).unwrap_or(t)
}

pub fn first_of_month(date: &NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(*date)
}

// ============================================================================
// Enumeration steps
// ============================================================================

pub fn step_date(date: &NaiveDate, backward: bool) -> Result<NaiveDate, MessageCode> {
    let next = if backward { date.pred_opt() } else { date.succ_opt() };
    next.ok_or(messages::NO_FURTHER_VALUE)
}

pub fn step_month(month: &NaiveDate, backward: bool) -> Result<NaiveDate, MessageCode> {
    let next = if backward {
        month.checked_sub_months(Months::new(1))
    } else {
        month.checked_add_months(Months::new(1))
    };
    next.ok_or(messages::NO_FURTHER_VALUE)
}

/// Step one minute; wraps around midnight.
pub fn step_time(time: &NaiveTime, backward: bool) -> NaiveTime {
    let secs = time.num_seconds_from_midnight();
    let next = if backward {
        (secs + SECONDS_PER_DAY - TIME_STEP_SECONDS) % SECONDS_PER_DAY
    } else {
        (secs + TIME_STEP_SECONDS) % SECONDS_PER_DAY
    };
    NaiveTime::from_num_seconds_from_midnight_opt(next, 0).unwrap_or(*time)
}

/// Step one day, keeping the time of day.
pub fn step_timestamp(ts: &NaiveDateTime, backward: bool) -> Result<NaiveDateTime, MessageCode> {
    Ok(step_date(&ts.date(), backward)?.and_time(ts.time()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_and_format_date() {
        let d = parse_date("31.01.2024").unwrap();
        assert_eq!(d, date(2024, 1, 31));
        assert_eq!(format_date(&d), "31.01.2024");
        assert_eq!(parse_date("31.02.2024"), Err(messages::INVALID_DATE));
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("03.2024").unwrap(), date(2024, 3, 1));
        assert_eq!(format_month(&date(2024, 3, 1)), "03.2024");
        assert_eq!(parse_month("13.2024"), Err(messages::INVALID_MONTH));
    }

    #[test]
    fn test_parse_time() {
        let t = parse_time("13:45:10").unwrap();
        assert_eq!(format_time(&t), "13:45:10");
        assert_eq!(parse_time("25:00:00"), Err(messages::INVALID_TIME));
    }

    #[test]
    fn test_sql_literals() {
        assert_eq!(sql_date(&date(2024, 1, 5)), "DATE '2024-01-05'");
        let ts = date(2024, 1, 5).and_hms_opt(7, 8, 9).unwrap();
        assert_eq!(sql_timestamp(&ts), "TIMESTAMP '2024-01-05 07:08:09'");
    }

    #[test]
    fn test_step_time_wraps_midnight() {
        let late = NaiveTime::from_hms_opt(23, 59, 30).unwrap();
        assert_eq!(step_time(&late, false), NaiveTime::from_hms_opt(0, 0, 30).unwrap());
        let early = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
        assert_eq!(step_time(&early, true), NaiveTime::from_hms_opt(23, 59, 0).unwrap());
    }

    #[test]
    fn test_step_month_crosses_year() {
        assert_eq!(step_month(&date(2023, 12, 1), false).unwrap(), date(2024, 1, 1));
        assert_eq!(step_month(&date(2024, 1, 1), true).unwrap(), date(2023, 12, 1));
    }

    #[test]
    fn test_check_partial() {
        assert!(check_partial("31.0", 10));
        assert!(!check_partial("31.0a", 10));
        assert!(!check_partial("31.01.20245", 10));
    }
}
