//! Date keys used to bridge a calendar date to stored ephemerides.
//!
//! A *display key* (`MM-DD`) groups events by calendar day regardless of year,
//! a *full key* (`YYYY-MM-DD`) identifies the exact date of a stored record.
//! The functions here never look at timezones: callers pass a date that has
//! already been normalized.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static FULL_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid full key regex"));
static DISPLAY_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}-\d{2}$").expect("valid display key regex"));

const SPANISH_MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Leap year used to check that a display key names a real calendar day.
const LEAP_REFERENCE_YEAR: i32 = 2024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidDateFormat {
    #[error("invalid date format \"{0}\", use YYYY-MM-DD")]
    FullKey(String),
    #[error("invalid display date \"{0}\", use MM-DD")]
    DisplayKey(String),
}

/// Returns the zero-padded `MM-DD` key, e.g. `"08-16"`.
pub fn display_key(date: NaiveDate) -> String {
    format!("{:02}-{:02}", date.month(), date.day())
}

/// Returns the `YYYY-MM-DD` key.
pub fn full_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Returns the Spanish phrase used in prompts, e.g. `"16 de agosto"`.
pub fn human_phrase(date: NaiveDate) -> String {
    format!("{} de {}", date.day(), month_name(date.month()))
}

fn month_name(month: u32) -> &'static str {
    SPANISH_MONTHS[(month as usize).saturating_sub(1) % SPANISH_MONTHS.len()]
}

/// Parses a `YYYY-MM-DD` string into a real calendar date.
pub fn parse_full_key(input: &str) -> Result<NaiveDate, InvalidDateFormat> {
    if !FULL_KEY_RE.is_match(input) {
        return Err(InvalidDateFormat::FullKey(input.to_string()));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| InvalidDateFormat::FullKey(input.to_string()))
}

/// Validates a `MM-DD` string. February 29 is accepted.
pub fn parse_display_key(input: &str) -> Result<String, InvalidDateFormat> {
    let invalid = || InvalidDateFormat::DisplayKey(input.to_string());
    if !DISPLAY_KEY_RE.is_match(input) {
        return Err(invalid());
    }
    let (month, day) = input.split_once('-').ok_or_else(invalid)?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    let day: u32 = day.parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(LEAP_REFERENCE_YEAR, month, day)
        .map(display_key)
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_display_key_is_zero_padded() {
        assert_eq!(display_key(date(2024, 1, 5)), "01-05");
        assert_eq!(display_key(date(1995, 8, 16)), "08-16");
        assert_eq!(display_key(date(2024, 12, 31)), "12-31");
    }

    #[test]
    fn test_display_key_shape_for_every_day_of_a_leap_year() {
        let mut day = date(2024, 1, 1);
        while day.year() == 2024 {
            let key = display_key(day);
            assert!(DISPLAY_KEY_RE.is_match(&key), "bad key {key}");
            assert_eq!(key.len(), 5);
            assert_eq!(key, display_key(day));
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_full_key() {
        assert_eq!(full_key(date(2024, 3, 3)), "2024-03-03");
        assert_eq!(full_key(date(999, 1, 1)), "0999-01-01");
    }

    #[test]
    fn test_human_phrase_uses_spanish_months() {
        assert_eq!(human_phrase(date(2024, 1, 15)), "15 de enero");
        assert_eq!(human_phrase(date(2024, 8, 6)), "6 de agosto");
        assert_eq!(human_phrase(date(2024, 12, 9)), "9 de diciembre");
    }

    #[test]
    fn test_parse_full_key() {
        assert_eq!(parse_full_key("2024-02-29"), Ok(date(2024, 2, 29)));
        assert!(parse_full_key("2023-02-29").is_err());
        assert!(parse_full_key("2024-13-01").is_err());
        assert!(parse_full_key("2024-1-5").is_err());
        assert!(parse_full_key("15/01/2024").is_err());
        assert!(parse_full_key(" 2024-01-15").is_err());
        assert!(parse_full_key("").is_err());
    }

    #[test]
    fn test_parse_display_key() {
        assert_eq!(parse_display_key("02-29").as_deref(), Ok("02-29"));
        assert_eq!(parse_display_key("08-16").as_deref(), Ok("08-16"));
        assert!(parse_display_key("02-30").is_err());
        assert!(parse_display_key("00-10").is_err());
        assert!(parse_display_key("8-16").is_err());
        assert!(parse_display_key("2024-08-16").is_err());
    }
}
