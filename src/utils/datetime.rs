//! Publish-time parsing utilities
//!
//! The schedule form accepts free-text publish times. Parsing is
//! format-flexible: RFC3339 and a ladder of common naive formats are
//! accepted. A naive timestamp (no timezone) is stamped as UTC and only
//! converted to the configured timezone for display. The assume-UTC rule
//! decides the actual instant a job fires at, so it is stated here rather
//! than left to the parser's defaults.

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// Errors that can occur while parsing a publish time
#[derive(Error, Debug)]
pub enum DateTimeError {
    /// Input did not match any accepted format
    #[error("Invalid publish time: '{input}' - expected formats like '2026-01-01 12:00' or RFC3339")]
    InvalidFormat { input: String },
}

/// Parse a user-supplied publish time into a UTC instant.
///
/// Supports:
/// - RFC3339 with timezone or offset: "2026-01-01T12:00:00Z"
/// - Naive date-times, assumed UTC: "2026-01-01 12:00", "2026-01-01 12:00:00"
/// - ISO variants without timezone: "2026-01-01T12:00"
pub fn parse_publish_time(input: &str) -> Result<DateTime<Utc>, DateTimeError> {
    let trimmed = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%z") {
        return Ok(dt.with_timezone(&Utc));
    }

    // Naive formats, assumed UTC. The hint format of the schedule form
    // ("YYYY-MM-DD HH:MM") comes first.
    let naive_formats = [
        "%Y-%m-%d %H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%d/%m/%Y %H:%M",
        "%Y%m%dT%H%M%S",
    ];

    for format in &naive_formats {
        if let Ok(naive_dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(DateTime::from_naive_utc_and_offset(naive_dt, Utc));
        }
    }

    Err(DateTimeError::InvalidFormat {
        input: input.to_string(),
    })
}

/// Render a UTC instant in the configured timezone, for status messages.
pub fn format_local(dt: &DateTime<Utc>, tz: Tz) -> String {
    dt.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S %Z").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    #[test]
    fn test_parse_rfc3339() {
        let dt = parse_publish_time("2026-01-01T12:00:00Z").unwrap();
        assert_eq!(dt.year(), 2026);
        assert_eq!(dt.hour(), 12);
    }

    #[test]
    fn test_parse_with_offset_converts_to_utc() {
        let dt = parse_publish_time("2026-01-01T12:00:00+02:00").unwrap();
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn test_parse_naive_assumes_utc() {
        let dt = parse_publish_time("2026-01-01 12:30").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2026, 1, 1, 12, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_naive_with_seconds() {
        let dt = parse_publish_time(" 2026-01-01 12:30:45 ").unwrap();
        assert_eq!(dt.second(), 45);
    }

    #[test]
    fn test_invalid_format() {
        let result = parse_publish_time("next tuesday-ish");
        assert!(result.is_err());
        match result {
            Err(DateTimeError::InvalidFormat { input }) => {
                assert_eq!(input, "next tuesday-ish");
            }
            _ => panic!("Expected InvalidFormat error"),
        }
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(parse_publish_time("").is_err());
        assert!(parse_publish_time("   ").is_err());
    }

    #[test]
    fn test_format_local_converts() {
        let dt = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let local = format_local(&dt, chrono_tz::Asia::Tehran);
        // Tehran is UTC+3:30
        assert!(local.starts_with("2026-01-01 15:30:00"), "{}", local);
    }
}
