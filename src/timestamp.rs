//! Parsing of upstream `lastUpdated` timestamps
//!
//! The Tasking Manager reports timestamps as `YYYY-MM-DDTHH:MM:SS.ffffff`
//! followed by a numeric UTC offset and sometimes a trailing `Z`.

use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

const WITH_OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z"];
const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parse an upstream timestamp into a timezone-aware instant
///
/// Returns `Ok(None)` for an empty string. Trailing `Z` characters are stripped
/// first; the numeric offset that follows the fractional seconds is then used.
/// When a `Z` was stripped and no numeric offset remains, the instant is read as UTC.
///
/// # Errors
/// Returns [`Error::Parse`] when the string is non-empty but malformed.
///
/// # Examples
///
/// ```
/// use tm_task_filter::timestamp::parse_timestamp;
///
/// let instant = parse_timestamp("2025-08-01T10:00:00.000000+00:00").unwrap().unwrap();
/// assert_eq!(instant.to_rfc3339(), "2025-08-01T10:00:00+00:00");
///
/// assert!(parse_timestamp("").unwrap().is_none());
/// assert!(parse_timestamp("yesterday").is_err());
/// ```
pub fn parse_timestamp(input: &str) -> Result<Option<DateTime<FixedOffset>>> {
    if input.is_empty() {
        return Ok(None);
    }

    let stripped = input.trim_end_matches('Z');
    let had_zulu = stripped.len() != input.len();

    let mut last_err = None;
    for format in WITH_OFFSET_FORMATS {
        match DateTime::parse_from_str(stripped, format) {
            Ok(instant) => return Ok(Some(instant)),
            Err(e) => last_err = Some(e),
        }
    }

    if had_zulu {
        if let Ok(naive) = NaiveDateTime::parse_from_str(stripped, NAIVE_FORMAT) {
            return Ok(Some(naive.and_utc().fixed_offset()));
        }
    }

    Err(Error::Parse {
        input: input.to_string(),
        reason: last_err
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unrecognized format".to_string()),
    })
}

/// Calendar date of an upstream timestamp, in the timestamp's own offset
///
/// Empty and malformed timestamps both yield `None`; the pipeline treats them
/// as not matching any date range.
pub fn timestamp_date(input: &str) -> Option<NaiveDate> {
    match parse_timestamp(input) {
        Ok(instant) => instant.map(|i| i.date_naive()),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring unparseable timestamp");
            None
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_upstream_format_with_colon_offset() {
        let instant = parse_timestamp("2025-08-01T10:00:00.123456+00:00")
            .unwrap()
            .unwrap();
        assert_eq!(instant.year(), 2025);
        assert_eq!(instant.month(), 8);
        assert_eq!(instant.day(), 1);
        assert_eq!(instant.hour(), 10);
        assert_eq!(instant.nanosecond(), 123_456_000);
        assert_eq!(instant.offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_parse_compact_offset() {
        let instant = parse_timestamp("2025-08-01T10:00:00.000000+0530")
            .unwrap()
            .unwrap();
        assert_eq!(instant.offset().local_minus_utc(), 5 * 3600 + 30 * 60);
    }

    #[test]
    fn test_trailing_z_is_stripped_before_offset() {
        let instant = parse_timestamp("2025-08-01T10:00:00.000000+02:00Z")
            .unwrap()
            .unwrap();
        assert_eq!(instant.offset().local_minus_utc(), 2 * 3600);
    }

    #[test]
    fn test_bare_zulu_reads_as_utc() {
        let instant = parse_timestamp("2025-08-01T23:59:59.999999Z")
            .unwrap()
            .unwrap();
        assert_eq!(instant.offset().local_minus_utc(), 0);
        assert_eq!(instant.date_naive(), NaiveDate::from_ymd_opt(2025, 8, 1).unwrap());
    }

    #[test]
    fn test_missing_offset_without_zulu_is_error() {
        let err = parse_timestamp("2025-08-01T10:00:00.000000").unwrap_err();
        assert!(
            matches!(err, Error::Parse { ref input, .. } if input == "2025-08-01T10:00:00.000000")
        );
    }

    #[test]
    fn test_empty_is_absent_not_error() {
        assert!(parse_timestamp("").unwrap().is_none());
        assert!(timestamp_date("").is_none());
    }

    #[test]
    fn test_malformed_inputs() {
        for input in ["Z", "2025-13-01T10:00:00.0+00:00", "2025-08-01", "not a date", " "] {
            assert!(parse_timestamp(input).is_err(), "{input:?} should not parse");
            assert!(timestamp_date(input).is_none());
        }
    }

    #[test]
    fn test_date_is_taken_in_own_offset() {
        // 23:30 at -05:00 is already the next day in UTC; the local date wins
        let date = timestamp_date("2025-08-01T23:30:00.000000-05:00").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 8, 1).unwrap());
    }
}
