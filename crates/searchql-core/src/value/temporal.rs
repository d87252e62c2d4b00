//! Timezone-free temporal text forms shared by literals and the native boundary.
//!
//! Parsing never clamps: a calendar-invalid date such as `2021-04-31` is an
//! error, not the last day of April.

use crate::value::ValueError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.f";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const TIMESTAMP_INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

pub fn parse_date(text: &str) -> Result<NaiveDate, ValueError> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
        .map_err(|err| ValueError::invalid_literal("DATE", text, err))
}

pub fn parse_time(text: &str) -> Result<NaiveTime, ValueError> {
    let trimmed = text.trim();
    NaiveTime::parse_from_str(trimmed, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|err| ValueError::invalid_literal("TIME", text, err))
}

/// Parse a timestamp literal.
///
/// Accepts `yyyy-MM-dd HH:mm:ss[.f]` (space or `T` separated), a bare
/// date (midnight), or RFC 3339 with an offset, which is normalized to UTC.
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime, ValueError> {
    let trimmed = text.trim();

    let mut last_err = None;
    for format in TIMESTAMP_INPUT_FORMATS {
        match NaiveDateTime::parse_from_str(trimmed, format) {
            Ok(parsed) => return Ok(parsed),
            Err(err) => last_err = Some(err),
        }
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.naive_utc());
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return Ok(date.and_time(NaiveTime::MIN));
    }

    Err(ValueError::invalid_literal(
        "TIMESTAMP",
        text,
        last_err.map_or_else(|| "unrecognized format".to_string(), |err| err.to_string()),
    ))
}

#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[must_use]
pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

#[must_use]
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}
