//! Relative-time expressions anchored at the query-start instant.
//!
//! Grammar: `now`, `now()`, an absolute timestamp (read as wall-clock in the
//! context zone), or a chain of offsets `[+-][N]<unit>` and snaps `@<unit>`,
//! applied left to right. Calendar units (day and coarser) run in the
//! context zone; sub-day units move the instant directly.

use crate::{function::FunctionError, value::parse_timestamp};
use chrono::{
    DateTime, Datelike, Duration, LocalResult, Months, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Timelike,
};
use chrono_tz::Tz;

///
/// TimeUnit
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl TimeUnit {
    fn parse(text: &str) -> Option<Self> {
        Some(match text {
            "s" | "sec" | "secs" | "second" | "seconds" => Self::Second,
            "m" | "min" | "mins" | "minute" | "minutes" => Self::Minute,
            "h" | "hr" | "hrs" | "hour" | "hours" => Self::Hour,
            "d" | "day" | "days" => Self::Day,
            "w" | "wk" | "wks" | "week" | "weeks" => Self::Week,
            "mon" | "month" | "months" => Self::Month,
            "q" | "qtr" | "qtrs" | "quarter" | "quarters" => Self::Quarter,
            "y" | "yr" | "yrs" | "year" | "years" => Self::Year,
            _ => return None,
        })
    }
}

///
/// Step
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Step {
    Offset(i64, TimeUnit),
    Snap(TimeUnit),
    /// Snap to the most recent given weekday, 0 = Sunday.
    SnapWeekday(u32),
}

fn parse_error(expression: &str, reason: impl Into<String>) -> FunctionError {
    FunctionError::TimeParse {
        expression: expression.to_string(),
        reason: reason.into(),
    }
}

fn parse_steps(expression: &str, body: &str) -> Result<Vec<Step>, FunctionError> {
    let bytes = body.as_bytes();
    let mut steps = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b'+' | b'-' => {
                let negative = bytes[pos] == b'-';
                pos += 1;
                let digits_start = pos;
                while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                    pos += 1;
                }
                let amount = if pos == digits_start {
                    1
                } else {
                    body[digits_start..pos]
                        .parse::<i64>()
                        .map_err(|err| parse_error(expression, err.to_string()))?
                };
                let unit_start = pos;
                while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
                    pos += 1;
                }
                let unit = TimeUnit::parse(&body[unit_start..pos]).ok_or_else(|| {
                    parse_error(
                        expression,
                        format!("unknown time unit '{}'", &body[unit_start..pos]),
                    )
                })?;
                steps.push(Step::Offset(if negative { -amount } else { amount }, unit));
            }
            b'@' => {
                pos += 1;
                let unit_start = pos;
                while pos < bytes.len() && bytes[pos].is_ascii_alphanumeric() {
                    pos += 1;
                }
                let unit = &body[unit_start..pos];
                let step = match unit.strip_prefix('w') {
                    Some(day) if !day.is_empty() && day.bytes().all(|b| b.is_ascii_digit()) => {
                        match day.parse::<u32>() {
                            Ok(n @ 0..=7) => Step::SnapWeekday(n % 7),
                            _ => return Err(parse_error(expression, "week snap must be w0..w7")),
                        }
                    }
                    _ => Step::Snap(TimeUnit::parse(unit).ok_or_else(|| {
                        parse_error(expression, format!("unknown snap unit '{unit}'"))
                    })?),
                };
                steps.push(step);
            }
            other => {
                return Err(parse_error(
                    expression,
                    format!("unexpected character '{}'", char::from(other)),
                ));
            }
        }
    }

    Ok(steps)
}

fn resolve_local(
    expression: &str,
    zone: Tz,
    local: NaiveDateTime,
) -> Result<DateTime<Tz>, FunctionError> {
    match zone.from_local_datetime(&local) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        // Local time falls in a DST gap; step past it.
        LocalResult::None => zone
            .from_local_datetime(&(local + Duration::hours(1)))
            .earliest()
            .ok_or_else(|| parse_error(expression, "local time does not exist in zone")),
    }
}

fn add_months(
    expression: &str,
    local: NaiveDateTime,
    months: i64,
) -> Result<NaiveDateTime, FunctionError> {
    let magnitude = u32::try_from(months.unsigned_abs())
        .map_err(|_| parse_error(expression, "offset out of range"))?;
    let shifted = if months >= 0 {
        local.checked_add_months(Months::new(magnitude))
    } else {
        local.checked_sub_months(Months::new(magnitude))
    };

    shifted.ok_or_else(|| parse_error(expression, "offset out of range"))
}

fn apply_step(
    expression: &str,
    current: DateTime<Tz>,
    step: Step,
) -> Result<DateTime<Tz>, FunctionError> {
    let zone = current.timezone();
    let local = current.naive_local();
    let overflow = || parse_error(expression, "offset out of range");

    match step {
        Step::Offset(n, unit) => match unit {
            TimeUnit::Second => current
                .checked_add_signed(Duration::try_seconds(n).ok_or_else(overflow)?)
                .ok_or_else(overflow),
            TimeUnit::Minute => current
                .checked_add_signed(Duration::try_minutes(n).ok_or_else(overflow)?)
                .ok_or_else(overflow),
            TimeUnit::Hour => current
                .checked_add_signed(Duration::try_hours(n).ok_or_else(overflow)?)
                .ok_or_else(overflow),
            TimeUnit::Day | TimeUnit::Week => {
                let days = if unit == TimeUnit::Week {
                    n.checked_mul(7).ok_or_else(overflow)?
                } else {
                    n
                };
                let shifted = local
                    .checked_add_signed(Duration::try_days(days).ok_or_else(overflow)?)
                    .ok_or_else(overflow)?;
                resolve_local(expression, zone, shifted)
            }
            TimeUnit::Month | TimeUnit::Quarter | TimeUnit::Year => {
                let months = match unit {
                    TimeUnit::Month => Some(n),
                    TimeUnit::Quarter => n.checked_mul(3),
                    _ => n.checked_mul(12),
                }
                .ok_or_else(overflow)?;
                resolve_local(expression, zone, add_months(expression, local, months)?)
            }
        },
        Step::Snap(unit) => {
            let date = local.date();
            let snapped = match unit {
                TimeUnit::Second => local.with_nanosecond(0),
                TimeUnit::Minute => local.with_second(0).and_then(|t| t.with_nanosecond(0)),
                TimeUnit::Hour => {
                    NaiveTime::from_hms_opt(local.hour(), 0, 0).map(|t| date.and_time(t))
                }
                TimeUnit::Day => Some(date.and_time(NaiveTime::MIN)),
                TimeUnit::Week => snap_weekday(date, 0),
                TimeUnit::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
                    .map(|d| d.and_time(NaiveTime::MIN)),
                TimeUnit::Quarter => {
                    let first_month = (date.month0() / 3) * 3 + 1;
                    NaiveDate::from_ymd_opt(date.year(), first_month, 1)
                        .map(|d| d.and_time(NaiveTime::MIN))
                }
                TimeUnit::Year => {
                    NaiveDate::from_ymd_opt(date.year(), 1, 1).map(|d| d.and_time(NaiveTime::MIN))
                }
            }
            .ok_or_else(overflow)?;
            resolve_local(expression, zone, snapped)
        }
        Step::SnapWeekday(day) => {
            let snapped = snap_weekday(local.date(), day).ok_or_else(overflow)?;
            resolve_local(expression, zone, snapped)
        }
    }
}

fn snap_weekday(date: NaiveDate, day: u32) -> Option<NaiveDateTime> {
    let back = (date.weekday().num_days_from_sunday() + 7 - day) % 7;
    date.checked_sub_signed(Duration::days(i64::from(back)))
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Resolve `expression` against `base`, in `base`'s zone.
pub fn resolve_relative(
    expression: &str,
    base: DateTime<Tz>,
) -> Result<DateTime<Tz>, FunctionError> {
    let normalized: String = expression
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    if normalized.is_empty() || normalized == "now" || normalized == "now()" {
        return Ok(base);
    }

    if let Ok(absolute) = parse_timestamp(expression) {
        return resolve_local(expression, base.timezone(), absolute);
    }

    let body = normalized
        .strip_prefix("now()")
        .or_else(|| normalized.strip_prefix("now"))
        .unwrap_or(&normalized);

    parse_steps(expression, body)?
        .into_iter()
        .try_fold(base, |current, step| apply_step(expression, current, step))
}
