use super::{arg, text_arg, timestamp_arg};
use crate::{
    function::{
        FunctionError, FunctionProperties, FunctionSignature, NullPolicy, ReturnTypeInference,
        resolve_relative,
        signature::{DATETIME_OR_STRING, NUMERIC, STRING},
    },
    udf::{DomainFunction, FunctionId, UdfBridge},
    value::{ExprType, Value, parse_date, parse_timestamp},
};
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

const OWNER: &str = "datetime";

// Offsets accepted by convert_tz, in minutes.
const MIN_OFFSET_MINUTES: i32 = -(13 * 60 + 59);
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

pub(super) fn functions() -> Vec<DomainFunction> {
    let relative = || {
        FunctionSignature::new(
            3,
            [STRING, DATETIME_OR_STRING],
            NullPolicy::Any,
            ReturnTypeInference::Fixed(ExprType::Boolean),
        )
    };
    let datetime_to = |returns: ExprType| {
        FunctionSignature::new(
            1,
            [DATETIME_OR_STRING],
            NullPolicy::Any,
            ReturnTypeInference::Fixed(returns),
        )
    };
    let niladic = |returns: ExprType| {
        FunctionSignature::new(1, Vec::new(), NullPolicy::Any, ReturnTypeInference::Fixed(returns))
    };

    vec![
        UdfBridge::adapt_with_properties(FunctionId::new(OWNER, "latest"), relative(), latest),
        UdfBridge::adapt_with_properties(FunctionId::new(OWNER, "earliest"), relative(), earliest),
        UdfBridge::adapt_with_properties(
            FunctionId::new(OWNER, "now"),
            niladic(ExprType::Timestamp),
            now,
        ),
        UdfBridge::adapt_with_properties(
            FunctionId::new(OWNER, "current_date"),
            niladic(ExprType::Date),
            current_date,
        ),
        UdfBridge::adapt(
            FunctionId::new(OWNER, "convert_tz"),
            FunctionSignature::new(
                3,
                [DATETIME_OR_STRING, STRING, STRING],
                NullPolicy::Any,
                ReturnTypeInference::Fixed(ExprType::Timestamp),
            ),
            convert_tz,
        ),
        UdfBridge::adapt(
            FunctionId::new(OWNER, "timestamp"),
            datetime_to(ExprType::Timestamp),
            timestamp,
        ),
        UdfBridge::adapt(FunctionId::new(OWNER, "date"), datetime_to(ExprType::Date), date),
        UdfBridge::adapt(FunctionId::new(OWNER, "month"), datetime_to(ExprType::Integer), month),
        UdfBridge::adapt(
            FunctionId::new(OWNER, "makedate"),
            FunctionSignature::new(
                2,
                [NUMERIC, NUMERIC],
                NullPolicy::Any,
                ReturnTypeInference::Fixed(ExprType::Date),
            ),
            make_date,
        ),
    ]
}

fn boundary_and_candidate(
    function: &'static str,
    props: &FunctionProperties,
    args: &[Value],
) -> Result<(DateTime<Utc>, DateTime<Utc>), FunctionError> {
    let expression = text_arg(function, args, 0)?;
    let candidate = Utc.from_utc_datetime(&timestamp_arg(function, args, 1)?);
    let boundary = resolve_relative(expression, props.zoned_now())?.with_timezone(&Utc);

    Ok((boundary, candidate))
}

/// True iff the relative boundary is strictly after the candidate.
fn latest(props: &FunctionProperties, args: &[Value]) -> Result<Value, FunctionError> {
    let (boundary, candidate) = boundary_and_candidate("latest", props, args)?;

    Ok(Value::Boolean(boundary > candidate))
}

/// True iff the candidate is at or after the relative boundary.
fn earliest(props: &FunctionProperties, args: &[Value]) -> Result<Value, FunctionError> {
    let (boundary, candidate) = boundary_and_candidate("earliest", props, args)?;

    Ok(Value::Boolean(boundary <= candidate))
}

fn now(props: &FunctionProperties, _args: &[Value]) -> Result<Value, FunctionError> {
    Ok(Value::Timestamp(props.local_now()))
}

fn current_date(props: &FunctionProperties, _args: &[Value]) -> Result<Value, FunctionError> {
    Ok(Value::Date(props.today()))
}

fn timestamp(args: &[Value]) -> Result<Value, FunctionError> {
    Ok(Value::Timestamp(timestamp_arg("timestamp", args, 0)?))
}

fn date(args: &[Value]) -> Result<Value, FunctionError> {
    match arg("date", args, 0)? {
        Value::Date(d) => Ok(Value::Date(*d)),
        Value::String(text) if !text.contains([' ', 'T', ':']) => {
            Ok(Value::Date(parse_date(text)?))
        }
        _ => Ok(Value::Date(timestamp_arg("date", args, 0)?.date())),
    }
}

#[expect(clippy::cast_possible_wrap)]
fn month(args: &[Value]) -> Result<Value, FunctionError> {
    let month = match arg("month", args, 0)? {
        Value::Date(d) => d.month(),
        Value::String(text) if !text.contains([' ', 'T', ':']) => {
            parse_date(text)?.month()
        }
        _ => timestamp_arg("month", args, 0)?.month(),
    };

    Ok(Value::Integer(month as i32))
}

///
/// ZoneSpec
///

#[derive(Clone, Copy, Debug)]
enum ZoneSpec {
    Fixed(FixedOffset),
    Named(Tz),
}

impl ZoneSpec {
    /// `[+-]HH:MM` within the accepted offset range, or an IANA name.
    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some(sign) = text.chars().next().filter(|c| *c == '+' || *c == '-') {
            let (hours, minutes) = text[1..].split_once(':')?;
            if hours.len() != 2 || minutes.len() != 2 {
                return None;
            }
            let hours: i32 = hours.parse().ok()?;
            let minutes: i32 = minutes.parse().ok()?;
            if minutes >= 60 {
                return None;
            }
            let total = hours * 60 + minutes;
            let total = if sign == '-' { -total } else { total };
            if !(MIN_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&total) {
                return None;
            }
            return FixedOffset::east_opt(total * 60).map(Self::Fixed);
        }

        text.parse::<Tz>().ok().map(Self::Named)
    }

    fn local_to_utc(self, local: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            Self::Fixed(offset) => offset
                .from_local_datetime(&local)
                .single()
                .map(|dt| dt.naive_utc()),
            Self::Named(zone) => zone
                .from_local_datetime(&local)
                .earliest()
                .map(|dt| dt.naive_utc()),
        }
    }

    fn utc_to_local(self, utc: NaiveDateTime) -> NaiveDateTime {
        match self {
            Self::Fixed(offset) => offset.from_utc_datetime(&utc).naive_local(),
            Self::Named(zone) => zone.from_utc_datetime(&utc).naive_local(),
        }
    }
}

/// Re-express a wall-clock timestamp from one zone in another.
///
/// Unparseable text timestamps and zones outside `-13:59..=+14:00` yield
/// null. Invalid timestamps produced upstream still fail upstream.
fn convert_tz(args: &[Value]) -> Result<Value, FunctionError> {
    let source = match arg("convert_tz", args, 0)? {
        Value::String(text) => match parse_timestamp(text) {
            Ok(ts) => ts,
            Err(_) => return Ok(Value::Null),
        },
        _ => timestamp_arg("convert_tz", args, 0)?,
    };

    let (Some(from), Some(to)) = (
        ZoneSpec::parse(text_arg("convert_tz", args, 1)?),
        ZoneSpec::parse(text_arg("convert_tz", args, 2)?),
    ) else {
        return Ok(Value::Null);
    };

    Ok(from
        .local_to_utc(source)
        .map_or(Value::Null, |utc| Value::Timestamp(to.utc_to_local(utc))))
}

/// Java-style `Math.round`: half rounds toward positive infinity.
fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

/// `makedate(year, day_of_year)`.
///
/// Both operands are rounded. Non-positive days and negative years yield
/// null; year 0 reads as 2000; days past year end roll into later years.
#[expect(clippy::cast_possible_truncation)]
fn make_date(args: &[Value]) -> Result<Value, FunctionError> {
    let year = round_half_up(arg("makedate", args, 0)?.as_f64()?);
    let day = round_half_up(arg("makedate", args, 1)?.as_f64()?);

    if day <= 0.0 || year < 0.0 || !year.is_finite() || !day.is_finite() {
        return Ok(Value::Null);
    }
    let year = match year as i32 {
        0 => 2000,
        year => year,
    };

    let out_of_range = || FunctionError::invalid_argument("makedate", "date out of range");
    let start = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(out_of_range)?;
    let offset = Duration::try_days(day as i64 - 1).ok_or_else(out_of_range)?;

    start
        .checked_add_signed(offset)
        .map(Value::Date)
        .ok_or_else(out_of_range)
}
