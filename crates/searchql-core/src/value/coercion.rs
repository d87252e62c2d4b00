//! Explicit value coercion.
//!
//! Coercion is only ever applied through `Cast` nodes the binder inserts.
//! Equality and ordering never coerce on their own.

use crate::value::{ExprType, Value, ValueError, parse_date, parse_time, parse_timestamp};
use chrono::NaiveTime;
use std::net::IpAddr;

///
/// Numeric
///
/// Intermediate form for numeric conversions.
///

#[derive(Clone, Copy)]
enum Numeric {
    Int(i64),
    Float(f64),
}

fn numeric_of(value: &Value) -> Option<Numeric> {
    match value {
        Value::Byte(_) | Value::Short(_) | Value::Integer(_) | Value::Long(_) => {
            value.as_i64().ok().map(Numeric::Int)
        }
        Value::Float(_) | Value::Double(_) => value.as_f64().ok().map(Numeric::Float),
        _ => None,
    }
}

fn out_of_range(target: &ExprType, value: impl ToString) -> ValueError {
    ValueError::OutOfRange {
        ty: target.to_string(),
        value: value.to_string(),
    }
}

#[expect(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn numeric_to(num: Numeric, target: &ExprType) -> Result<Value, ValueError> {
    // Float to integral truncates toward zero, then range-checks.
    let integral = |num: Numeric| -> Result<i64, ValueError> {
        match num {
            Numeric::Int(v) => Ok(v),
            Numeric::Float(v) if v.is_finite() && v >= i64::MIN as f64 && v < i64::MAX as f64 => {
                Ok(v.trunc() as i64)
            }
            Numeric::Float(v) => Err(out_of_range(target, v)),
        }
    };

    match target {
        ExprType::Byte => {
            let v = integral(num)?;
            i8::try_from(v)
                .map(Value::Byte)
                .map_err(|_| out_of_range(target, v))
        }
        ExprType::Short => {
            let v = integral(num)?;
            i16::try_from(v)
                .map(Value::Short)
                .map_err(|_| out_of_range(target, v))
        }
        ExprType::Integer => {
            let v = integral(num)?;
            i32::try_from(v)
                .map(Value::Integer)
                .map_err(|_| out_of_range(target, v))
        }
        ExprType::Long => integral(num).map(Value::Long),
        ExprType::Float => Ok(Value::Float(match num {
            Numeric::Int(v) => v as f32,
            Numeric::Float(v) => v as f32,
        })),
        ExprType::Double => Ok(Value::Double(match num {
            Numeric::Int(v) => v as f64,
            Numeric::Float(v) => v,
        })),
        _ => Err(ValueError::mismatch(target, "numeric")),
    }
}

fn parse_numeric(text: &str, target: &ExprType) -> Result<Value, ValueError> {
    let trimmed = text.trim();
    let num = if target.is_integral() {
        trimmed.parse::<i64>().map(Numeric::Int).map_err(|err| {
            ValueError::invalid_literal(target, text, err)
        })?
    } else {
        trimmed.parse::<f64>().map(Numeric::Float).map_err(|err| {
            ValueError::invalid_literal(target, text, err)
        })?
    };

    numeric_to(num, target)
}

/// Convert `value` to `target`.
///
/// Supported: numeric widening and range-checked narrowing, text parsing
/// into numeric/boolean/temporal/IP types, any scalar to `STRING`, and
/// date/timestamp conversions. Null converts to null under every type.
pub fn coerce(value: Value, target: &ExprType) -> Result<Value, ValueError> {
    if value.is_null() || *target == ExprType::Undefined || value.expr_type() == *target {
        return Ok(value);
    }

    if let Some(num) = numeric_of(&value)
        && target.is_numeric()
    {
        return numeric_to(num, target);
    }

    match (value, target) {
        (Value::String(text), ExprType::Boolean) => match text.trim().to_ascii_lowercase().as_str()
        {
            "true" => Ok(Value::Boolean(true)),
            "false" => Ok(Value::Boolean(false)),
            _ => Err(ValueError::invalid_literal(target, text, "expected true or false")),
        },
        (Value::String(text), t) if t.is_numeric() => parse_numeric(&text, t),
        (Value::String(text), ExprType::Date) => parse_date(&text).map(Value::Date),
        (Value::String(text), ExprType::Time) => parse_time(&text).map(Value::Time),
        (Value::String(text), ExprType::Timestamp) => parse_timestamp(&text).map(Value::Timestamp),
        (Value::String(text), ExprType::Ip) => text
            .trim()
            .parse::<IpAddr>()
            .map(Value::Ip)
            .map_err(|err| ValueError::invalid_literal(target, text.as_str(), err)),
        (Value::Date(date), ExprType::Timestamp) => {
            Ok(Value::Timestamp(date.and_time(NaiveTime::MIN)))
        }
        (Value::Timestamp(ts), ExprType::Date) => Ok(Value::Date(ts.date())),
        (Value::Timestamp(ts), ExprType::Time) => Ok(Value::Time(ts.time())),
        (Value::Array(items), ExprType::Array(element)) => items
            .into_iter()
            .map(|item| coerce(item, element))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        (
            value @ (Value::Boolean(_)
            | Value::Byte(_)
            | Value::Short(_)
            | Value::Integer(_)
            | Value::Long(_)
            | Value::Float(_)
            | Value::Double(_)
            | Value::Date(_)
            | Value::Time(_)
            | Value::Timestamp(_)
            | Value::Ip(_)),
            ExprType::String,
        ) => Ok(Value::String(value.to_text())),
        (value, _) => Err(ValueError::mismatch(target, value.tag())),
    }
}

/// Common type two operands unify to, or `None` when they are
/// incompatible.
///
/// Text unifies with temporal and IP types (the text side is parsed); it
/// never unifies with numerics.
#[must_use]
pub fn common_type(left: &ExprType, right: &ExprType) -> Option<ExprType> {
    if left == right {
        return Some(left.clone());
    }

    match (left, right) {
        (ExprType::Undefined, other) | (other, ExprType::Undefined) => Some(other.clone()),
        (a, b) if a.is_numeric() && b.is_numeric() => {
            let (ra, rb) = (a.numeric_rank()?, b.numeric_rank()?);
            Some(if ra >= rb { a.clone() } else { b.clone() })
        }
        (ExprType::String, other) | (other, ExprType::String)
            if other.is_temporal() || *other == ExprType::Ip =>
        {
            Some(other.clone())
        }
        (ExprType::Date, ExprType::Timestamp) | (ExprType::Timestamp, ExprType::Date) => {
            Some(ExprType::Timestamp)
        }
        (ExprType::Array(a), ExprType::Array(b)) => common_type(a, b).map(ExprType::array_of),
        _ => None,
    }
}
