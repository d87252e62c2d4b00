use crate::value::{
    ExprType, Value, ValueError, format_date, format_time, format_timestamp, parse_date,
    parse_time, parse_timestamp,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::DateTime;
use serde_json::{Map, Number, Value as JsonValue};
use std::net::IpAddr;

///
/// NativeValue
///
/// Host/backend representation of a value. Temporal values travel as
/// timezone-free text and IP addresses as canonical text; binary travels
/// as raw bytes.
///

#[derive(Clone, Debug, PartialEq)]
pub enum NativeValue {
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<Self>),
    Map(Vec<(String, Self)>),
}

impl NativeValue {
    #[must_use]
    pub fn string(text: impl Into<String>) -> Self {
        Self::String(text.into())
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Byte(_) => "byte",
            Self::Short(_) => "short",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    fn as_integral(&self) -> Option<i64> {
        match self {
            Self::Byte(v) => Some(i64::from(*v)),
            Self::Short(v) => Some(i64::from(*v)),
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// JSON rendering used by the native query DSL.
    ///
    /// Bytes render as base64 text; non-finite floats render as `null`.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(v) => JsonValue::Bool(*v),
            Self::Byte(v) => JsonValue::from(*v),
            Self::Short(v) => JsonValue::from(*v),
            Self::Int(v) => JsonValue::from(*v),
            Self::Long(v) => JsonValue::from(*v),
            Self::Float(v) => {
                Number::from_f64(f64::from(*v)).map_or(JsonValue::Null, JsonValue::Number)
            }
            Self::Double(v) => Number::from_f64(*v).map_or(JsonValue::Null, JsonValue::Number),
            Self::String(v) => JsonValue::String(v.clone()),
            Self::Bytes(v) => JsonValue::String(BASE64.encode(v)),
            Self::List(items) => JsonValue::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(fields) => {
                let mut map = Map::new();
                for (name, value) in fields {
                    map.insert(name.clone(), value.to_json());
                }
                JsonValue::Object(map)
            }
        }
    }
}

fn mismatch(ty: &ExprType, native: &NativeValue) -> ValueError {
    ValueError::mismatch(ty, native.kind())
}

fn checked_int<T: TryFrom<i64>>(
    ty: &ExprType,
    native: &NativeValue,
    wrap: fn(T) -> Value,
) -> Result<Value, ValueError> {
    let raw = native.as_integral().ok_or_else(|| mismatch(ty, native))?;
    T::try_from(raw).map(wrap).map_err(|_| ValueError::OutOfRange {
        ty: ty.to_string(),
        value: raw.to_string(),
    })
}

/// Import a native value under its static type.
///
/// The static type decides interpretation: the same text imports as a
/// `String` under `STRING` and as a `Timestamp` under `TIMESTAMP`.
/// `UNDEFINED` infers the tag from the native shape alone.
#[expect(clippy::cast_precision_loss)]
pub fn from_native(native: &NativeValue, ty: &ExprType) -> Result<Value, ValueError> {
    if native.is_null() {
        return Ok(Value::Null);
    }

    match ty {
        ExprType::Undefined => Ok(infer(native)),
        ExprType::Boolean => match native {
            NativeValue::Bool(v) => Ok(Value::Boolean(*v)),
            _ => Err(mismatch(ty, native)),
        },
        ExprType::Byte => checked_int(ty, native, Value::Byte),
        ExprType::Short => checked_int(ty, native, Value::Short),
        ExprType::Integer => checked_int(ty, native, Value::Integer),
        ExprType::Long => checked_int(ty, native, Value::Long),
        ExprType::Float => match native {
            NativeValue::Float(v) => Ok(Value::Float(*v)),
            _ => Err(mismatch(ty, native)),
        },
        ExprType::Double => match native {
            NativeValue::Double(v) => Ok(Value::Double(*v)),
            NativeValue::Float(v) => Ok(Value::Double(f64::from(*v))),
            other => other
                .as_integral()
                .map(|v| Value::Double(v as f64))
                .ok_or_else(|| mismatch(ty, native)),
        },
        ExprType::String => match native {
            NativeValue::String(v) => Ok(Value::String(v.clone())),
            _ => Err(mismatch(ty, native)),
        },
        ExprType::Date => match native {
            NativeValue::String(v) => parse_date(v).map(Value::Date),
            _ => Err(mismatch(ty, native)),
        },
        ExprType::Time => match native {
            NativeValue::String(v) => parse_time(v).map(Value::Time),
            _ => Err(mismatch(ty, native)),
        },
        ExprType::Timestamp => match native {
            NativeValue::String(v) => parse_timestamp(v).map(Value::Timestamp),
            // Backends commonly hand out epoch milliseconds for date fields.
            NativeValue::Long(millis) => DateTime::from_timestamp_millis(*millis)
                .map(|dt| Value::Timestamp(dt.naive_utc()))
                .ok_or_else(|| ValueError::OutOfRange {
                    ty: ty.to_string(),
                    value: millis.to_string(),
                }),
            _ => Err(mismatch(ty, native)),
        },
        ExprType::Ip => match native {
            NativeValue::String(v) => v
                .trim()
                .parse::<IpAddr>()
                .map(Value::Ip)
                .map_err(|err| ValueError::invalid_literal("IP", v.as_str(), err)),
            _ => Err(mismatch(ty, native)),
        },
        ExprType::Binary => match native {
            NativeValue::Bytes(v) => Ok(Value::Binary(v.clone())),
            NativeValue::String(v) => BASE64
                .decode(v.as_bytes())
                .map(Value::Binary)
                .map_err(|err| ValueError::invalid_literal("BINARY", v.as_str(), err)),
            _ => Err(mismatch(ty, native)),
        },
        ExprType::Array(element) => match native {
            NativeValue::List(items) => items
                .iter()
                .map(|item| from_native(item, element))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            _ => Err(mismatch(ty, native)),
        },
        ExprType::Struct(fields) => match native {
            NativeValue::Map(entries) => {
                let mut out = Vec::with_capacity(fields.len());
                for (name, field_ty) in fields {
                    let value = match entries.iter().find(|(key, _)| key == name) {
                        Some((_, entry)) => from_native(entry, field_ty)?,
                        None => Value::Null,
                    };
                    out.push((name.clone(), value));
                }
                Ok(Value::Struct(out))
            }
            _ => Err(mismatch(ty, native)),
        },
    }
}

fn infer(native: &NativeValue) -> Value {
    match native {
        NativeValue::Null => Value::Null,
        NativeValue::Bool(v) => Value::Boolean(*v),
        NativeValue::Byte(v) => Value::Byte(*v),
        NativeValue::Short(v) => Value::Short(*v),
        NativeValue::Int(v) => Value::Integer(*v),
        NativeValue::Long(v) => Value::Long(*v),
        NativeValue::Float(v) => Value::Float(*v),
        NativeValue::Double(v) => Value::Double(*v),
        NativeValue::String(v) => Value::String(v.clone()),
        NativeValue::Bytes(v) => Value::Binary(v.clone()),
        NativeValue::List(items) => Value::Array(items.iter().map(infer).collect()),
        NativeValue::Map(fields) => Value::Struct(
            fields
                .iter()
                .map(|(name, value)| (name.clone(), infer(value)))
                .collect(),
        ),
    }
}

/// Export a value to its native representation.
#[must_use]
pub fn to_native(value: &Value) -> NativeValue {
    match value {
        Value::Null => NativeValue::Null,
        Value::Boolean(v) => NativeValue::Bool(*v),
        Value::Byte(v) => NativeValue::Byte(*v),
        Value::Short(v) => NativeValue::Short(*v),
        Value::Integer(v) => NativeValue::Int(*v),
        Value::Long(v) => NativeValue::Long(*v),
        Value::Float(v) => NativeValue::Float(*v),
        Value::Double(v) => NativeValue::Double(*v),
        Value::String(v) => NativeValue::String(v.clone()),
        Value::Date(v) => NativeValue::String(format_date(*v)),
        Value::Time(v) => NativeValue::String(format_time(*v)),
        Value::Timestamp(v) => NativeValue::String(format_timestamp(*v)),
        Value::Ip(v) => NativeValue::String(v.to_string()),
        Value::Binary(v) => NativeValue::Bytes(v.clone()),
        Value::Array(items) => NativeValue::List(items.iter().map(to_native).collect()),
        Value::Struct(fields) => NativeValue::Map(
            fields
                .iter()
                .map(|(name, value)| (name.clone(), to_native(value)))
                .collect(),
        ),
    }
}
