//! Module: value
//! Responsibility: runtime value model, type descriptors, and the native boundary.
//! Does not own: expression binding, function dispatch, or push-down decisions.
//! Boundary: evaluators and the UDF bridge read and write values through here.

mod arith;
mod coercion;
mod compare;
mod native;
mod tag;
mod temporal;
mod types;


use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::{fmt, net::IpAddr};
use thiserror::Error as ThisError;

// re-exports
pub use arith::{ArithOp, arithmetic, negate};
pub use coercion::{coerce, common_type};
pub use compare::{NullOrder, compare, equals, sort_cmp};
pub use native::{NativeValue, from_native, to_native};
pub use tag::ValueTag;
pub use temporal::{
    format_date, format_time, format_timestamp, parse_date, parse_time, parse_timestamp,
};
pub use types::{ExprType, NativeType, TypeDescriptor};

///
/// ValueError
///
/// Failures raised by value import, access, comparison, and arithmetic.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ValueError {
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("cannot compare {left} with {right}")]
    Incomparable { left: ValueTag, right: ValueTag },

    #[error("invalid {ty} literal '{text}': {reason}")]
    InvalidLiteral {
        ty: String,
        text: String,
        reason: String,
    },

    #[error("{ty} value {value} is out of range")]
    OutOfRange { ty: String, value: String },

    #[error("arithmetic overflow in {op}")]
    Overflow { op: &'static str },
}

impl ValueError {
    pub(crate) fn mismatch(expected: impl fmt::Display, found: impl fmt::Display) -> Self {
        Self::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub(crate) fn invalid_literal(
        ty: impl fmt::Display,
        text: impl Into<String>,
        reason: impl fmt::Display,
    ) -> Self {
        Self::InvalidLiteral {
            ty: ty.to_string(),
            text: text.into(),
            reason: reason.to_string(),
        }
    }
}

///
/// Value
///
/// Domain runtime value. Every value carries exactly one tag; `Null` is a
/// tag of its own rather than an absence.
///
/// Timestamps are timezone-free and read as UTC wall-clock when an
/// instant is needed.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Ip(IpAddr),
    Binary(Vec<u8>),
    /// Ordered list of values sharing one element type.
    Array(Vec<Self>),
    /// Ordered field → value mapping; field order is significant.
    Struct(Vec<(String, Self)>),
}

impl Value {
    #[must_use]
    pub fn string(text: impl Into<String>) -> Self {
        Self::String(text.into())
    }

    #[must_use]
    pub const fn tag(&self) -> ValueTag {
        match self {
            Self::Null => ValueTag::Null,
            Self::Boolean(_) => ValueTag::Boolean,
            Self::Byte(_) => ValueTag::Byte,
            Self::Short(_) => ValueTag::Short,
            Self::Integer(_) => ValueTag::Integer,
            Self::Long(_) => ValueTag::Long,
            Self::Float(_) => ValueTag::Float,
            Self::Double(_) => ValueTag::Double,
            Self::String(_) => ValueTag::String,
            Self::Date(_) => ValueTag::Date,
            Self::Time(_) => ValueTag::Time,
            Self::Timestamp(_) => ValueTag::Timestamp,
            Self::Ip(_) => ValueTag::Ip,
            Self::Binary(_) => ValueTag::Binary,
            Self::Array(_) => ValueTag::Array,
            Self::Struct(_) => ValueTag::Struct,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Static type implied by this value alone.
    ///
    /// Arrays take the type of their first non-null element; an array of
    /// nulls is `ARRAY<UNDEFINED>`.
    #[must_use]
    pub fn expr_type(&self) -> ExprType {
        match self {
            Self::Null => ExprType::Undefined,
            Self::Boolean(_) => ExprType::Boolean,
            Self::Byte(_) => ExprType::Byte,
            Self::Short(_) => ExprType::Short,
            Self::Integer(_) => ExprType::Integer,
            Self::Long(_) => ExprType::Long,
            Self::Float(_) => ExprType::Float,
            Self::Double(_) => ExprType::Double,
            Self::String(_) => ExprType::String,
            Self::Date(_) => ExprType::Date,
            Self::Time(_) => ExprType::Time,
            Self::Timestamp(_) => ExprType::Timestamp,
            Self::Ip(_) => ExprType::Ip,
            Self::Binary(_) => ExprType::Binary,
            Self::Array(items) => {
                let element = items
                    .iter()
                    .find(|item| !item.is_null())
                    .map_or(ExprType::Undefined, Self::expr_type);
                ExprType::Array(Box::new(element))
            }
            Self::Struct(fields) => ExprType::Struct(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.expr_type()))
                    .collect(),
            ),
        }
    }

    fn mismatch(&self, expected: &str) -> ValueError {
        ValueError::mismatch(expected, self.tag())
    }

    pub fn as_bool(&self) -> Result<bool, ValueError> {
        match self {
            Self::Boolean(v) => Ok(*v),
            _ => Err(self.mismatch("BOOLEAN")),
        }
    }

    /// Read any integral tag as `i64`.
    pub fn as_i64(&self) -> Result<i64, ValueError> {
        match self {
            Self::Byte(v) => Ok(i64::from(*v)),
            Self::Short(v) => Ok(i64::from(*v)),
            Self::Integer(v) => Ok(i64::from(*v)),
            Self::Long(v) => Ok(*v),
            _ => Err(self.mismatch("integral")),
        }
    }

    /// Read any numeric tag as `f64`.
    #[expect(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Result<f64, ValueError> {
        match self {
            Self::Byte(v) => Ok(f64::from(*v)),
            Self::Short(v) => Ok(f64::from(*v)),
            Self::Integer(v) => Ok(f64::from(*v)),
            Self::Long(v) => Ok(*v as f64),
            Self::Float(v) => Ok(f64::from(*v)),
            Self::Double(v) => Ok(*v),
            _ => Err(self.mismatch("numeric")),
        }
    }

    pub fn as_str(&self) -> Result<&str, ValueError> {
        match self {
            Self::String(v) => Ok(v),
            _ => Err(self.mismatch("STRING")),
        }
    }

    pub fn as_date(&self) -> Result<NaiveDate, ValueError> {
        match self {
            Self::Date(v) => Ok(*v),
            _ => Err(self.mismatch("DATE")),
        }
    }

    pub fn as_time(&self) -> Result<NaiveTime, ValueError> {
        match self {
            Self::Time(v) => Ok(*v),
            _ => Err(self.mismatch("TIME")),
        }
    }

    pub fn as_timestamp(&self) -> Result<NaiveDateTime, ValueError> {
        match self {
            Self::Timestamp(v) => Ok(*v),
            _ => Err(self.mismatch("TIMESTAMP")),
        }
    }

    pub fn as_ip(&self) -> Result<IpAddr, ValueError> {
        match self {
            Self::Ip(v) => Ok(*v),
            _ => Err(self.mismatch("IP")),
        }
    }

    pub fn as_binary(&self) -> Result<&[u8], ValueError> {
        match self {
            Self::Binary(v) => Ok(v),
            _ => Err(self.mismatch("BINARY")),
        }
    }

    pub fn as_array(&self) -> Result<&[Self], ValueError> {
        match self {
            Self::Array(v) => Ok(v),
            _ => Err(self.mismatch("ARRAY")),
        }
    }

    pub fn as_struct(&self) -> Result<&[(String, Self)], ValueError> {
        match self {
            Self::Struct(v) => Ok(v),
            _ => Err(self.mismatch("STRUCT")),
        }
    }

    /// Unquoted text rendering used by string casts.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Boolean(v) => v.to_string(),
            Self::Byte(v) => v.to_string(),
            Self::Short(v) => v.to_string(),
            Self::Integer(v) => v.to_string(),
            Self::Long(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Double(v) => v.to_string(),
            Self::String(v) => v.clone(),
            Self::Date(v) => format_date(*v),
            Self::Time(v) => format_time(*v),
            Self::Timestamp(v) => format_timestamp(*v),
            Self::Ip(v) => v.to_string(),
            Self::Binary(_) | Self::Array(_) | Self::Struct(_) => self.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(v) => write!(f, "'{}'", v.replace('\'', "''")),
            Self::Date(v) => write!(f, "DATE '{}'", format_date(*v)),
            Self::Time(v) => write!(f, "TIME '{}'", format_time(*v)),
            Self::Timestamp(v) => write!(f, "TIMESTAMP '{}'", format_timestamp(*v)),
            Self::Ip(v) => write!(f, "IP '{v}'"),
            Self::Binary(bytes) => {
                f.write_str("X'")?;
                for byte in bytes {
                    write!(f, "{byte:02X}")?;
                }
                f.write_str("'")
            }
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Struct(fields) => {
                f.write_str("{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str("}")
            }
            other => f.write_str(&other.to_text()),
        }
    }
}
