//! Shared fixtures for in-crate tests: one schema, a handful of rows that
//! exercise missing fields and explicit nulls, and a frozen clock.

use crate::{
    backend::Row,
    expr::Schema,
    function::{FunctionProperties, QueryDialect},
    value::{ExprType, NativeValue},
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Parse an RFC 3339 instant.
pub(crate) fn instant(text: &str) -> DateTime<Utc> {
    text.parse().expect("RFC 3339 instant")
}

/// Context frozen at `text`, evaluated in UTC under PPL.
pub(crate) fn props_at(text: &str) -> FunctionProperties {
    FunctionProperties::current(instant(text), Tz::UTC, QueryDialect::Ppl)
}

/// `id`, `name`, `age`, `score`, `active`, `ts`, `ip`, `title`, `body`
/// and `tags` are indexed; `score_bucket` is derived upstream.
pub(crate) fn sample_schema() -> Schema {
    Schema::new()
        .indexed("id", ExprType::Long)
        .indexed("name", ExprType::String)
        .indexed("age", ExprType::Integer)
        .indexed("score", ExprType::Double)
        .indexed("active", ExprType::Boolean)
        .indexed("ts", ExprType::Timestamp)
        .indexed("ip", ExprType::Ip)
        .indexed("title", ExprType::String)
        .indexed("body", ExprType::String)
        .indexed("tags", ExprType::array_of(ExprType::String))
        .derived("score_bucket", ExprType::String)
}

fn text(value: &str) -> NativeValue {
    NativeValue::string(value)
}

pub(crate) fn sample_rows() -> Vec<Row> {
    vec![
        Row::new()
            .with("id", NativeValue::Long(1))
            .with("name", text("alice"))
            .with("age", NativeValue::Int(25))
            .with("score", NativeValue::Double(1.5))
            .with("active", NativeValue::Bool(true))
            .with("ts", text("2024-01-01 09:30:00"))
            .with("ip", text("10.0.0.1"))
            .with("title", text("Quick brown fox"))
            .with("body", text("The quick brown fox jumps over the lazy dog"))
            .with("tags", NativeValue::List(vec![text("animal"), text("fast")]))
            .with("score_bucket", text("low")),
        Row::new()
            .with("id", NativeValue::Long(2))
            .with("name", text("bob"))
            .with("age", NativeValue::Int(35))
            .with("score", NativeValue::Null)
            .with("active", NativeValue::Bool(false))
            .with("ts", text("2023-12-31 22:00:00"))
            .with("ip", text("192.168.1.20"))
            .with("title", text("Lazy dog days"))
            .with("body", text("dogs sleep all day"))
            .with("score_bucket", text("mid")),
        Row::new()
            .with("id", NativeValue::Long(3))
            .with("name", text("carol"))
            .with("age", NativeValue::Int(42))
            .with("score", NativeValue::Double(9.0))
            .with("active", NativeValue::Bool(true))
            .with("ts", text("2024-01-01 09:59:00"))
            .with("ip", text("10.0.0.7"))
            .with("title", text("Brown bear"))
            .with("body", text("a brown bear in the woods"))
            .with("score_bucket", text("high")),
        Row::new()
            .with("id", NativeValue::Long(4))
            .with("name", NativeValue::Null)
            .with("ts", text("2024-01-01 10:30:00"))
            .with("title", text("fox and hound"))
            .with("score_bucket", text("high")),
        Row::new()
            .with("id", NativeValue::Long(5))
            .with("name", text("dave"))
            .with("age", NativeValue::Int(19))
            .with("score", NativeValue::Double(4.25))
            .with("active", NativeValue::Bool(false))
            .with("ts", text("2023-06-15 12:00:00"))
            .with("ip", text("172.16.0.1"))
            .with("title", text("free software"))
            .with("body", text("free as in freedom"))
            .with("score_bucket", text("high")),
    ]
}
