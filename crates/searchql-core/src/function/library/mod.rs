//! Built-in domain functions, each adapted through the UDF bridge.

mod condition;
mod datetime;
mod ip;
mod math;
mod text;

use crate::{
    function::FunctionError,
    udf::DomainFunction,
    value::{ExprType, Value, coerce},
};
use chrono::NaiveDateTime;

// re-exports
pub use text::{GlobSyntax, glob_matches, like_matches};

pub(crate) fn builtin_functions() -> Vec<DomainFunction> {
    let mut functions = Vec::new();
    functions.extend(condition::functions());
    functions.extend(datetime::functions());
    functions.extend(ip::functions());
    functions.extend(math::functions());
    functions.extend(text::functions());

    functions
}

/// Read operand `index`; the bridge has already checked arity.
fn arg<'a>(
    function: &'static str,
    args: &'a [Value],
    index: usize,
) -> Result<&'a Value, FunctionError> {
    args.get(index).ok_or_else(|| {
        FunctionError::invalid_argument(function, format!("missing operand {index}"))
    })
}

fn text_arg<'a>(
    function: &'static str,
    args: &'a [Value],
    index: usize,
) -> Result<&'a str, FunctionError> {
    Ok(arg(function, args, index)?.as_str()?)
}

/// Read a timestamp-like operand, parsing text and widening dates.
fn timestamp_arg(
    function: &'static str,
    args: &[Value],
    index: usize,
) -> Result<NaiveDateTime, FunctionError> {
    let value = coerce(arg(function, args, index)?.clone(), &ExprType::Timestamp)?;

    Ok(value.as_timestamp()?)
}
