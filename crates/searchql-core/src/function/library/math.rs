use super::arg;
use crate::{
    function::{
        FunctionError, FunctionSignature, NullPolicy, ReturnTypeInference, signature::NUMERIC,
    },
    udf::{DomainFunction, FunctionId, UdfBridge},
    value::{Value, ValueError},
};

pub(super) fn functions() -> Vec<DomainFunction> {
    vec![UdfBridge::adapt(
        FunctionId::new("math", "abs"),
        FunctionSignature::new(1, [NUMERIC], NullPolicy::Any, ReturnTypeInference::ArgType(0)),
        abs,
    )]
}

fn abs(args: &[Value]) -> Result<Value, FunctionError> {
    let overflow = || FunctionError::from(ValueError::Overflow { op: "abs" });

    match arg("abs", args, 0)? {
        Value::Byte(v) => v.checked_abs().map(Value::Byte).ok_or_else(overflow),
        Value::Short(v) => v.checked_abs().map(Value::Short).ok_or_else(overflow),
        Value::Integer(v) => v.checked_abs().map(Value::Integer).ok_or_else(overflow),
        Value::Long(v) => v.checked_abs().map(Value::Long).ok_or_else(overflow),
        Value::Float(v) => Ok(Value::Float(v.abs())),
        Value::Double(v) => Ok(Value::Double(v.abs())),
        other => Err(ValueError::mismatch("numeric", other.tag()).into()),
    }
}
