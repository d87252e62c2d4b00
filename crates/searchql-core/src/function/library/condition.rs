use super::arg;
use crate::{
    function::{
        FunctionError, FunctionSignature, NullPolicy, ReturnTypeInference, signature::ANY,
    },
    udf::{DomainFunction, FunctionId, UdfBridge},
    value::{ExprType, Value},
};

const OWNER: &str = "condition";

pub(super) fn functions() -> Vec<DomainFunction> {
    let predicate = || {
        FunctionSignature::new(
            1,
            [ANY],
            NullPolicy::None,
            ReturnTypeInference::Fixed(ExprType::Boolean),
        )
    };

    vec![
        UdfBridge::adapt(FunctionId::new(OWNER, "isnull"), predicate(), is_null),
        UdfBridge::adapt(FunctionId::new(OWNER, "isnotnull"), predicate(), is_not_null),
    ]
}

fn is_null(args: &[Value]) -> Result<Value, FunctionError> {
    Ok(Value::Boolean(arg("isnull", args, 0)?.is_null()))
}

fn is_not_null(args: &[Value]) -> Result<Value, FunctionError> {
    Ok(Value::Boolean(!arg("isnotnull", args, 0)?.is_null()))
}
