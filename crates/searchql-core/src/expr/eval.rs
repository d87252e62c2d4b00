use crate::{
    backend::{RelevanceEvaluator, Row},
    expr::{BoundExpr, CompareOp},
    function::{FunctionError, FunctionProperties},
    relevance::RelevanceKind,
    value::{
        Value, ValueError, ValueTag, arithmetic, coerce, compare, equals, from_native, negate,
        to_native,
    },
};
use std::cmp::Ordering;
use thiserror::Error as ThisError;

///
/// EvalError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum EvalError {
    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    Function(#[from] FunctionError),

    #[error("{kind} can only be evaluated by the search backend")]
    RelevanceUnavailable { kind: RelevanceKind },

    #[error("predicate evaluated to {0}, expected BOOLEAN")]
    NotBoolean(ValueTag),
}

///
/// EvalEnv
///
/// Everything a local evaluation needs besides the row: the query's
/// function context and, when the backend offers one, a full-text
/// evaluator for relevance nodes.
///

#[derive(Clone, Copy)]
pub struct EvalEnv<'a> {
    pub props: &'a FunctionProperties,
    pub text: Option<&'a dyn RelevanceEvaluator>,
}

impl<'a> EvalEnv<'a> {
    #[must_use]
    pub const fn new(props: &'a FunctionProperties) -> Self {
        Self { props, text: None }
    }

    #[must_use]
    pub const fn with_text(mut self, text: Option<&'a dyn RelevanceEvaluator>) -> Self {
        self.text = text;
        self
    }
}

/// Evaluate `expr` against one row.
///
/// `None` is a missing value (a field absent from the row); `Some(Null)`
/// is an explicit null. Only the UDF null policies tell the two apart,
/// every other operator reads missing as null.
pub fn eval(expr: &BoundExpr, row: &Row, env: &EvalEnv<'_>) -> Result<Option<Value>, EvalError> {
    let value = match expr {
        BoundExpr::Literal { value, .. } => value.clone(),
        BoundExpr::Field { name, ty, .. } => match row.get(name) {
            Some(native) => from_native(native, ty)?,
            None => return Ok(None),
        },
        BoundExpr::Cast { expr, ty } => match eval(expr, row, env)? {
            Some(value) => coerce(value, ty)?,
            None => return Ok(None),
        },
        BoundExpr::Not(inner) => truth(eval_predicate(inner, row, env)?.map(|b| !b)),
        BoundExpr::And(items) => {
            let mut unknown = false;
            for item in items {
                match eval_predicate(item, row, env)? {
                    Some(false) => return Ok(Some(Value::Boolean(false))),
                    Some(true) => {}
                    None => unknown = true,
                }
            }
            truth((!unknown).then_some(true))
        }
        BoundExpr::Or(items) => {
            let mut unknown = false;
            for item in items {
                match eval_predicate(item, row, env)? {
                    Some(true) => return Ok(Some(Value::Boolean(true))),
                    Some(false) => {}
                    None => unknown = true,
                }
            }
            truth((!unknown).then_some(false))
        }
        BoundExpr::Compare { op, left, right } => {
            let left = eval_or_null(left, row, env)?;
            let right = eval_or_null(right, row, env)?;
            truth(compare_values(*op, &left, &right)?)
        }
        BoundExpr::Arith {
            op, left, right, ..
        } => {
            let left = eval_or_null(left, row, env)?;
            let right = eval_or_null(right, row, env)?;
            arithmetic(*op, &left, &right)?
        }
        BoundExpr::Neg(inner) => negate(&eval_or_null(inner, row, env)?)?,
        BoundExpr::In {
            expr,
            list,
            negated,
        } => {
            let needle = eval_or_null(expr, row, env)?;
            let found = if needle.is_null() {
                None
            } else {
                let mut saw_null = false;
                let mut found = false;
                for item in list {
                    match equals(&needle, &eval_or_null(item, row, env)?)? {
                        Some(true) => {
                            found = true;
                            break;
                        }
                        Some(false) => {}
                        None => saw_null = true,
                    }
                }
                if found {
                    Some(true)
                } else if saw_null {
                    None
                } else {
                    Some(false)
                }
            };
            truth(found.map(|found| found != *negated))
        }
        BoundExpr::Call { udf, args } => {
            let operands = args
                .iter()
                .map(|arg| Ok(eval(arg, row, env)?.as_ref().map(to_native)))
                .collect::<Result<Vec<_>, EvalError>>()?;
            match udf.invoke(&operands, env.props)? {
                Some(native) => from_native(&native, udf.return_type())?,
                None => return Ok(None),
            }
        }
        BoundExpr::Relevance(query) => {
            let text = env.text.ok_or(EvalError::RelevanceUnavailable { kind: query.kind() })?;
            Value::Boolean(text.matches(query, row))
        }
    };

    Ok(Some(value))
}

/// Evaluate a boolean expression under three-valued logic; `None` is
/// unknown.
pub fn eval_predicate(
    expr: &BoundExpr,
    row: &Row,
    env: &EvalEnv<'_>,
) -> Result<Option<bool>, EvalError> {
    match eval(expr, row, env)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Boolean(b)) => Ok(Some(b)),
        Some(other) => Err(EvalError::NotBoolean(other.tag())),
    }
}

fn eval_or_null(expr: &BoundExpr, row: &Row, env: &EvalEnv<'_>) -> Result<Value, EvalError> {
    Ok(eval(expr, row, env)?.unwrap_or(Value::Null))
}

fn truth(value: Option<bool>) -> Value {
    value.map_or(Value::Null, Value::Boolean)
}

pub(crate) fn compare_values(
    op: CompareOp,
    left: &Value,
    right: &Value,
) -> Result<Option<bool>, ValueError> {
    Ok(match op {
        CompareOp::Eq => equals(left, right)?,
        CompareOp::Ne => equals(left, right)?.map(|eq| !eq),
        CompareOp::Lt => compare(left, right)?.map(Ordering::is_lt),
        CompareOp::Lte => compare(left, right)?.map(Ordering::is_le),
        CompareOp::Gt => compare(left, right)?.map(Ordering::is_gt),
        CompareOp::Gte => compare(left, right)?.map(Ordering::is_ge),
    })
}
