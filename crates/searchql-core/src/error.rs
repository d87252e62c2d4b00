//! Module: error
//! Responsibility: the crate-level error aggregate and its stable
//! classification.
//! Does not own: module-local error enums; each module defines its own.
//! Boundary: `session` returns `QueryError` for every failure of a query.

use crate::{
    backend::BackendError,
    config::ConfigError,
    expr::{BindError, EvalError},
    function::FunctionError,
    relevance::RelevanceError,
    udf::BridgeError,
    value::ValueError,
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// QueryError
///
/// Any failure while compiling or executing one query. Local evaluation
/// failures are terminal; nothing is retried.
///

#[derive(Debug, ThisError)]
pub enum QueryError {
    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    Function(#[from] FunctionError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Relevance(#[from] RelevanceError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl QueryError {
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Value(err) => value_class(err),
            Self::Function(err) => function_class(err),
            Self::Bridge(err) => bridge_class(err),
            Self::Bind(err) => bind_class(err),
            Self::Eval(err) => eval_class(err),
            Self::Relevance(_) => ErrorClass::InvalidRelevanceOption,
            Self::Backend(err) => match err {
                BackendError::UnknownField(_) => ErrorClass::NotFound,
                BackendError::Script(inner) => eval_class(inner),
                BackendError::Value(inner) => value_class(inner),
                BackendError::Request(_) => ErrorClass::Evaluation,
            },
            Self::Config(_) => ErrorClass::Config,
        }
    }

    #[must_use]
    pub const fn origin(&self) -> ErrorOrigin {
        match self {
            Self::Value(_) => ErrorOrigin::Value,
            Self::Function(_) => ErrorOrigin::Function,
            Self::Bridge(_) => ErrorOrigin::Bridge,
            Self::Bind(_) => ErrorOrigin::Binder,
            Self::Eval(_) => ErrorOrigin::Evaluator,
            Self::Relevance(_) => ErrorOrigin::Relevance,
            Self::Backend(_) => ErrorOrigin::Backend,
            Self::Config(_) => ErrorOrigin::Config,
        }
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {self}", self.origin(), self.class())
    }
}

const fn value_class(err: &ValueError) -> ErrorClass {
    match err {
        ValueError::TypeMismatch { .. }
        | ValueError::Incomparable { .. }
        | ValueError::InvalidLiteral { .. } => ErrorClass::TypeMismatch,
        ValueError::OutOfRange { .. } | ValueError::Overflow { .. } => ErrorClass::Evaluation,
    }
}

const fn function_class(err: &FunctionError) -> ErrorClass {
    match err {
        FunctionError::TimeParse { .. } => ErrorClass::TimeParse,
        FunctionError::InvalidArgument { .. } => ErrorClass::InvalidArgument,
        FunctionError::Value(inner) => value_class(inner),
    }
}

const fn bridge_class(err: &BridgeError) -> ErrorClass {
    match err {
        BridgeError::ArityMismatch { .. } => ErrorClass::ArityMismatch,
        BridgeError::OperandType { .. } => ErrorClass::TypeMismatch,
    }
}

const fn bind_class(err: &BindError) -> ErrorClass {
    match err {
        BindError::UnknownField(_) | BindError::UnknownFunction(_) => ErrorClass::NotFound,
        BindError::TypeMismatch { .. }
        | BindError::Incompatible { .. }
        | BindError::NotPredicate(_) => ErrorClass::TypeMismatch,
        BindError::Literal(inner) => value_class(inner),
        BindError::Bridge(inner) => bridge_class(inner),
        BindError::Relevance(_) => ErrorClass::InvalidRelevanceOption,
    }
}

const fn eval_class(err: &EvalError) -> ErrorClass {
    match err {
        EvalError::Value(inner) => value_class(inner),
        EvalError::Function(inner) => function_class(inner),
        EvalError::RelevanceUnavailable { .. } => ErrorClass::Unsupported,
        EvalError::NotBoolean(_) => ErrorClass::TypeMismatch,
    }
}

///
/// ErrorClass
/// Stable failure taxonomy.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    TypeMismatch,
    InvalidRelevanceOption,
    TimeParse,
    ArityMismatch,
    InvalidArgument,
    Evaluation,
    Unsupported,
    NotFound,
    Config,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::TypeMismatch => "type_mismatch",
            Self::InvalidRelevanceOption => "invalid_relevance_option",
            Self::TimeParse => "time_parse",
            Self::ArityMismatch => "arity_mismatch",
            Self::InvalidArgument => "invalid_argument",
            Self::Evaluation => "evaluation",
            Self::Unsupported => "unsupported",
            Self::NotFound => "not_found",
            Self::Config => "config",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Component that raised the failure.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Value,
    Function,
    Bridge,
    Binder,
    Relevance,
    Evaluator,
    Backend,
    Config,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Value => "value",
            Self::Function => "function",
            Self::Bridge => "bridge",
            Self::Binder => "binder",
            Self::Relevance => "relevance",
            Self::Evaluator => "evaluator",
            Self::Backend => "backend",
            Self::Config => "config",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{udf::FunctionId, value::ExprType};

    #[test]
    fn time_parse_failures_classify_through_evaluation() {
        let err = QueryError::from(EvalError::from(FunctionError::TimeParse {
            expression: "-1x".to_string(),
            reason: "unknown unit".to_string(),
        }));

        assert_eq!(err.class(), ErrorClass::TimeParse);
        assert_eq!(err.origin(), ErrorOrigin::Evaluator);
        assert!(err.display_with_class().starts_with("evaluator:time_parse: "));
    }

    #[test]
    fn bind_wrapped_bridge_errors_keep_their_class() {
        let err = QueryError::from(BindError::from(BridgeError::ArityMismatch {
            function: FunctionId::new("datetime", "latest"),
            expected: 2,
            found: 1,
        }));

        assert_eq!(err.class(), ErrorClass::ArityMismatch);
        assert_eq!(err.origin(), ErrorOrigin::Binder);
    }

    #[test]
    fn relevance_errors_are_invalid_options() {
        let err = QueryError::from(BindError::from(RelevanceError::InvalidFlag {
            token: "BOGUS".to_string(),
        }));

        assert_eq!(err.class(), ErrorClass::InvalidRelevanceOption);
    }

    #[test]
    fn type_errors_classify_as_mismatch() {
        let err = QueryError::from(BindError::NotPredicate(ExprType::Integer));

        assert_eq!(err.class(), ErrorClass::TypeMismatch);
        assert_eq!(err.to_string(), "predicate must be BOOLEAN, found INTEGER");
    }
}
