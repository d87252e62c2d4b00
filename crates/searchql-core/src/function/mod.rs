//! Module: function
//! Responsibility: per-query function context, function signatures, the
//! built-in function library and its process-wide registry.
//! Does not own: operand marshalling or null-policy enforcement (udf).
//! Boundary: the binder resolves calls by name through `FunctionRegistry`.

mod library;
mod properties;
mod registry;
mod relative;
mod signature;


use crate::value::ValueError;
use thiserror::Error as ThisError;

// re-exports
pub use library::{GlobSyntax, glob_matches, like_matches};
pub use properties::{FixedClock, FunctionProperties, QueryClock, QueryDialect, SystemClock};
pub use registry::FunctionRegistry;
pub use relative::resolve_relative;
pub use signature::{
    FunctionSignature, NullPolicy, OperandRule, ReturnTypeInference, TypeFamily,
};

///
/// FunctionError
///
/// Evaluation-time failures raised by domain functions.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum FunctionError {
    #[error("cannot parse time expression '{expression}': {reason}")]
    TimeParse { expression: String, reason: String },

    #[error("invalid argument to {function}: {reason}")]
    InvalidArgument {
        function: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Value(#[from] ValueError),
}

impl FunctionError {
    pub(crate) fn invalid_argument(function: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            function,
            reason: reason.into(),
        }
    }
}
