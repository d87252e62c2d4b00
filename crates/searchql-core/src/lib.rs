//! Query-compilation core for a search-oriented SQL/PPL engine: the domain
//! value model, the UDF bridge and its per-query function context, the
//! relevance-function translator, and the push-down split between native
//! backend queries and local residual evaluation.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod backend;
pub mod config;
pub mod error;
pub mod expr;
pub mod function;
pub mod obs;
pub mod pushdown;
pub mod relevance;
pub mod session;
pub mod udf;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Domain vocabulary only. Errors, sinks, and backends stay one module
/// level down.
///

pub mod prelude {
    pub use crate::{
        expr::{Expr, FieldOrigin, Schema},
        function::{FunctionProperties, QueryDialect},
        relevance::RelevanceKind,
        session::QueryCompiler,
        value::{ExprType, TypeDescriptor, Value},
    };
}
