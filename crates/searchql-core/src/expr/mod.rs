//! Module: expr
//! Responsibility: the planner-facing expression tree, schema binding, and
//! local three-valued evaluation of bound trees.
//! Does not own: push-down classification or native query rendering.
//! Boundary: `Binder` is the only way to turn an `Expr` into a `BoundExpr`.

mod ast;
mod bind;
mod eval;
mod schema;

#[cfg(test)]
mod tests;

// re-exports
pub use ast::{CompareOp, Expr};
pub use bind::{BindError, Binder, BoundExpr};
pub(crate) use eval::compare_values;
pub use eval::{EvalEnv, EvalError, eval, eval_predicate};
pub(crate) use schema::glob_matches;
pub use schema::{FieldOrigin, FieldSchema, Schema};
