//! Module: udf
//! Responsibility: adapt statically-typed domain functions into callable
//! expression-tree nodes.
//! Does not own: function semantics (function::library) or tree binding.
//! Boundary: operands cross in native form; domain values exist only
//! between marshalling and unmarshalling.

mod bound;
mod bridge;


use crate::value::ExprType;
use std::fmt;
use thiserror::Error as ThisError;

// re-exports
pub use bound::BoundUdf;
pub use bridge::{ContextFn, DomainFunction, Implementor, PlainFn, UdfBridge};

///
/// FunctionId
///
/// Stable (owner, name) identity of a domain function.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FunctionId {
    pub owner: &'static str,
    pub name: &'static str,
}

impl FunctionId {
    #[must_use]
    pub const fn new(owner: &'static str, name: &'static str) -> Self {
        Self { owner, name }
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.name)
    }
}

///
/// BridgeError
///
/// Construction-time failures while binding a call to a domain function.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum BridgeError {
    #[error("{function} expects arity {expected}, call supplies {found}")]
    ArityMismatch {
        function: FunctionId,
        expected: usize,
        found: usize,
    },

    #[error("{function} operand {position} expects {expected}, found {found}")]
    OperandType {
        function: FunctionId,
        position: usize,
        expected: String,
        found: ExprType,
    },
}
