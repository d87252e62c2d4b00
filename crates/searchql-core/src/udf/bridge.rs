use crate::{
    function::{FunctionError, FunctionProperties, FunctionSignature},
    obs::{self, MetricsEvent},
    udf::{BoundUdf, BridgeError, FunctionId},
    value::{ExprType, Value},
};
use std::sync::Arc;

/// Domain function over marshalled operand values.
pub type PlainFn = fn(&[Value]) -> Result<Value, FunctionError>;

/// Domain function that takes the function context as its first parameter.
pub type ContextFn = fn(&FunctionProperties, &[Value]) -> Result<Value, FunctionError>;

///
/// Implementor
///

#[derive(Clone, Copy, Debug)]
pub enum Implementor {
    Plain(PlainFn),
    WithProperties(ContextFn),
}

impl Implementor {
    /// Parameters the bridge supplies itself.
    #[must_use]
    pub const fn injected_slots(&self) -> usize {
        match self {
            Self::Plain(_) => 0,
            Self::WithProperties(_) => 1,
        }
    }

    pub(crate) fn call(
        &self,
        props: &FunctionProperties,
        operands: &[Value],
    ) -> Result<Value, FunctionError> {
        match self {
            Self::Plain(f) => f(operands),
            Self::WithProperties(f) => f(props, operands),
        }
    }
}

///
/// DomainFunction
///
/// A domain function adapted for the expression tree: identity, declared
/// signature, and implementor.
///

#[derive(Clone, Debug)]
pub struct DomainFunction {
    id: FunctionId,
    signature: FunctionSignature,
    implementor: Implementor,
}

impl DomainFunction {
    #[must_use]
    pub const fn id(&self) -> FunctionId {
        self.id
    }

    #[must_use]
    pub const fn signature(&self) -> &FunctionSignature {
        &self.signature
    }

    #[must_use]
    pub const fn implementor(&self) -> Implementor {
        self.implementor
    }

    #[must_use]
    pub const fn is_context_aware(&self) -> bool {
        matches!(self.implementor, Implementor::WithProperties(_))
    }

    /// Bind a call with the given static operand types.
    ///
    /// Operand count plus injected context must equal the declared arity,
    /// and each operand type must satisfy its rule.
    pub fn bind(self: &Arc<Self>, operand_types: Vec<ExprType>) -> Result<BoundUdf, BridgeError> {
        let found = operand_types.len() + self.implementor.injected_slots();
        if found != self.signature.arity {
            return Err(BridgeError::ArityMismatch {
                function: self.id,
                expected: self.signature.arity,
                found,
            });
        }

        if let Some(position) = self.signature.first_rejected(&operand_types) {
            return Err(BridgeError::OperandType {
                function: self.id,
                position,
                expected: self.signature.operands[position].to_string(),
                found: operand_types[position].clone(),
            });
        }

        let return_type = self.signature.returns.infer(&operand_types);
        obs::record(MetricsEvent::UdfBound {
            function: self.id,
            with_properties: self.is_context_aware(),
        });

        Ok(BoundUdf::new(Arc::clone(self), operand_types, return_type))
    }
}

///
/// UdfBridge
///
/// Entry points that turn domain functions into `DomainFunction`s.
///

pub struct UdfBridge;

impl UdfBridge {
    /// Adapt a plain domain function.
    #[must_use]
    pub const fn adapt(id: FunctionId, signature: FunctionSignature, f: PlainFn) -> DomainFunction {
        DomainFunction {
            id,
            signature,
            implementor: Implementor::Plain(f),
        }
    }

    /// Adapt a domain function that receives the function context as its
    /// first argument.
    #[must_use]
    pub const fn adapt_with_properties(
        id: FunctionId,
        signature: FunctionSignature,
        f: ContextFn,
    ) -> DomainFunction {
        DomainFunction {
            id,
            signature,
            implementor: Implementor::WithProperties(f),
        }
    }
}
