use crate::{
    function::{FunctionError, FunctionProperties, NullPolicy},
    udf::{DomainFunction, FunctionId},
    value::{ExprType, NativeValue, Value, from_native, to_native},
};
use std::sync::Arc;

///
/// BoundUdf
///
/// A domain function bound to static operand types. Pure given its native
/// operands and the function context.
///

#[derive(Clone, Debug)]
pub struct BoundUdf {
    function: Arc<DomainFunction>,
    operand_types: Vec<ExprType>,
    return_type: ExprType,
}

impl BoundUdf {
    pub(crate) const fn new(
        function: Arc<DomainFunction>,
        operand_types: Vec<ExprType>,
        return_type: ExprType,
    ) -> Self {
        Self {
            function,
            operand_types,
            return_type,
        }
    }

    #[must_use]
    pub fn id(&self) -> FunctionId {
        self.function.id()
    }

    #[must_use]
    pub fn function(&self) -> &DomainFunction {
        &self.function
    }

    #[must_use]
    pub fn operand_types(&self) -> &[ExprType] {
        &self.operand_types
    }

    #[must_use]
    pub const fn return_type(&self) -> &ExprType {
        &self.return_type
    }

    #[must_use]
    pub fn is_context_aware(&self) -> bool {
        self.function.is_context_aware()
    }

    /// Invoke with native operand outputs; `None` is a missing operand.
    ///
    /// Operands are marshalled under their static types, the null policy is
    /// applied, the domain function runs, and its result is exported back
    /// to native form.
    pub fn invoke(
        &self,
        operands: &[Option<NativeValue>],
        props: &FunctionProperties,
    ) -> Result<Option<NativeValue>, FunctionError> {
        let id = self.id();
        if operands.len() != self.operand_types.len() {
            return Err(FunctionError::invalid_argument(
                id.name,
                format!(
                    "bound for {} operands, invoked with {}",
                    self.operand_types.len(),
                    operands.len()
                ),
            ));
        }

        let policy = self.function.signature().null_policy;
        if operands.iter().any(Option::is_none) {
            match policy {
                NullPolicy::Any => return Ok(None),
                NullPolicy::Strict => return Ok(Some(NativeValue::Null)),
                NullPolicy::None => {}
            }
        }

        let values = operands
            .iter()
            .zip(&self.operand_types)
            .map(|(native, ty)| match native {
                Some(native) => from_native(native, ty),
                None => Ok(Value::Null),
            })
            .collect::<Result<Vec<_>, _>>()?;

        if policy != NullPolicy::None && values.iter().any(Value::is_null) {
            return Ok(Some(NativeValue::Null));
        }

        let result = self.function.implementor().call(props, &values)?;

        Ok(Some(to_native(&result)))
    }
}

// Two bindings are equal when they bind the same function to the same
// operand types.
impl PartialEq for BoundUdf {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
            && self.operand_types == other.operand_types
            && self.return_type == other.return_type
    }
}
