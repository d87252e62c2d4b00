use crate::{
    backend::Row,
    expr::{BoundExpr, EvalEnv, eval},
    function::FunctionProperties,
};

/// Replace constant subtrees with literals.
///
/// Calls, casts, arithmetic and negation whose operands are all literals
/// are evaluated once against the query's function context, so
/// `now() - 1` and `timestamp('2024-01-01')` reach the renderer as
/// literals. A subtree whose evaluation fails is left as is and fails
/// again, per row, at execution.
pub(crate) fn fold_constants(expr: BoundExpr, props: &FunctionProperties) -> BoundExpr {
    let folded = match expr {
        BoundExpr::Cast { expr, ty } => BoundExpr::Cast {
            expr: Box::new(fold_constants(*expr, props)),
            ty,
        },
        BoundExpr::Not(inner) => BoundExpr::Not(Box::new(fold_constants(*inner, props))),
        BoundExpr::And(items) => BoundExpr::And(fold_all(items, props)),
        BoundExpr::Or(items) => BoundExpr::Or(fold_all(items, props)),
        BoundExpr::Compare { op, left, right } => BoundExpr::Compare {
            op,
            left: Box::new(fold_constants(*left, props)),
            right: Box::new(fold_constants(*right, props)),
        },
        BoundExpr::Arith {
            op,
            left,
            right,
            ty,
        } => BoundExpr::Arith {
            op,
            left: Box::new(fold_constants(*left, props)),
            right: Box::new(fold_constants(*right, props)),
            ty,
        },
        BoundExpr::Neg(inner) => BoundExpr::Neg(Box::new(fold_constants(*inner, props))),
        BoundExpr::In {
            expr,
            list,
            negated,
        } => BoundExpr::In {
            expr: Box::new(fold_constants(*expr, props)),
            list: fold_all(list, props),
            negated,
        },
        BoundExpr::Call { udf, args } => BoundExpr::Call {
            udf,
            args: fold_all(args, props),
        },
        leaf @ (BoundExpr::Literal { .. } | BoundExpr::Field { .. } | BoundExpr::Relevance(_)) => {
            leaf
        }
    };

    let foldable = matches!(
        folded,
        BoundExpr::Cast { .. }
            | BoundExpr::Arith { .. }
            | BoundExpr::Neg(_)
            | BoundExpr::Call { .. }
    ) && folded
        .children()
        .iter()
        .all(|child| child.as_literal().is_some());
    if !foldable {
        return folded;
    }

    let env = EvalEnv::new(props);
    match eval(&folded, &Row::new(), &env) {
        Ok(Some(value)) => BoundExpr::Literal {
            ty: folded.ty(),
            value,
        },
        _ => folded,
    }
}

fn fold_all(items: Vec<BoundExpr>, props: &FunctionProperties) -> Vec<BoundExpr> {
    items
        .into_iter()
        .map(|item| fold_constants(item, props))
        .collect()
}
