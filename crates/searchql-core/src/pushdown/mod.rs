//! Module: pushdown
//! Responsibility: classify a bound predicate and split it into a native
//! backend query plus a residual evaluated locally.
//! Does not own: binding, native query execution, or residual evaluation.
//! Boundary: the split is exact; native ∧ residual keeps exactly the rows
//! local evaluation of the whole predicate keeps.

mod fold;
mod render;

#[cfg(test)]
mod tests;

use crate::{
    backend::{NativeQuery, ScriptQuery},
    config::PushdownConfig,
    expr::{BoundExpr, FieldOrigin, Schema},
    function::FunctionProperties,
    obs::{self, MetricsEvent, SplitOutcome},
    relevance::FullTextQuery,
};

// re-exports
pub(crate) use fold::fold_constants;

///
/// Classification
///
/// Per-conjunct push-down decision, kept for diagnostics.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Classification {
    /// Rendered as a native filter.
    Native,
    /// Shipped to the backend as a script query.
    Script,
    /// Evaluated locally; the reason names what blocked rendering.
    Residual(&'static str),
    /// Derived column reference; forces the whole predicate residual.
    Barrier(String),
}

///
/// SplitPlan
///

#[derive(Clone, Debug, PartialEq)]
pub struct SplitPlan {
    pub native: Option<NativeQuery>,
    pub residual: Option<BoundExpr>,
    pub outcome: SplitOutcome,
    pub decisions: Vec<Classification>,
}

///
/// PushdownEngine
///

pub struct PushdownEngine<'a> {
    schema: &'a Schema,
    config: &'a PushdownConfig,
    props: &'a FunctionProperties,
}

impl<'a> PushdownEngine<'a> {
    #[must_use]
    pub const fn new(
        schema: &'a Schema,
        config: &'a PushdownConfig,
        props: &'a FunctionProperties,
    ) -> Self {
        Self {
            schema,
            config,
            props,
        }
    }

    /// First derived column `expr` reads, directly or via a relevance
    /// field list or pattern.
    #[must_use]
    pub fn derived_reference(&self, expr: &BoundExpr) -> Option<String> {
        let here = match expr {
            BoundExpr::Field {
                name,
                origin: FieldOrigin::Derived,
                ..
            } => Some(name.clone()),
            BoundExpr::Relevance(query) => self.derived_relevance_field(query),
            _ => None,
        };

        here.or_else(|| {
            expr.children()
                .into_iter()
                .find_map(|child| self.derived_reference(child))
        })
    }

    fn derived_relevance_field(&self, query: &FullTextQuery) -> Option<String> {
        let derived = |name: &str| {
            self.schema
                .get(name)
                .is_some_and(|f| f.origin == FieldOrigin::Derived)
        };

        if query.searches_all_fields() {
            return self
                .schema
                .fields()
                .iter()
                .find(|f| f.is_text() && f.origin == FieldOrigin::Derived)
                .map(|f| f.name.clone());
        }

        query.fields().iter().find_map(|weight| {
            if weight.is_pattern() {
                self.schema
                    .matching(&weight.field)
                    .find(|f| f.origin == FieldOrigin::Derived)
                    .map(|f| f.name.clone())
            } else {
                derived(&weight.field).then(|| weight.field.clone())
            }
        })
    }

    /// Decide how a single conjunct is executed.
    #[must_use]
    pub fn classify(&self, conjunct: &BoundExpr) -> Classification {
        self.decide(conjunct).0
    }

    fn decide(&self, conjunct: &BoundExpr) -> (Classification, Option<NativeQuery>) {
        if let Some(field) = self.derived_reference(conjunct) {
            return (Classification::Barrier(field), None);
        }
        if let Some(query) = render::render(conjunct, true, self.props) {
            return (Classification::Native, Some(query));
        }
        if !self.config.script_pushdown {
            return (Classification::Residual("no native form"), None);
        }
        if !scriptable(conjunct) {
            return (Classification::Residual("not scriptable"), None);
        }

        let script = NativeQuery::Script(ScriptQuery {
            predicate: conjunct.clone(),
            instant: self.props.instant(),
        });
        (Classification::Script, Some(script))
    }

    /// Split `predicate` into native and residual parts.
    #[must_use]
    pub fn split(&self, predicate: BoundExpr) -> SplitPlan {
        let predicate = fold_constants(predicate, self.props);

        if let Some(field) = self.derived_reference(&predicate) {
            tracing::debug!(%field, "derived column forces residual evaluation");
            return finish(SplitPlan {
                native: None,
                residual: Some(predicate),
                outcome: SplitOutcome::Barrier,
                decisions: vec![Classification::Barrier(field)],
            });
        }

        let conjuncts = match predicate {
            BoundExpr::And(items) => items,
            other => vec![other],
        };

        let mut natives = Vec::new();
        let mut residuals = Vec::new();
        let mut decisions = Vec::with_capacity(conjuncts.len());
        for conjunct in conjuncts {
            let (decision, native) = self.decide(&conjunct);
            match native {
                Some(query) => natives.push(query),
                None => residuals.push(conjunct),
            }
            decisions.push(decision);
        }

        let outcome = match (natives.is_empty(), residuals.is_empty()) {
            (false, true) => SplitOutcome::Native,
            (true, _) => SplitOutcome::Residual,
            (false, false) => SplitOutcome::Partial,
        };
        let native = (!natives.is_empty()).then(|| NativeQuery::and(natives));
        let residual = match residuals.len() {
            0 => None,
            1 => residuals.pop(),
            _ => Some(BoundExpr::And(residuals)),
        };

        finish(SplitPlan {
            native,
            residual,
            outcome,
            decisions,
        })
    }
}

// Pure operators and plain UDFs only; relevance nodes and context-aware
// calls stay local.
fn scriptable(expr: &BoundExpr) -> bool {
    !expr.any(&|node| match node {
        BoundExpr::Relevance(_) => true,
        BoundExpr::Call { udf, .. } => udf.is_context_aware(),
        _ => false,
    })
}

fn finish(plan: SplitPlan) -> SplitPlan {
    let native_conjuncts = plan
        .decisions
        .iter()
        .filter(|d| matches!(d, Classification::Native | Classification::Script))
        .count();
    obs::record(MetricsEvent::Split {
        outcome: plan.outcome,
        native_conjuncts,
        residual_conjuncts: plan.decisions.len() - native_conjuncts,
    });

    plan
}
