//! Module: session
//! Responsibility: the per-query pipeline from an untyped predicate to
//! filtered rows: bind, split, fetch, residual filter.
//! Does not own: type checking, push-down classification, or backend I/O.
//! Boundary: the function context is captured once per `compile` and
//! travels with the compiled query.

use crate::{
    backend::{NativeQuery, Row, SearchBackend},
    config::{CompilerConfig, ConfigError},
    error::QueryError,
    expr::{Binder, BoundExpr, EvalEnv, Expr, Schema, eval_predicate},
    function::{FunctionProperties, FunctionRegistry, QueryClock, SystemClock},
    obs::{self, MetricsEvent, MetricsSink, with_metrics_sink},
    pushdown::{PushdownEngine, SplitPlan},
};
use chrono_tz::Tz;
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;

///
/// QueryCompiler
///

pub struct QueryCompiler {
    config: CompilerConfig,
    zone: Tz,
    registry: Arc<FunctionRegistry>,
    clock: Box<dyn QueryClock>,
    metrics: Option<&'static dyn MetricsSink>,
}

impl QueryCompiler {
    /// Build a compiler over the builtin function library and the system
    /// clock.
    pub fn new(config: CompilerConfig) -> Result<Self, ConfigError> {
        let zone = config.zone()?;

        Ok(Self {
            config,
            zone,
            registry: Arc::new(FunctionRegistry::builtin().clone()),
            clock: Box::new(SystemClock),
            metrics: None,
        })
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl QueryClock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: Arc<FunctionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub const fn metrics_sink(mut self, sink: &'static dyn MetricsSink) -> Self {
        self.metrics = Some(sink);
        self
    }

    #[must_use]
    pub const fn config(&self) -> &CompilerConfig {
        &self.config
    }

    fn with_metrics<T>(&self, f: impl FnOnce() -> T) -> T {
        if let Some(sink) = self.metrics {
            with_metrics_sink(sink, f)
        } else {
            f()
        }
    }

    /// Bind `predicate` against `schema` and split it for push-down.
    pub fn compile(&self, predicate: &Expr, schema: &Schema) -> Result<CompiledQuery, QueryError> {
        let props =
            FunctionProperties::capture(self.clock.as_ref(), self.zone, self.config.dialect);

        self.with_metrics(|| -> Result<CompiledQuery, QueryError> {
            let binder = Binder::new(schema, &self.registry, &self.config.relevance);
            let bound = binder.bind_predicate(predicate)?;
            let plan = PushdownEngine::new(schema, &self.config.pushdown, &props).split(bound);
            tracing::debug!(
                outcome = ?plan.outcome,
                native = plan.native.is_some(),
                residual = plan.residual.is_some(),
                "compiled predicate"
            );

            Ok(CompiledQuery { plan, props })
        })
    }

    /// Fetch the native portion from `backend` and filter the returned rows
    /// by the residual.
    pub fn execute(
        &self,
        query: &CompiledQuery,
        backend: &dyn SearchBackend,
    ) -> Result<Vec<Row>, QueryError> {
        self.with_metrics(|| execute(query, backend))
    }

    /// Compile and execute in one step.
    pub fn run(
        &self,
        predicate: &Expr,
        schema: &Schema,
        backend: &dyn SearchBackend,
    ) -> Result<Vec<Row>, QueryError> {
        let query = self.compile(predicate, schema)?;

        self.execute(&query, backend)
    }

    /// Whether an aggregation of `buckets` buckets may run on the backend.
    #[must_use]
    pub fn aggregation_pushdown_allowed(&self, buckets: u64) -> bool {
        self.config.pushdown.aggregation_pushdown_allowed(buckets)
    }
}

fn execute(query: &CompiledQuery, backend: &dyn SearchBackend) -> Result<Vec<Row>, QueryError> {
    let rows = backend.search(query.native())?;
    obs::record(MetricsEvent::RowsFetched { rows: rows.len() });

    let Some(residual) = query.residual() else {
        return Ok(rows);
    };

    let env = EvalEnv::new(&query.props).with_text(backend.relevance_evaluator());
    let fetched = rows.len();
    let mut kept = Vec::with_capacity(fetched);
    for row in rows {
        if eval_predicate(residual, &row, &env)? == Some(true) {
            kept.push(row);
        }
    }
    obs::record(MetricsEvent::ResidualFiltered {
        kept: kept.len(),
        dropped: fetched - kept.len(),
    });

    Ok(kept)
}

///
/// CompiledQuery
///
/// A split plan together with the function context it was built under.
/// Executing it twice reads the same instant both times.
///

#[derive(Clone, Debug, PartialEq)]
pub struct CompiledQuery {
    plan: SplitPlan,
    props: FunctionProperties,
}

impl CompiledQuery {
    #[must_use]
    pub const fn plan(&self) -> &SplitPlan {
        &self.plan
    }

    #[must_use]
    pub const fn properties(&self) -> &FunctionProperties {
        &self.props
    }

    #[must_use]
    pub const fn native(&self) -> Option<&NativeQuery> {
        self.plan.native.as_ref()
    }

    #[must_use]
    pub const fn residual(&self) -> Option<&BoundExpr> {
        self.plan.residual.as_ref()
    }

    /// Backend request body: the native filter under `query`, or
    /// `match_all` when nothing was pushed down.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        let filter = self
            .native()
            .map_or_else(|| NativeQuery::MatchAll.to_json(), NativeQuery::to_json);

        json!({ "query": filter })
    }
}
