//! In-memory reference backend.
//!
//! Evaluates native queries over a fixed document set with the same
//! two-valued semantics a search engine applies. Push-down equivalence
//! checks compare its answers against local evaluation.

mod text;

#[cfg(test)]
mod tests;

use crate::{
    backend::{
        BackendError, BoolQuery, NativeQuery, RangeBound, RelevanceEvaluator, Row, ScriptQuery,
        SearchBackend,
    },
    expr::{EvalEnv, Schema, eval_predicate},
    function::FunctionProperties,
    relevance::FullTextQuery,
    value::{NativeValue, Value, compare, equals, from_native},
};
use std::cmp::Ordering;
use text::wildcard_matches;

///
/// MemoryBackend
///

#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    schema: Schema,
    rows: Vec<Row>,
}

impl MemoryBackend {
    #[must_use]
    pub const fn new(schema: Schema, rows: Vec<Row>) -> Self {
        Self { schema, rows }
    }

    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Whether `row` satisfies `query`.
    pub fn query_matches(&self, query: &NativeQuery, row: &Row) -> Result<bool, BackendError> {
        match query {
            NativeQuery::MatchAll => Ok(true),
            NativeQuery::MatchNone => Ok(false),
            NativeQuery::Term { field, value } => {
                let Some(actual) = self.field_value(field, row)? else {
                    return Ok(false);
                };
                let expected = self.import(field, value)?;
                Ok(equals(&actual, &expected)? == Some(true))
            }
            NativeQuery::Terms { field, values } => {
                let Some(actual) = self.field_value(field, row)? else {
                    return Ok(false);
                };
                for value in values {
                    if equals(&actual, &self.import(field, value)?)? == Some(true) {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            NativeQuery::Range {
                field,
                lower,
                upper,
            } => {
                let Some(actual) = self.field_value(field, row)? else {
                    return Ok(false);
                };
                let within = |bound: &RangeBound, wanted: Ordering| -> Result<bool, BackendError> {
                    let limit = self.import(field, &bound.value)?;
                    Ok(match compare(&actual, &limit)? {
                        Some(Ordering::Equal) => bound.inclusive,
                        Some(ordering) => ordering == wanted,
                        None => false,
                    })
                };
                let lower_ok = match lower {
                    Some(bound) => within(bound, Ordering::Greater)?,
                    None => true,
                };
                let upper_ok = match upper {
                    Some(bound) => within(bound, Ordering::Less)?,
                    None => true,
                };
                Ok(lower_ok && upper_ok)
            }
            NativeQuery::Exists { field } => Ok(self.field_value(field, row)?.is_some()),
            NativeQuery::Wildcard {
                field,
                pattern,
                case_insensitive,
            } => Ok(self.field_value(field, row)?.is_some_and(|value| {
                wildcard_matches(&value.to_text(), pattern, *case_insensitive)
            })),
            NativeQuery::FullText(query) => Ok(text::full_text_matches(&self.schema, query, row)),
            NativeQuery::Bool(query) => self.bool_matches(query, row),
            NativeQuery::Script(script) => self.script_matches(script, row),
        }
    }

    fn bool_matches(&self, query: &BoolQuery, row: &Row) -> Result<bool, BackendError> {
        for clause in &query.must {
            if !self.query_matches(clause, row)? {
                return Ok(false);
            }
        }
        for clause in &query.must_not {
            if self.query_matches(clause, row)? {
                return Ok(false);
            }
        }
        if query.should.is_empty() {
            return Ok(true);
        }
        for clause in &query.should {
            if self.query_matches(clause, row)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    // Scripts run with the function context restored from the shipped
    // instant, never with a fresh clock reading.
    fn script_matches(&self, script: &ScriptQuery, row: &Row) -> Result<bool, BackendError> {
        let props = FunctionProperties::restore(script.instant);
        let env = EvalEnv::new(&props).with_text(Some(self));

        Ok(eval_predicate(&script.predicate, row, &env)? == Some(true))
    }

    /// Non-null value of `field` imported under its schema type.
    fn field_value(&self, field: &str, row: &Row) -> Result<Option<Value>, BackendError> {
        let schema = self
            .schema
            .get(field)
            .ok_or_else(|| BackendError::UnknownField(field.to_string()))?;
        let Some(native) = row.get(field) else {
            return Ok(None);
        };
        let value = from_native(native, &schema.ty.ty)?;

        Ok((!value.is_null()).then_some(value))
    }

    fn import(&self, field: &str, native: &NativeValue) -> Result<Value, BackendError> {
        let schema = self
            .schema
            .get(field)
            .ok_or_else(|| BackendError::UnknownField(field.to_string()))?;

        Ok(from_native(native, &schema.ty.ty)?)
    }
}

impl SearchBackend for MemoryBackend {
    fn search(&self, query: Option<&NativeQuery>) -> Result<Vec<Row>, BackendError> {
        let Some(query) = query else {
            return Ok(self.rows.clone());
        };

        let mut hits = Vec::new();
        for row in &self.rows {
            if self.query_matches(query, row)? {
                hits.push(row.clone());
            }
        }

        Ok(hits)
    }

    fn relevance_evaluator(&self) -> Option<&dyn RelevanceEvaluator> {
        Some(self)
    }
}

impl RelevanceEvaluator for MemoryBackend {
    fn matches(&self, query: &FullTextQuery, row: &Row) -> bool {
        text::full_text_matches(&self.schema, query, row)
    }
}
