//! Module: backend
//! Responsibility: the native query DSL, the `SearchBackend` seam, and an
//! in-memory reference backend.
//! Does not own: deciding what is pushed down; `pushdown` builds the
//! native queries handed over here.
//! Boundary: rows cross this boundary in native form only.

pub mod memory;
mod query;

#[cfg(test)]
mod tests;

use crate::{
    expr::EvalError,
    relevance::FullTextQuery,
    value::{NativeValue, ValueError},
};
use derive_more::{Deref, From, IntoIterator};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

// re-exports
pub use memory::MemoryBackend;
pub(crate) use query::keyed;
pub use query::{BoolQuery, NativeQuery, RangeBound, SCRIPT_LANG, ScriptQuery, like_to_wildcard};

///
/// BackendError
///

#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum BackendError {
    #[error("native query references unknown field '{0}'")]
    UnknownField(String),

    #[error("script query failed: {0}")]
    Script(#[from] EvalError),

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error("backend request failed: {0}")]
    Request(String),
}

///
/// Row
///
/// One backend document as a field → native value map. Absent keys are
/// missing fields, distinct from explicit nulls.
///

#[derive(Clone, Debug, Default, Deref, From, IntoIterator, PartialEq)]
#[into_iterator(owned, ref)]
pub struct Row(BTreeMap<String, NativeValue>);

impl Row {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: NativeValue) -> Self {
        self.0.insert(field.into(), value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: NativeValue) -> Option<NativeValue> {
        self.0.insert(field.into(), value)
    }
}

impl<S: Into<String>> FromIterator<(S, NativeValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (S, NativeValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

///
/// SearchBackend
///
/// External search client. `None` asks for every document.
///

pub trait SearchBackend {
    fn search(&self, query: Option<&NativeQuery>) -> Result<Vec<Row>, BackendError>;

    /// Local full-text evaluator for relevance nodes left in a residual.
    fn relevance_evaluator(&self) -> Option<&dyn RelevanceEvaluator> {
        None
    }
}

///
/// RelevanceEvaluator
///

pub trait RelevanceEvaluator {
    fn matches(&self, query: &FullTextQuery, row: &Row) -> bool;
}
