use crate::{
    relevance::{RelevanceError, RelevanceKind},
    value::Value,
};

///
/// FieldBoost
///
/// One entry of a bracketed field list. `boost` is `None` when the call
/// gave no weight.
///

#[derive(Clone, Debug, PartialEq)]
pub struct FieldBoost {
    pub field: String,
    pub boost: Option<f64>,
}

impl FieldBoost {
    #[must_use]
    pub fn new(field: impl Into<String>, boost: Option<f64>) -> Self {
        Self {
            field: field.into(),
            boost,
        }
    }
}

///
/// FieldSpec
///
/// Field specification exactly as written. Shape rules are checked during
/// translation, so a boosted bare field survives parsing and is rejected
/// with a precise error later.
///

#[derive(Clone, Debug, PartialEq)]
pub enum FieldSpec {
    /// Bare or quoted field name, optionally followed by a weight.
    Single { field: String, boost: Option<f64> },
    /// Bracketed list; may be empty.
    List(Vec<FieldBoost>),
}

impl FieldSpec {
    #[must_use]
    pub fn single(field: impl Into<String>) -> Self {
        Self::Single {
            field: field.into(),
            boost: None,
        }
    }

    #[must_use]
    pub fn list<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Option<f64>)>,
        S: Into<String>,
    {
        Self::List(
            fields
                .into_iter()
                .map(|(field, boost)| FieldBoost::new(field, boost))
                .collect(),
        )
    }

    /// Every field name mentioned, patterns included.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::Single { field, .. } => vec![field.as_str()],
            Self::List(fields) => fields.iter().map(|f| f.field.as_str()).collect(),
        }
    }
}

///
/// RelevanceArgument
///
/// Planner-side argument of a relevance call, in call order.
///

#[derive(Clone, Debug, PartialEq)]
pub enum RelevanceArgument {
    Fields(FieldSpec),
    Query(String),
    Named { name: String, value: Value },
}

///
/// RelevanceCall
///
/// Unvalidated relevance call descriptor. Constructed once per predicate
/// call and consumed by `translate`; option names keep their written case
/// until validation.
///

#[derive(Clone, Debug, PartialEq)]
pub struct RelevanceCall {
    pub kind: RelevanceKind,
    pub fields: FieldSpec,
    pub query: String,
    pub options: Vec<(String, Value)>,
}

impl RelevanceCall {
    #[must_use]
    pub fn new(kind: RelevanceKind, fields: FieldSpec, query: impl Into<String>) -> Self {
        Self {
            kind,
            fields,
            query: query.into(),
            options: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_option(mut self, name: impl Into<String>, value: Value) -> Self {
        self.options.push((name.into(), value));
        self
    }

    /// Assemble a call from planner arguments: the fields, then the
    /// query text, then any number of named options.
    pub fn from_arguments(
        kind: RelevanceKind,
        arguments: Vec<RelevanceArgument>,
    ) -> Result<Self, RelevanceError> {
        let malformed = |reason: &str| RelevanceError::MalformedCall {
            kind,
            reason: reason.to_string(),
        };
        let mut arguments = arguments.into_iter();

        let Some(RelevanceArgument::Fields(fields)) = arguments.next() else {
            return Err(malformed("first argument must be a field specification"));
        };
        let Some(RelevanceArgument::Query(query)) = arguments.next() else {
            return Err(malformed("second argument must be the query text"));
        };

        let mut call = Self::new(kind, fields, query);
        for argument in arguments {
            match argument {
                RelevanceArgument::Named { name, value } => call.options.push((name, value)),
                _ => return Err(malformed("only named options may follow the query text")),
            }
        }

        Ok(call)
    }
}
