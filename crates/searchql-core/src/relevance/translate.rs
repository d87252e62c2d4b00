use crate::{
    backend::keyed,
    config::RelevanceConfig,
    obs::{self, MetricsEvent},
    relevance::{
        FieldSpec, MatchType, Operator, OptionValue, QueryFlags, RelevanceCall, RelevanceError,
        RelevanceKind,
        options::{allows, normalize},
    },
};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

///
/// FieldWeight
///

#[derive(Clone, Debug, PartialEq)]
pub struct FieldWeight {
    pub field: String,
    pub weight: f64,
}

impl FieldWeight {
    #[must_use]
    pub fn new(field: impl Into<String>, weight: f64) -> Self {
        Self {
            field: field.into(),
            weight,
        }
    }

    /// Whether the name is a `*` pattern rather than a concrete field.
    #[must_use]
    pub fn is_pattern(&self) -> bool {
        self.field.contains('*')
    }
}

///
/// FullTextQuery
///
/// Validated native full-text descriptor: kind, field weights, query text,
/// and the normalized option map. An empty field list searches every
/// field.
///

#[derive(Clone, Debug, PartialEq)]
pub struct FullTextQuery {
    kind: RelevanceKind,
    fields: Vec<FieldWeight>,
    query: String,
    options: BTreeMap<&'static str, OptionValue>,
}

impl FullTextQuery {
    #[must_use]
    pub const fn kind(&self) -> RelevanceKind {
        self.kind
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldWeight] {
        &self.fields
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub const fn options(&self) -> &BTreeMap<&'static str, OptionValue> {
        &self.options
    }

    #[must_use]
    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.options.get(name)
    }

    #[must_use]
    pub fn searches_all_fields(&self) -> bool {
        self.fields.is_empty()
    }

    /// `operator`, falling back to `default_operator`, then `OR`.
    #[must_use]
    pub fn operator(&self) -> Operator {
        ["operator", "default_operator"]
            .iter()
            .find_map(|name| match self.option(name) {
                Some(OptionValue::Operator(op)) => Some(*op),
                _ => None,
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn flags(&self) -> QueryFlags {
        match self.option("flags") {
            Some(OptionValue::Flags(flags)) => *flags,
            _ => QueryFlags::ALL,
        }
    }

    #[must_use]
    pub fn match_type(&self) -> MatchType {
        match self.option("type") {
            Some(OptionValue::MatchType(ty)) => *ty,
            _ => MatchType::default(),
        }
    }

    /// Render in the backend's JSON query DSL.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        let mut body = Map::new();
        body.insert("query".to_string(), JsonValue::String(self.query.clone()));
        for (name, value) in &self.options {
            body.insert((*name).to_string(), value.to_json());
        }

        if self.kind.is_single_field() {
            let field = self.fields.first().map_or("*", |f| f.field.as_str());
            return keyed(self.kind.name(), keyed(field, JsonValue::Object(body)));
        }

        if !self.fields.is_empty() {
            let fields = self
                .fields
                .iter()
                .map(|f| JsonValue::String(format!("{}^{:?}", f.field, f.weight)))
                .collect();
            body.insert("fields".to_string(), JsonValue::Array(fields));
        }

        keyed(self.kind.name(), JsonValue::Object(body))
    }
}

// Characters Lucene's query parser treats as syntax.
const LUCENE_RESERVED: &[char] = &[
    '\\', '+', '-', '!', '(', ')', ':', '^', '[', ']', '"', '{', '}', '~', '*', '?', '|', '&', '/',
];

/// Escape Lucene-reserved characters so the query text matches literally.
#[must_use]
pub fn escape_query(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if LUCENE_RESERVED.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

fn is_unit(weight: f64) -> bool {
    (weight - 1.0).abs() < f64::EPSILON
}

fn field_weights(call: &RelevanceCall) -> Result<Vec<FieldWeight>, RelevanceError> {
    let kind = call.kind;
    let shape = |reason: &str| RelevanceError::FieldSpecShape {
        kind,
        reason: reason.to_string(),
    };

    match (&call.fields, kind.is_single_field()) {
        (FieldSpec::Single { boost: Some(_), .. }, true) => {
            Err(RelevanceError::BoostNotAllowed { kind })
        }
        (FieldSpec::Single { field, boost: None }, true) => {
            if field.is_empty() || field.contains('*') {
                return Err(shape("expects exactly one concrete field"));
            }
            Ok(vec![FieldWeight::new(field.clone(), 1.0)])
        }
        (FieldSpec::List(_), true) => Err(shape("expects a single field, not a field list")),
        (FieldSpec::Single { .. }, false) => Err(shape("expects a bracketed field list")),
        (FieldSpec::List(fields), false) => {
            let weights = fields
                .iter()
                .map(|entry| {
                    let weight = entry.boost.unwrap_or(1.0);
                    if weight.is_finite() && weight > 0.0 {
                        Ok(FieldWeight::new(entry.field.clone(), weight))
                    } else {
                        Err(RelevanceError::NonPositiveBoost {
                            field: entry.field.clone(),
                            boost: weight,
                        })
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;

            // `[]` and `['*']` both search every field.
            let all = weights.is_empty()
                || (weights.len() == 1 && weights[0].field == "*" && is_unit(weights[0].weight));
            Ok(if all { Vec::new() } else { weights })
        }
    }
}

/// Validate a relevance call and produce its native descriptor.
///
/// Options are checked against the kind's allow-list, duplicates are
/// rejected, operators default to `OR`, and `escape` (where the kind has
/// it) falls back to the configured per-kind default. A `multi_match`
/// over one unweighted field reduces to the matching single-field kind.
pub fn translate(
    call: &RelevanceCall,
    config: &RelevanceConfig,
) -> Result<FullTextQuery, RelevanceError> {
    let kind = call.kind;
    let fields = field_weights(call)?;

    let mut options = BTreeMap::new();
    for (name, value) in &call.options {
        let (canonical, normalized) = normalize(kind, name, value)?;
        if options.insert(canonical, normalized).is_some() {
            return Err(RelevanceError::DuplicateOption {
                kind,
                option: canonical,
            });
        }
    }

    for operator in ["operator", "default_operator"] {
        if allows(kind, operator) {
            options
                .entry(operator)
                .or_insert(OptionValue::Operator(Operator::Or));
        }
    }

    let mut query = call.query.clone();
    if allows(kind, "escape") {
        let escape = match options.remove("escape") {
            Some(OptionValue::Bool(escape)) => escape,
            _ => config.escape_default(kind),
        };
        if escape {
            query = escape_query(&query);
        }
    }

    // Only a field written without a boost degenerates; `^1.0` is kept.
    let unweighted = matches!(
        &call.fields,
        FieldSpec::List(list) if list.len() == 1 && list[0].boost.is_none()
    );

    let mut kind = kind;
    if kind == RelevanceKind::MultiMatch
        && unweighted
        && fields.len() == 1
        && !fields[0].is_pattern()
    {
        let target = match options.get("type") {
            Some(OptionValue::MatchType(ty)) => ty.single_field_kind(),
            _ => MatchType::default().single_field_kind(),
        };
        let dropped: Vec<&str> = options
            .keys()
            .copied()
            .filter(|name| *name != "type" && !allows(target, name))
            .collect();
        if !dropped.is_empty() {
            tracing::debug!(
                kind = target.name(),
                dropped = ?dropped,
                "single-field multi_match drops options its target kind lacks"
            );
        }
        options.retain(|name, _| allows(target, name));
        if allows(target, "operator") {
            options
                .entry("operator")
                .or_insert(OptionValue::Operator(Operator::Or));
        }
        kind = target;
    }

    obs::record(MetricsEvent::RelevanceTranslated {
        kind,
        fields: fields.len(),
    });

    Ok(FullTextQuery {
        kind,
        fields,
        query,
        options,
    })
}
