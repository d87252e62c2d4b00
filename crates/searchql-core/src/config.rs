//! Module: config
//! Responsibility: compiler configuration loaded from TOML.
//! Does not own: per-query state; the function context is built per query.
//! Boundary: the session reads this once when a compiler is constructed.

use crate::{function::QueryDialect, relevance::RelevanceKind};
use chrono_tz::Tz;
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("invalid compiler config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown time zone '{0}'")]
    UnknownZone(String),
}

///
/// CompilerConfig
///
/// Every field has a default; an empty document is a valid config.
///

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// IANA zone name used when a query does not carry its own zone.
    pub default_zone: String,
    pub dialect: QueryDialect,
    pub relevance: RelevanceConfig,
    pub pushdown: PushdownConfig,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            default_zone: "UTC".to_string(),
            dialect: QueryDialect::Ppl,
            relevance: RelevanceConfig::default(),
            pushdown: PushdownConfig::default(),
        }
    }
}

impl CompilerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.zone()?;

        Ok(config)
    }

    /// Resolve `default_zone`.
    pub fn zone(&self) -> Result<Tz, ConfigError> {
        self.default_zone
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownZone(self.default_zone.clone()))
    }
}

///
/// RelevanceConfig
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RelevanceConfig {
    /// Default for the `escape` option per relevance kind. Kinds not
    /// listed default to `false`.
    pub escape_defaults: BTreeMap<RelevanceKind, bool>,
}

impl RelevanceConfig {
    #[must_use]
    pub fn escape_default(&self, kind: RelevanceKind) -> bool {
        self.escape_defaults.get(&kind).copied().unwrap_or(false)
    }
}

///
/// PushdownConfig
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PushdownConfig {
    /// Ship pure expressions over indexed columns as backend scripts.
    pub script_pushdown: bool,

    /// Bucket ceiling supplied by the backend collaborator. `None` means
    /// the backend imposes no ceiling.
    pub aggregation_bucket_limit: Option<u64>,
}

impl PushdownConfig {
    #[must_use]
    pub fn aggregation_pushdown_allowed(&self, buckets: u64) -> bool {
        self.aggregation_bucket_limit
            .is_none_or(|limit| buckets <= limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = CompilerConfig::from_toml_str("").expect("empty config");

        assert_eq!(config, CompilerConfig::default());
        assert_eq!(config.zone().expect("zone"), Tz::UTC);
        assert!(!config.relevance.escape_default(RelevanceKind::QueryString));
        assert!(!config.pushdown.script_pushdown);
    }

    #[test]
    fn parses_full_document() {
        let config = CompilerConfig::from_toml_str(
            r#"
            default_zone = "America/New_York"
            dialect = "sql"

            [relevance.escape_defaults]
            query_string = true

            [pushdown]
            script_pushdown = true
            aggregation_bucket_limit = 1000
            "#,
        )
        .expect("config");

        assert_eq!(config.zone().expect("zone"), chrono_tz::America::New_York);
        assert_eq!(config.dialect, QueryDialect::Sql);
        assert!(config.relevance.escape_default(RelevanceKind::QueryString));
        assert!(!config.relevance.escape_default(RelevanceKind::SimpleQueryString));
        assert!(config.pushdown.aggregation_pushdown_allowed(1000));
        assert!(!config.pushdown.aggregation_pushdown_allowed(1001));
    }

    #[test]
    fn unknown_keys_and_zones_are_rejected() {
        assert!(matches!(
            CompilerConfig::from_toml_str("bogus = 1"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            CompilerConfig::from_toml_str("default_zone = \"Mars/Olympus\""),
            Err(ConfigError::UnknownZone(_))
        ));
    }

    #[test]
    fn missing_bucket_limit_allows_any_bucket_count() {
        assert!(PushdownConfig::default().aggregation_pushdown_allowed(u64::MAX));
    }
}
