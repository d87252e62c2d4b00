use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use std::fmt;

///
/// QueryDialect
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum QueryDialect {
    Sql,
    #[default]
    Ppl,
}

impl fmt::Display for QueryDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sql => f.write_str("sql"),
            Self::Ppl => f.write_str("ppl"),
        }
    }
}

///
/// QueryClock
///
/// Source of the query-start instant. Sampled exactly once per query.
///

pub trait QueryClock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

///
/// SystemClock
///

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl QueryClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

///
/// FixedClock
///

#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl QueryClock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

///
/// FunctionProperties
///
/// Immutable per-query execution context: the frozen query-start instant,
/// the zone calendar arithmetic runs in, and the dialect. Every
/// time-relative function in one query reads the same instant.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FunctionProperties {
    instant: DateTime<Utc>,
    zone: Tz,
    dialect: QueryDialect,
}

impl FunctionProperties {
    #[must_use]
    pub const fn current(instant: DateTime<Utc>, zone: Tz, dialect: QueryDialect) -> Self {
        Self {
            instant,
            zone,
            dialect,
        }
    }

    /// Sample `clock` once and freeze the result.
    #[must_use]
    pub fn capture(clock: &dyn QueryClock, zone: Tz, dialect: QueryDialect) -> Self {
        Self::current(clock.now(), zone, dialect)
    }

    /// Rebuild a context on the backend side of a script push-down, where
    /// only the query-start instant travels. Zone is UTC, dialect PPL.
    #[must_use]
    pub const fn restore(instant: DateTime<Utc>) -> Self {
        Self::current(instant, Tz::UTC, QueryDialect::Ppl)
    }

    #[must_use]
    pub const fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    #[must_use]
    pub const fn zone(&self) -> Tz {
        self.zone
    }

    #[must_use]
    pub const fn dialect(&self) -> QueryDialect {
        self.dialect
    }

    /// Query-start instant as zone-local date-time.
    #[must_use]
    pub fn zoned_now(&self) -> DateTime<Tz> {
        self.instant.with_timezone(&self.zone)
    }

    /// Query-start wall-clock time in the context zone.
    #[must_use]
    pub fn local_now(&self) -> NaiveDateTime {
        self.zoned_now().naive_local()
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.local_now().date()
    }
}
