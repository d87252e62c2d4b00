//! Observability: decision-point events routed through a scoped sink.

pub mod sink;

#[cfg(test)]
mod tests;

// re-exports
pub(crate) use sink::record;
pub use sink::{MetricsEvent, MetricsSink, SplitOutcome, with_metrics_sink};
