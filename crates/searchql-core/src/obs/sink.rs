//! Event sink boundary.
//!
//! Compilation logic never logs decision points directly through a global.
//! All instrumentation flows through `MetricsEvent` and `MetricsSink`;
//! the default sink forwards events to `tracing`.
use crate::{relevance::RelevanceKind, udf::FunctionId};
use std::cell::RefCell;

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<*const dyn MetricsSink>> = RefCell::new(None);
}

///
/// SplitOutcome
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SplitOutcome {
    /// Whole predicate evaluated natively.
    Native,
    /// Some conjuncts native, the rest residual.
    Partial,
    /// Whole predicate residual.
    Residual,
    /// Derived-column reference forced the whole predicate residual.
    Barrier,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MetricsEvent {
    UdfBound {
        function: FunctionId,
        with_properties: bool,
    },
    RelevanceTranslated {
        kind: RelevanceKind,
        fields: usize,
    },
    Split {
        outcome: SplitOutcome,
        native_conjuncts: usize,
        residual_conjuncts: usize,
    },
    RowsFetched {
        rows: usize,
    },
    ResidualFiltered {
        kept: usize,
        dropped: usize,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// TracingSink
/// Default sink; emits each event as a structured `tracing` event.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct TracingSink;

impl MetricsSink for TracingSink {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::UdfBound {
                function,
                with_properties,
            } => {
                tracing::debug!(%function, with_properties, "udf bound");
            }
            MetricsEvent::RelevanceTranslated { kind, fields } => {
                tracing::debug!(kind = kind.name(), fields, "relevance translated");
            }
            MetricsEvent::Split {
                outcome,
                native_conjuncts,
                residual_conjuncts,
            } => {
                tracing::debug!(
                    ?outcome,
                    native_conjuncts,
                    residual_conjuncts,
                    "predicate split"
                );
            }
            MetricsEvent::RowsFetched { rows } => {
                tracing::trace!(rows, "backend rows fetched");
            }
            MetricsEvent::ResidualFiltered { kept, dropped } => {
                tracing::trace!(kept, dropped, "residual filter applied");
            }
        }
    }
}

pub(crate) const TRACING_SINK: TracingSink = TracingSink;

pub(crate) fn record(event: MetricsEvent) {
    let override_ptr = SINK_OVERRIDE.with(|cell| *cell.borrow());
    if let Some(ptr) = override_ptr {
        // SAFETY:
        // - `ptr` was produced from a valid `&dyn MetricsSink` in `with_metrics_sink`.
        // - `with_metrics_sink` restores the previous pointer before returning,
        //   including unwind paths via `Guard::drop`.
        // - `record` is synchronous and never stores `ptr` beyond this call.
        // Only a shared reference is materialized, matching the borrow used to
        // install the override.
        unsafe { (&*ptr).record(event) };
    } else {
        TRACING_SINK.record(event);
    }
}

/// Run a closure with a temporary sink override on the current thread.
pub fn with_metrics_sink<T>(sink: &dyn MetricsSink, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<*const dyn MetricsSink>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = self.0;
            });
        }
    }

    // SAFETY:
    // - `sink_ptr` is installed only for this dynamic scope.
    // - `Guard` restores the previous slot on all exits, including panic.
    // - `record` dereferences synchronously and never persists `sink_ptr`.
    // The lifetime is erased to a raw pointer but only shared access is exposed.
    let sink_ptr = unsafe { std::mem::transmute::<&dyn MetricsSink, *const dyn MetricsSink>(sink) };
    let prev = SINK_OVERRIDE.with(|cell| {
        let mut slot = cell.borrow_mut();
        slot.replace(sink_ptr)
    });
    let _guard = Guard(prev);

    f()
}
