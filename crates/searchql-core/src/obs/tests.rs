use super::*;
use crate::relevance::RelevanceKind;
use std::cell::RefCell;

#[derive(Default)]
struct CaptureSink {
    events: RefCell<Vec<MetricsEvent>>,
}

impl MetricsSink for CaptureSink {
    fn record(&self, event: MetricsEvent) {
        self.events.borrow_mut().push(event);
    }
}

#[test]
fn override_receives_events_inside_scope_only() {
    let sink = CaptureSink::default();
    let event = MetricsEvent::RowsFetched { rows: 3 };

    with_metrics_sink(&sink, || record(event));
    record(MetricsEvent::RowsFetched { rows: 99 });

    assert_eq!(*sink.events.borrow(), vec![event]);
}

#[test]
fn nested_overrides_restore_outer_sink() {
    let outer = CaptureSink::default();
    let inner = CaptureSink::default();
    let translated = MetricsEvent::RelevanceTranslated {
        kind: RelevanceKind::Match,
        fields: 1,
    };

    with_metrics_sink(&outer, || {
        with_metrics_sink(&inner, || record(translated));
        record(MetricsEvent::ResidualFiltered { kept: 1, dropped: 2 });
    });

    assert_eq!(*inner.events.borrow(), vec![translated]);
    assert_eq!(
        *outer.events.borrow(),
        vec![MetricsEvent::ResidualFiltered { kept: 1, dropped: 2 }]
    );
}

#[test]
fn override_is_restored_after_panic() {
    let sink = CaptureSink::default();

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _: () = with_metrics_sink(&sink, || panic!("boom"));
    }));
    assert!(result.is_err());

    record(MetricsEvent::RowsFetched { rows: 1 });
    assert!(sink.events.borrow().is_empty());
}
