//! Production reporter: counters and histograms go to the `metrics` facade, spans become
//! `tracing` spans plus a closing event.
//!
//! Without an installed recorder (see [`init_metrics_exporter`](super::init_metrics_exporter))
//! the `metrics` calls are no-ops, so this reporter is always safe to use.

use super::{Labels, ScopedSpan, SpanRecord, TelemetryReporter};
use metrics::Label;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsReporter;

impl MetricsReporter {
    pub fn new() -> Self {
        Self
    }
}

fn render_attributes(record: &SpanRecord) -> String {
    record
        .attributes
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn to_labels(labels: Labels<'_>) -> Vec<Label> {
    labels
        .iter()
        .map(|(key, value)| Label::new(*key, value.clone()))
        .collect()
}

fn close_span(record: SpanRecord) {
    let duration_ms = record.duration.as_secs_f64() * 1000.0;
    let attributes = render_attributes(&record);
    if record.error {
        warn!(span_name = record.name, duration_ms, %attributes, "Span closed with error");
    } else {
        debug!(span_name = record.name, duration_ms, %attributes, "Span closed");
    }
    metrics::histogram!("span_duration_seconds", "span" => record.name)
        .record(record.duration.as_secs_f64());
}

impl TelemetryReporter for MetricsReporter {
    fn start_span(&self, name: &'static str) -> ScopedSpan {
        let span = tracing::info_span!("span", span_name = name);
        ScopedSpan::new(name, span, close_span)
    }

    fn increment_counter(&self, name: &'static str, labels: Labels<'_>) {
        metrics::counter!(name, to_labels(labels)).increment(1);
    }

    fn record_histogram(&self, name: &'static str, value: f64, labels: Labels<'_>) {
        metrics::histogram!(name, to_labels(labels)).record(value);
    }
}
