//! In-memory reporter for tests.

use super::{Labels, ScopedSpan, SpanRecord, TelemetryReporter};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

type SeriesKey = (String, Vec<(String, String)>);

#[derive(Debug, Default)]
struct Recorded {
    counters: BTreeMap<SeriesKey, u64>,
    histograms: BTreeMap<SeriesKey, Vec<f64>>,
    spans: Vec<SpanRecord>,
}

/// Keeps every signal in memory. Clones share the same storage.
///
/// Lookups take the labels as a slice of `(key, value)` pairs; order does not matter.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    inner: Arc<Mutex<Recorded>>,
}

fn key(name: &str, labels: &[(&str, &str)]) -> SeriesKey {
    let mut labels: Vec<(String, String)> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    labels.sort();
    (name.to_string(), labels)
}

fn owned_key(name: &str, labels: Labels<'_>) -> SeriesKey {
    let borrowed: Vec<(&str, &str)> = labels.iter().map(|(k, v)| (*k, v.as_str())).collect();
    key(name, &borrowed)
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Count for one exact label set.
    pub fn counter(&self, name: &str, labels: &[(&str, &str)]) -> u64 {
        self.lock()
            .counters
            .get(&key(name, labels))
            .copied()
            .unwrap_or(0)
    }

    /// Sum over every label set of `name`.
    pub fn counter_total(&self, name: &str) -> u64 {
        self.lock()
            .counters
            .iter()
            .filter(|((n, _), _)| n == name)
            .map(|(_, v)| v)
            .sum()
    }

    /// Samples for one exact label set, in recording order.
    pub fn histogram(&self, name: &str, labels: &[(&str, &str)]) -> Vec<f64> {
        self.lock()
            .histograms
            .get(&key(name, labels))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of samples over every label set of `name`.
    pub fn histogram_count(&self, name: &str) -> usize {
        self.lock()
            .histograms
            .iter()
            .filter(|((n, _), _)| n == name)
            .map(|(_, v)| v.len())
            .sum()
    }

    pub fn spans(&self) -> Vec<SpanRecord> {
        self.lock().spans.clone()
    }

    pub fn spans_named(&self, name: &str) -> Vec<SpanRecord> {
        self.lock()
            .spans
            .iter()
            .filter(|s| s.name == name)
            .cloned()
            .collect()
    }
}

impl TelemetryReporter for RecordingReporter {
    fn start_span(&self, name: &'static str) -> ScopedSpan {
        let sink = self.inner.clone();
        ScopedSpan::new(name, tracing::Span::none(), move |record| {
            sink.lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .spans
                .push(record);
        })
    }

    fn increment_counter(&self, name: &'static str, labels: Labels<'_>) {
        *self
            .lock()
            .counters
            .entry(owned_key(name, labels))
            .or_insert(0) += 1;
    }

    fn record_histogram(&self, name: &'static str, value: f64, labels: Labels<'_>) {
        self.lock()
            .histograms
            .entry(owned_key(name, labels))
            .or_default()
            .push(value);
    }
}
