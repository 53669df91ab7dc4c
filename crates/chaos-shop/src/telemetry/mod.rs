//! # Telemetry Reporter
//!
//! The shop never talks to a metrics or tracing backend directly. It reports through the narrow
//! [`TelemetryReporter`] interface: scoped spans, counters and histograms.
//!
//! | Implementation | Used by | Where signals go |
//! |---|---|---|
//! | [`MetricsReporter`] | the binary | `metrics` facade (Prometheus exporter) + `tracing` events |
//! | [`RecordingReporter`] | tests | in memory, inspectable |
//!
//! ## Metric names
//!
//! - `shop_requests_total{operation}` (counter) and `shop_request_duration_seconds{operation,status}`
//!   (histogram) for every boundary call
//! - `orders_total{status}` (counter), `order_duration_seconds{status}` (histogram)
//! - `workload_scenarios_total{operation,scenario,outcome}` (counter),
//!   `workload_delay_seconds{operation,scenario}` (histogram)
//! - `span_duration_seconds{span}` (histogram, [`MetricsReporter`] only)
//!
//! ## Scoped spans
//!
//! [`ScopedSpan`] closes itself in `Drop`, so a span is recorded on every exit path: normal
//! return, `?` propagation, or the owning future being dropped mid-flight.

mod metrics_reporter;
mod recording;
mod setup;

pub use metrics_reporter::MetricsReporter;
pub use recording::RecordingReporter;
pub use setup::{init_metrics_exporter, setup_tracing, LogFormat, TelemetryError};

use std::fmt::{self, Debug, Display};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Label pairs attached to a counter or histogram sample.
pub type Labels<'a> = &'a [(&'static str, String)];

/// Reporter shared by every component of one shop.
pub type SharedReporter = Arc<dyn TelemetryReporter>;

/// Narrow interface through which the shop emits all of its signals.
pub trait TelemetryReporter: Send + Sync + Debug {
    /// Opens a span that closes when the returned guard is dropped.
    fn start_span(&self, name: &'static str) -> ScopedSpan;

    fn increment_counter(&self, name: &'static str, labels: Labels<'_>);

    fn record_histogram(&self, name: &'static str, value: f64, labels: Labels<'_>);
}

/// Value of a span attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Str(s) => f.write_str(s),
            AttributeValue::Int(i) => write!(f, "{i}"),
            AttributeValue::Float(x) => write!(f, "{x}"),
            AttributeValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Str(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Str(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<u32> for AttributeValue {
    fn from(value: u32) -> Self {
        AttributeValue::Int(i64::from(value))
    }
}

impl From<u64> for AttributeValue {
    fn from(value: u64) -> Self {
        AttributeValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<usize> for AttributeValue {
    fn from(value: usize) -> Self {
        AttributeValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

/// What a closed span looked like.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanRecord {
    pub name: &'static str,
    pub duration: Duration,
    pub attributes: Vec<(&'static str, AttributeValue)>,
    pub error: bool,
}

impl SpanRecord {
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }
}

type CloseFn = Box<dyn FnOnce(SpanRecord) + Send>;

/// Guard for an open span. Dropping it closes the span and hands a [`SpanRecord`] to the
/// reporter that opened it.
pub struct ScopedSpan {
    name: &'static str,
    started: Instant,
    attributes: Vec<(&'static str, AttributeValue)>,
    error: bool,
    span: tracing::Span,
    on_close: Option<CloseFn>,
}

impl ScopedSpan {
    pub fn new(
        name: &'static str,
        span: tracing::Span,
        on_close: impl FnOnce(SpanRecord) + Send + 'static,
    ) -> Self {
        Self {
            name,
            started: Instant::now(),
            attributes: Vec::new(),
            error: false,
            span,
            on_close: Some(Box::new(on_close)),
        }
    }

    /// A span that records nothing.
    pub fn detached(name: &'static str) -> Self {
        Self {
            name,
            started: Instant::now(),
            attributes: Vec::new(),
            error: false,
            span: tracing::Span::none(),
            on_close: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Sets `key`, replacing any earlier value.
    pub fn set_attribute(&mut self, key: &'static str, value: impl Into<AttributeValue>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn mark_error(&mut self) {
        self.error = true;
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// The `tracing` span to instrument the scoped work with, so nested log lines carry it.
    pub fn tracing_span(&self) -> &tracing::Span {
        &self.span
    }
}

impl Debug for ScopedSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedSpan")
            .field("name", &self.name)
            .field("attributes", &self.attributes)
            .field("error", &self.error)
            .finish()
    }
}

impl Drop for ScopedSpan {
    fn drop(&mut self) {
        if let Some(on_close) = self.on_close.take() {
            on_close(SpanRecord {
                name: self.name,
                duration: self.started.elapsed(),
                attributes: std::mem::take(&mut self.attributes),
                error: self.error,
            });
        }
    }
}
