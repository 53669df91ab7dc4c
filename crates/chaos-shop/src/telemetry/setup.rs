//! # Observability Setup
//!
//! Process-wide installation of the `tracing` subscriber and the Prometheus recorder. Both are
//! global, so the binary calls these once at startup; library code and tests never do.
//!
//! ## Log format
//!
//! The subscriber hides the module prefix (`with_target(false)`); entity and operation names
//! are carried as structured fields instead. `RUST_LOG` overrides the default filter:
//!
//! ```bash
//! RUST_LOG=info chaos-shop load               # one line per order / probe outcome
//! RUST_LOG=debug chaos-shop order 2:10        # actor requests and span closings too
//! RUST_LOG=chaos_shop::simulator=trace chaos-shop chaos
//! ```
//!
//! With `log_format = "json"` every event is a JSON object, ready for a log shipper.
//!
//! ## Metrics
//!
//! [`init_metrics_exporter`] installs `metrics-exporter-prometheus` with an HTTP listener, so
//! everything the [`MetricsReporter`](super::MetricsReporter) records is scrapeable at
//! `http://<addr>/metrics`.

use clap::ValueEnum;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "chaos_shop=info,actor_framework=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(String),
    #[error("failed to install Prometheus exporter on {addr}: {reason}")]
    Exporter { addr: SocketAddr, reason: String },
}

/// Installs the global `tracing` subscriber.
pub fn setup_tracing(format: LogFormat) -> Result<(), TelemetryError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false); // Don't show module paths - events carry operation fields instead

    let installed = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| TelemetryError::Subscriber(e.to_string()))
}

/// Installs the Prometheus recorder and its scrape endpoint. Must run inside a Tokio runtime.
pub fn init_metrics_exporter(addr: SocketAddr) -> Result<(), TelemetryError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| TelemetryError::Exporter {
            addr,
            reason: e.to_string(),
        })?;
    tracing::info!(%addr, "Prometheus metrics exporter started");
    Ok(())
}
