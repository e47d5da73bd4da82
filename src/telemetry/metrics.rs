//! Prometheus metrics

use std::net::{Ipv4Addr, SocketAddr};

/// Counter of reconnection attempts started
pub const RECONNECT_ATTEMPTS: &str = "boomerang_reconnect_attempts_total";
/// Counter of successful reconnections
pub const RECONNECTS: &str = "boomerang_reconnects_total";
/// Counter of connections closed because the attempt budget ran out
pub const RECONNECT_EXHAUSTED: &str = "boomerang_reconnect_exhausted_total";
/// Gauge of the current backoff
pub const BACKOFF_MS: &str = "boomerang_backoff_ms";

/// Install the Prometheus exporter on `0.0.0.0:port`
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));

    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics exporter: {}", e))?;

    tracing::info!(%addr, "Prometheus metrics exporter listening");
    Ok(())
}

/// Record the start of a reconnection attempt
pub fn record_attempt() {
    ::metrics::counter!(RECONNECT_ATTEMPTS).increment(1);
}

/// Record a successful reconnection
pub fn record_success() {
    ::metrics::counter!(RECONNECTS).increment(1);
}

/// Record a connection given up after the last attempt
pub fn record_exhausted() {
    ::metrics::counter!(RECONNECT_EXHAUSTED).increment(1);
}

/// Publish the current backoff
pub fn set_backoff(millis: f64) {
    ::metrics::gauge!(BACKOFF_MS).set(millis);
}
