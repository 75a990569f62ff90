//! Prometheus metrics for the channel client.
//!
//! All metrics follow the naming convention: `channel_client_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // WIRE TRAFFIC
    // =========================================================================

    /// Messages handed to the transport, by wire message kind
    pub static ref MESSAGES_SENT: CounterVec = CounterVec::new(
        Opts::new("channel_client_messages_sent_total", "Messages sent to the broker"),
        &["kind"]
    ).expect("metric creation failed");

    /// Messages decoded from the transport, by wire message kind
    pub static ref MESSAGES_RECEIVED: CounterVec = CounterVec::new(
        Opts::new("channel_client_messages_received_total", "Messages received from the broker"),
        &["kind"]
    ).expect("metric creation failed");

    /// Keepalive probes written
    pub static ref KEEPALIVE_PINGS: Counter = Counter::new(
        "channel_client_keepalive_pings_total",
        "Zero-length keepalive payloads sent"
    ).expect("metric creation failed");

    // =========================================================================
    // CONNECTION LIFECYCLE
    // =========================================================================

    /// Transport connect attempts (initial and retries)
    pub static ref CONNECT_ATTEMPTS: Counter = Counter::new(
        "channel_client_connect_attempts_total",
        "Transport connect attempts"
    ).expect("metric creation failed");

    /// Reconnect timers armed after a close
    pub static ref RECONNECTS: Counter = Counter::new(
        "channel_client_reconnects_total",
        "Reconnect cycles started after the connection closed"
    ).expect("metric creation failed");

    /// 1 while the broker connection is ready, 0 otherwise
    pub static ref CONNECTED: Gauge = Gauge::new(
        "channel_client_connected",
        "Whether the broker connection is currently established"
    ).expect("metric creation failed");

    // =========================================================================
    // DISPATCH
    // =========================================================================

    /// Inbound dispatch faults by fault type
    pub static ref DISPATCH_FAULTS: CounterVec = CounterVec::new(
        Opts::new("channel_client_dispatch_faults_total", "Inbound messages that could not be dispatched"),
        &["fault"]
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Fails with `TelemetryError::MetricsInit` if called more than once.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(MESSAGES_SENT.clone()),
        Box::new(MESSAGES_RECEIVED.clone()),
        Box::new(KEEPALIVE_PINGS.clone()),
        Box::new(CONNECT_ATTEMPTS.clone()),
        Box::new(RECONNECTS.clone()),
        Box::new(CONNECTED.clone()),
        Box::new(DISPATCH_FAULTS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
