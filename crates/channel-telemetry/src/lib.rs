//! # Channel Telemetry
//!
//! Logging and metrics bootstrap for processes embedding the channel client.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use channel_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     init_telemetry(&TelemetryConfig::from_env()).expect("Failed to init telemetry");
//!     // Client code here; logs and metrics are now being collected
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CHANNEL_SERVICE_NAME` | `channel-client` | Service name in logs |
//! | `CHANNEL_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `CHANNEL_JSON_LOGS` | `false` | JSON formatted logs |
//! | `CHANNEL_CONSOLE_OUTPUT` | `true` | Emit logs to stdout |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, CONNECTED, CONNECT_ATTEMPTS, DISPATCH_FAULTS,
    KEEPALIVE_PINGS, MESSAGES_RECEIVED, MESSAGES_SENT, RECONNECTS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Initialize logging and register metrics.
///
/// Metrics registration failures are logged and ignored so that a second
/// call in the same process only fails on the logging side.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    init_logging(config)?;
    if let Err(e) = register_metrics() {
        tracing::warn!(error = %e, "Metrics already registered");
    }
    Ok(())
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
