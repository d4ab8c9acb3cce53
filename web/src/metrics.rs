//! Prometheus metrics for the promo service.
//!
//! # Exported Metrics
//!
//! - `rtny_promo_validations_total{outcome}` - validation requests by outcome
//!   (`valid`, `invalid_code`, `expired`, ...)
//! - `rtny_promo_redemptions_total{outcome}` - redemption requests by outcome
//! - `rtny_promo_errors_total{operation}` - requests that failed with an error
//! - `rtny_promo_redemption_writes_total{outcome}` - conditional usage
//!   increments issued by the `PostgreSQL` store

use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use thiserror::Error;

/// Errors from metrics setup.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to install the Prometheus exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Register metric descriptions.
///
/// Call once at startup, after the recorder is installed.
pub fn register_promo_metrics() {
    describe_counter!(
        "rtny_promo_validations_total",
        "Promo-code validation requests by outcome"
    );
    describe_counter!(
        "rtny_promo_redemptions_total",
        "Promo-code redemption requests by outcome"
    );
    describe_counter!(
        "rtny_promo_errors_total",
        "Promo requests that failed with a server or input error"
    );
    describe_counter!(
        "rtny_promo_redemption_writes_total",
        "Conditional usage increments by outcome (recorded, limit_reached)"
    );

    tracing::info!("Promo metrics registered");
}

/// Install the Prometheus exporter with its own HTTP listener on `addr`.
///
/// Must run inside a Tokio runtime.
///
/// # Errors
///
/// Returns [`MetricsError::Install`] if a recorder is already installed or
/// the listener cannot be bound.
pub fn install_exporter(addr: SocketAddr) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| MetricsError::Install(e.to_string()))?;

    register_promo_metrics();
    tracing::info!(%addr, "Metrics available at http://{addr}/metrics");
    Ok(())
}

/// Count one validation or redemption outcome.
pub(crate) fn record_outcome(operation: Operation, outcome: &'static str) {
    match operation {
        Operation::Validate => {
            metrics::counter!("rtny_promo_validations_total", "outcome" => outcome).increment(1);
        }
        Operation::Redeem => {
            metrics::counter!("rtny_promo_redemptions_total", "outcome" => outcome).increment(1);
        }
    }
}

/// Count one failed request.
pub(crate) fn record_error(operation: Operation) {
    metrics::counter!("rtny_promo_errors_total", "operation" => operation.as_str()).increment(1);
}

/// Promo endpoint being measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    Validate,
    Redeem,
}

impl Operation {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Redeem => "redeem",
        }
    }
}
