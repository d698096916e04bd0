// crates/enterprise-contract-controller/src/telemetry.rs
// ============================================================================
// Module: Telemetry
// Description: tracing subscriber setup for the controller process.
// Purpose: Emit structured logs in text or JSON with env-overridable filtering.
// Dependencies: tracing-subscriber, crate::config
// ============================================================================

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LogFormat;
use crate::config::LoggingConfig;

/// Telemetry setup errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TelemetryError {
    /// The filter directive does not parse.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// A global subscriber is already installed.
    #[error("tracing init failed: {0}")]
    Init(String),
}

/// Builds the event filter; a valid `RUST_LOG` overrides the configured filter.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when the configured directive is invalid.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|err| TelemetryError::Filter(err.to_string()))
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid or a subscriber is
/// already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };
    result.map_err(|err| TelemetryError::Init(err.to_string()))
}
