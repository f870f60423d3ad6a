//! Tracing and logging setup shared by registry consumers.

/// Initialize process-wide logging from the environment.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(&config::ObservabilityConfig::from_env());
}

/// Initialize process-wide logging from an explicit configuration.
pub fn init_with(config: &config::ObservabilityConfig) {
    tracing::init(config);
}

/// Logging configuration (filter, output format).
pub mod config;

/// Subscriber installation.
pub mod tracing;

pub use config::{LogFormat, ObservabilityConfig};
