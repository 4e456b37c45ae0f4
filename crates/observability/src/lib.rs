//! Tracing and logging (shared setup).

/// Initialize process-wide observability from the environment.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init_with(&ObservabilityConfig::from_env());
}

/// Initialize with an explicit configuration.
pub fn init_with(config: &ObservabilityConfig) {
    tracing::init_with(config);
}

/// Tracing configuration (filters, formatters).
pub mod tracing;

pub use tracing::{LogFormat, ObservabilityConfig};
