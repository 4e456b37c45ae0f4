//! Tracing/logging initialization.
//!
//! Filtering comes from `RUST_LOG` (falling back to the configured default);
//! the output format from `FARMLINK_LOG_FORMAT` (`json` or `pretty`).

use core::str::FromStr;

use tracing_subscriber::EnvFilter;

pub const LOG_FORMAT_VAR: &str = "FARMLINK_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable multi-line output for local runs.
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(format!("unknown log format '{other}' (expected json or pretty)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    pub format: LogFormat,
    /// Filter directive used when `RUST_LOG` is unset or invalid.
    pub default_filter: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            default_filter: "info".to_string(),
        }
    }
}

impl ObservabilityConfig {
    /// Read `FARMLINK_LOG_FORMAT`; unknown values fall back to JSON.
    pub fn from_env() -> Self {
        let format = std::env::var(LOG_FORMAT_VAR)
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default();
        Self {
            format,
            ..Self::default()
        }
    }
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init_with(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime);

    let _ = match config.format {
        LogFormat::Json => builder.json().with_target(false).try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
}
