//! Logging configuration and initialization.
//!
//! The host application calls `init_logging` once at startup, either with an
//! explicit `LogConfig` or with `LogConfig::from_env()`. JSON output is the
//! default so the dashboard's log shipper can parse records; pretty output
//! is for local development.
//!
//! Environment variables (read by `from_env`):
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `PULSEKIT_LOG` | `info,pulsekit=debug` | Filter directives |
//! | `PULSEKIT_LOG_FORMAT` | `json` | `json` or `pretty` |
//! | `PULSEKIT_LOG_FILE` | stderr | Log file path |

use std::path::PathBuf;

use thiserror::Error;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

const ENV_FILTER: &str = "PULSEKIT_LOG";
const ENV_FORMAT: &str = "PULSEKIT_LOG_FORMAT";
const ENV_FILE: &str = "PULSEKIT_LOG_FILE";

/// Filter applied when `PULSEKIT_LOG` is unset: the crate's own spans at
/// debug, everything else at info.
pub const DEFAULT_FILTER: &str = "info,pulsekit=debug";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logging (default for production).
    #[default]
    Json,
    /// Human-readable pretty printing (for development).
    Pretty,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Filter directive, e.g. "info" or "pulsekit=debug".
    pub level: String,
    /// Optional file path for log output. If None, logs to stderr.
    pub output_path: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            level: DEFAULT_FILTER.to_string(),
            output_path: None,
        }
    }
}

impl LogConfig {
    /// Build the configuration from `PULSEKIT_LOG*` environment variables.
    /// Unset or unrecognized values fall back to the defaults.
    pub fn from_env() -> Self {
        let format = std::env::var(ENV_FORMAT)
            .ok()
            .and_then(|v| LogFormat::parse(&v))
            .unwrap_or_default();
        let level = std::env::var(ENV_FILTER)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());
        let output_path = std::env::var(ENV_FILE)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        Self {
            format,
            level,
            output_path,
        }
    }
}

/// Errors that can occur during logging initialization.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),
    #[error("Failed to open log file: {0}")]
    FileOpen(String),
    #[error("Subscriber already initialized")]
    AlreadyInitialized,
}

/// Initialize the global tracing subscriber.
///
/// Call once at application startup; a second call fails with
/// `AlreadyInitialized` instead of replacing the subscriber.
pub fn init_logging(config: &LogConfig) -> Result<(), LogError> {
    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| LogError::InvalidFilter(e.to_string()))?;

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> =
        match (&config.output_path, config.format) {
            (Some(path), format) => {
                let file = std::fs::File::create(path)
                    .map_err(|e| LogError::FileOpen(e.to_string()))?;
                let writer = std::sync::Mutex::new(file);
                match format {
                    LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
                    // ANSI escapes off: the file is for later inspection,
                    // not a terminal.
                    LogFormat::Pretty => fmt::layer()
                        .pretty()
                        .with_ansi(false)
                        .with_writer(writer)
                        .boxed(),
                }
            }
            (None, LogFormat::Json) => fmt::layer().json().boxed(),
            (None, LogFormat::Pretty) => fmt::layer().pretty().boxed(),
        };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init()
        .map_err(|_| LogError::AlreadyInitialized)
}
