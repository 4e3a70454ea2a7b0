//! # Bridge Telemetry
//!
//! Structured logging for the glide bridge.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bridge_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env()).expect("Failed to init telemetry");
//!     // Bridge logs are now emitted
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `glide-bridge` | Service name in logs |
//! | `BRIDGE_LOG_LEVEL` / `RUST_LOG` | `info` | Level (`error`..`trace`, `0`..`4`) or filter expression |
//! | `BRIDGE_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `BRIDGE_JSON_LOGS` | `false` (`true` in containers) | JSON formatted logs |
//! | `BRIDGE_LOG_FILE` | unset | Also append logs to this file |

#![allow(missing_docs)]

mod config;
mod logging;
mod tracing_setup;

pub use config::{LogLevel, TelemetryConfig};
pub use logging::{log, log_raw};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Global subscriber already installed: {0}")]
    AlreadyInitialized(String),

    #[error("Cannot open log file: {0}")]
    LogFile(String),
}

/// Install the global tracing subscriber.
///
/// Returns a guard to hold for the lifetime of the application; it also
/// reports the level that was actually applied. Fails if a subscriber is
/// already installed or the log file cannot be opened.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let (file_guard, level) = tracing_setup::init_tracing(&config)?;
    Ok(TelemetryGuard {
        service_name: config.service_name,
        level,
        _file_guard: file_guard,
    })
}

/// Guard that keeps telemetry active.
///
/// Dropping it flushes and stops the log file writer.
pub struct TelemetryGuard {
    service_name: String,
    level: Option<LogLevel>,
    _file_guard: Option<WorkerGuard>,
}

impl TelemetryGuard {
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Most verbose level the installed filter lets through, `None` if
    /// logging is off.
    pub fn level(&self) -> Option<LogLevel> {
        self.level
    }
}

impl std::fmt::Debug for TelemetryGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryGuard")
            .field("service_name", &self.service_name)
            .field("level", &self.level)
            .field("log_file", &self._file_guard.is_some())
            .finish()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry...");
    }
}
