//! Level-numbered log entry point for engine-side messages.
//!
//! The engine reports its own log lines as (level, identifier, message);
//! they are forwarded into `tracing` with the identifier as a field.

use crate::LogLevel;

/// Emit one engine log line at `level`.
pub fn log(level: LogLevel, identifier: &str, message: &str) {
    match level {
        LogLevel::Error => tracing::error!(target: "engine", identifier, "{message}"),
        LogLevel::Warn => tracing::warn!(target: "engine", identifier, "{message}"),
        LogLevel::Info => tracing::info!(target: "engine", identifier, "{message}"),
        LogLevel::Debug => tracing::debug!(target: "engine", identifier, "{message}"),
        LogLevel::Trace => tracing::trace!(target: "engine", identifier, "{message}"),
    }
}

/// Like [`log`], for levels arriving as raw numbers. Unknown levels log at
/// `Info`.
pub fn log_raw(level: u32, identifier: &str, message: &str) {
    log(LogLevel::from_raw(level).unwrap_or_default(), identifier, message);
}
