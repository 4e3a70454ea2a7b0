//! Telemetry configuration from environment variables.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;

/// Severity levels, numbered as the engine's logger expects them.
#[repr(u32)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    #[default]
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Error),
            1 => Some(Self::Warn),
            2 => Some(Self::Info),
            3 => Some(Self::Debug),
            4 => Some(Self::Trace),
            _ => None,
        }
    }

    /// Most verbose level a filter lets through. `None` for `OFF`.
    pub fn from_level_filter(filter: LevelFilter) -> Option<Self> {
        let level = filter.into_level()?;
        Some(if level == tracing::Level::ERROR {
            Self::Error
        } else if level == tracing::Level::WARN {
            Self::Warn
        } else if level == tracing::Level::INFO {
            Self::Info
        } else if level == tracing::Level::DEBUG {
            Self::Debug
        } else {
            Self::Trace
        })
    }

    /// `EnvFilter` directive for this level.
    pub const fn directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.directive())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" | "0" => Ok(Self::Error),
            "warn" | "warning" | "1" => Ok(Self::Warn),
            "info" | "2" => Ok(Self::Info),
            "debug" | "3" => Ok(Self::Debug),
            "trace" | "4" => Ok(Self::Trace),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

/// Configuration for bridge logging.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Filter directive (a level or a full `EnvFilter` expression)
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Also append logs to this file (created if missing)
    pub log_file: Option<PathBuf>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "glide-bridge".to_string(),
            log_level: LogLevel::default().directive().to_string(),
            console_output: true,
            json_logs: false,
            log_file: None,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OTEL_SERVICE_NAME`: Service name (default: glide-bridge)
    /// - `BRIDGE_LOG_LEVEL` or `RUST_LOG`: Filter (default: info)
    /// - `BRIDGE_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `BRIDGE_JSON_LOGS`: Enable JSON logs (default: false, true in containers)
    /// - `BRIDGE_LOG_FILE`: Path of a log file (default: none)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("OTEL_SERVICE_NAME")
                .unwrap_or_else(|_| "glide-bridge".to_string()),

            log_level: env::var("BRIDGE_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| LogLevel::default().directive().to_string()),

            console_output: env::var("BRIDGE_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v, true))
                .unwrap_or(true),

            json_logs: env::var("BRIDGE_JSON_LOGS")
                .map(|v| parse_flag(&v, false))
                .unwrap_or(is_container),

            log_file: env::var_os("BRIDGE_LOG_FILE")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.log_level = level.directive().to_string();
        self
    }

    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Numeric levels ("0".."4") become their directive; anything else is
    /// passed through as an `EnvFilter` expression.
    pub fn filter_directive(&self) -> String {
        match self.log_level.trim().parse::<u32>().ok().and_then(LogLevel::from_raw) {
            Some(level) => level.directive().to_string(),
            None => self.log_level.clone(),
        }
    }
}

fn parse_flag(value: &str, default: bool) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => true,
        "false" | "0" | "no" => false,
        _ => default,
    }
}
