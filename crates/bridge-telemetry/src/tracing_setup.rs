//! Subscriber setup: `EnvFilter` plus pretty or JSON fmt layers for the
//! console and an optional log file.

use std::path::Path;

use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{LogLevel, TelemetryConfig, TelemetryError};

/// Subscriber described by a config, not yet installed.
pub(crate) struct Built<S> {
    pub subscriber: S,
    /// Flushes the log file writer on drop
    pub file_guard: Option<WorkerGuard>,
    pub level: Option<LogLevel>,
}

/// Install the global subscriber described by `config`.
pub(crate) fn init_tracing(
    config: &TelemetryConfig,
) -> Result<(Option<WorkerGuard>, Option<LogLevel>), TelemetryError> {
    let Built {
        subscriber,
        file_guard,
        level,
    } = build_subscriber(config)?;

    subscriber
        .try_init()
        .map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        filter = %config.filter_directive(),
        level = ?level,
        json = config.json_logs,
        log_file = ?config.log_file,
        "Telemetry initialized"
    );
    Ok((file_guard, level))
}

pub(crate) fn build_subscriber(
    config: &TelemetryConfig,
) -> Result<Built<impl Subscriber + Send + Sync + 'static>, TelemetryError> {
    let directive = config.filter_directive();
    let env_filter =
        EnvFilter::try_new(&directive).map_err(|e| TelemetryError::Filter(e.to_string()))?;
    let level = env_filter.max_level_hint().and_then(LogLevel::from_level_filter);

    let (file_writer, file_guard) = match &config.log_file {
        Some(path) => {
            let (writer, guard) = open_log_file(path)?;
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    // JSON output for containers/production
    let json_layer = (config.console_output && config.json_logs).then(|| {
        fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
    });

    // Pretty output for development
    let pretty_layer = (config.console_output && !config.json_logs).then(|| {
        fmt::layer()
            .with_target(true)
            .with_thread_names(true)
            .with_ansi(true)
    });

    let file_json_layer = file_writer
        .clone()
        .filter(|_| config.json_logs)
        .map(|writer| fmt::layer().json().with_target(true).with_writer(writer));

    let file_text_layer = file_writer
        .filter(|_| !config.json_logs)
        .map(|writer| {
            fmt::layer()
                .with_target(true)
                .with_thread_names(true)
                .with_ansi(false)
                .with_writer(writer)
        });

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .with(file_json_layer)
        .with(file_text_layer);

    Ok(Built {
        subscriber,
        file_guard,
        level,
    })
}

/// Appending, never-rotated file writer behind a background flush thread.
fn open_log_file(path: &Path) -> Result<(NonBlocking, WorkerGuard), TelemetryError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| TelemetryError::LogFile(format!("not a file path: {}", path.display())))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(directory)
        .map_err(|e| TelemetryError::LogFile(format!("{}: {e}", path.display())))?;

    Ok(tracing_appender::non_blocking(appender))
}
