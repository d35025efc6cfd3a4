use crate::error::ConfigError;
use crate::settings::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global `tracing` subscriber.
///
/// Log lines go to a daily rolling file under `config.directory` (at most
/// `config.max_files` are kept) and, when enabled, to stdout. `RUST_LOG` takes
/// precedence over the configured level.
///
/// The returned guard flushes the background writer when dropped, so the caller
/// must hold on to it for as long as the process runs.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard, ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| ConfigError::LoggingError(e.to_string()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(&config.file_prefix)
        .max_log_files(config.max_files.max(1))
        .build(&config.directory)
        .map_err(|e| ConfigError::LoggingError(e.to_string()))?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    // `timestamp | LEVEL | module: message`, without colour codes in the file.
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_timer(LocalTime::rfc_3339())
        .with_target(true);

    let stdout_layer = config
        .stdout
        .then(|| fmt::layer().with_timer(LocalTime::rfc_3339()).with_target(false));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| ConfigError::LoggingError(e.to_string()))?;

    tracing::debug!(directory = %config.directory.display(), "Logging initialised.");
    Ok(guard)
}
