use std::path::Path;

use rolling_file::{BasicRollingFileAppender, RollingConditionBasic};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info,hyper=warn,reqwest=warn";

/// Rotate the log file once it reaches 5 MiB.
const MAX_LOG_BYTES: u64 = 5 * 1024 * 1024;
const LOG_BACKUPS: usize = 3;

/// Install console and rotating-file logging.
///
/// `level` overrides `RUST_LOG`. The returned guard flushes the file writer
/// on drop and must be held for the life of the process.
pub fn init_logging(log_file: &Path, level: Option<&str>) -> Result<WorkerGuard, String> {
    let appender = BasicRollingFileAppender::new(
        log_file,
        RollingConditionBasic::new().max_size(MAX_LOG_BYTES),
        LOG_BACKUPS,
    )
    .map_err(|e| format!("cannot open log file {}: {e}", log_file.display()))?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let env_filter = match level {
        Some(level) => EnvFilter::try_new(level).map_err(|e| format!("invalid log level: {e}"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    };

    let console_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| e.to_string())?;

    tracing::info!(log_file = %log_file.display(), "Logging initialized");
    tracing::info!("bftracker version: {}", env!("CARGO_PKG_VERSION"));

    Ok(guard)
}
