use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::error::{Result, SwapError};

/// Initializes console logging, plus daily-rolling JSON file logging when a
/// log directory is given. The returned guard must be kept alive for file
/// logs to flush.
pub fn init_logging(console_level: &str, log_dir: Option<&str>) -> Result<Option<WorkerGuard>> {
    let console_filter = EnvFilter::try_new(console_level).map_err(|e| {
        SwapError::Environment(format!("Invalid log level filter '{console_level}': {e}"))
    })?;
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_filter(console_filter);

    let registry = tracing_subscriber::registry().with(console_layer);

    match log_dir {
        Some(dir) => {
            let path = Path::new(dir);
            if !path.exists() {
                std::fs::create_dir_all(path)?;
            }
            let file_appender = rolling::daily(dir, "solswap.log");
            let (writer, guard) = tracing_appender::non_blocking(file_appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_span_events(FmtSpan::CLOSE)
                .json()
                .with_filter(EnvFilter::new("debug"));

            registry.with(file_layer).try_init().map_err(|e| {
                SwapError::Unknown(format!("Failed to initialize tracing subscriber: {e}"))
            })?;
            Ok(Some(guard))
        }
        None => {
            registry.try_init().map_err(|e| {
                SwapError::Unknown(format!("Failed to initialize tracing subscriber: {e}"))
            })?;
            Ok(None)
        }
    }
}
