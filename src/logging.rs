use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogRotation, LoggingConfig};

const DEFAULT_FILTER: &str = "info,farewellbot=debug";

/// Install the global subscriber: console plus a rotating log file.
///
/// The returned guard owns the background file writer. Keep it alive for the
/// life of the process; dropping it flushes whatever is still buffered.
pub fn init(config: &LoggingConfig) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&config.directory).with_context(|| {
        format!(
            "Failed to create log directory: {}",
            config.directory.display()
        )
    })?;

    let appender = RollingFileAppender::builder()
        .rotation(rotation(config.rotation))
        .filename_prefix(config.file_name.clone())
        .build(&config.directory)
        .context("Failed to create rolling log file")?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))?;

    Ok(guard)
}

fn rotation(rotation: LogRotation) -> Rotation {
    match rotation {
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Never => Rotation::NEVER,
    }
}
