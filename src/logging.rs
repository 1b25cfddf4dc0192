//! Log setup: stdout carries the app list, so logs go to a daily file.

use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "appfeed=info";

/// Directory for log files.
pub fn log_dir() -> Result<PathBuf> {
  let data_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?;

  Ok(data_dir.join("appfeed").join("logs"))
}

/// Install the global subscriber. The returned guard flushes on drop and
/// must live until the process exits.
///
/// The filter comes from `APPFEED_LOG` (e.g. `appfeed=debug`).
pub fn init() -> Result<WorkerGuard> {
  let dir = log_dir()?;
  std::fs::create_dir_all(&dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let appender = tracing_appender::rolling::daily(&dir, "appfeed.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter =
    EnvFilter::try_from_env("APPFEED_LOG").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(writer).with_ansi(false))
    .try_init()
    .map_err(|e| eyre!("Failed to install log subscriber: {}", e))?;

  Ok(guard)
}
