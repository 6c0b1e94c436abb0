//! Tracing setup.
//!
//! Logs go to a file next to the database so the terminal UI is never drawn
//! over. Command-line runs also print warnings to stderr.

use color_eyre::{eyre::eyre, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Environment variable holding the log filter, e.g. `phonestock=debug`.
pub const LOG_ENV: &str = "PHONESTOCK_LOG";

const LOG_FILE: &str = "phonestock.log";

/// Install the global subscriber.
///
/// The returned guard flushes the log file when dropped; keep it alive for
/// the whole run.
pub fn init(log_dir: &Path, echo_to_stderr: bool) -> Result<WorkerGuard> {
  std::fs::create_dir_all(log_dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", log_dir.display(), e))?;

  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(
    log_dir, LOG_FILE,
  ));

  let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
  let file_layer = tracing_subscriber::fmt::layer()
    .with_writer(writer)
    .with_ansi(false)
    .with_filter(filter);

  let stderr_layer = echo_to_stderr.then(|| {
    tracing_subscriber::fmt::layer()
      .with_writer(std::io::stderr)
      .without_time()
      .with_target(false)
      .with_filter(LevelFilter::WARN)
  });

  tracing_subscriber::registry()
    .with(file_layer)
    .with(stderr_layer)
    .try_init()
    .map_err(|e| eyre!("Failed to install log subscriber: {}", e))?;

  Ok(guard)
}
