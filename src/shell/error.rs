//! Shell worker errors.

use thiserror::Error;

/// Errors raised by the shell worker and its collaborators.
#[derive(Debug, Error)]
pub enum ShellError {
  /// The network request could not be completed.
  #[error("Network request for {url} failed: {reason}")]
  Network { url: String, reason: String },

  /// A manifest resource could not be fetched, so nothing was installed.
  #[error("Install of {generation} failed on {url}: {reason}")]
  Install {
    generation: String,
    url: String,
    reason: String,
  },

  /// The generation never finished installing, so it cannot take over.
  #[error("{0} is not fully installed; run install first")]
  NotInstalled(String),

  /// Reading or writing the cache failed.
  #[error("Cache error: {0}")]
  Cache(String),

  /// A push payload could not be decoded.
  #[error("Invalid push payload: {0}")]
  Payload(String),

  /// A configured or requested URL is not valid.
  #[error("Invalid URL '{url}': {reason}")]
  Url { url: String, reason: String },
}

impl From<rusqlite::Error> for ShellError {
  fn from(e: rusqlite::Error) -> Self {
    ShellError::Cache(e.to_string())
  }
}
