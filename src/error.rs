//! Error type shared by the feed client, decoder, record store and pager.

use thiserror::Error;

/// Failure modes of a pager operation.
///
/// Transport and decode errors abort the operation and reach the consumer.
/// Store errors are mostly absorbed by the pager (see `pager`).
#[derive(Debug, Error)]
pub enum SyncError {
  /// Network unreachable, non-2xx status or timeout.
  #[error("transport error: {0}")]
  Transport(String),

  /// The feed payload could not be parsed.
  #[error("decode error: {0}")]
  Decode(String),

  /// Persisting a record failed.
  #[error("store write error: {0}")]
  StoreWrite(String),

  /// Reading a page from the store failed.
  #[error("store read error: {0}")]
  StoreRead(String),
}

impl From<reqwest::Error> for SyncError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_timeout() {
      SyncError::Transport(format!("request timed out: {}", err))
    } else if let Some(status) = err.status() {
      SyncError::Transport(format!("HTTP {}", status))
    } else {
      SyncError::Transport(err.to_string())
    }
  }
}

impl From<serde_json::Error> for SyncError {
  fn from(err: serde_json::Error) -> Self {
    SyncError::Decode(err.to_string())
  }
}
