//! Error types for `outage-history`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to run git: {0}")]
  Io(#[from] std::io::Error),

  #[error("`git {command}` failed: {stderr}")]
  Git { command: String, stderr: String },

  #[error("unexpected git log line: {0:?}")]
  LogLine(String),

  #[error("invalid commit timestamp {value:?}: {source}")]
  Timestamp {
    value:  String,
    #[source]
    source: chrono::ParseError,
  },

  #[error("feed is not a JSON array of objects: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
