//! Error types for `outage-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A required field was missing, null, or could not be coerced.
  #[error("malformed record: field {field:?} {reason}")]
  MalformedRecord { field: &'static str, reason: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub(crate) fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
    Self::MalformedRecord { field, reason: reason.into() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
