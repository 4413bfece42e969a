//! Error type for `outage-ingest`.

use std::path::PathBuf;

use thiserror::Error;

use crate::settings::STORE_EXTENSION;

#[derive(Debug, Error)]
pub enum Error {
  #[error("store path {0:?} must end with `.{STORE_EXTENSION}`")]
  InvalidStorePath(PathBuf),

  #[error("configuration error: {0}")]
  Config(#[from] config::ConfigError),

  #[error("history error: {0}")]
  History(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("revision {revision}: {source}")]
  Decode {
    revision: String,
    #[source]
    source:   outage_history::Error,
  },

  #[error("revision {revision}: {source}")]
  Record {
    revision: String,
    #[source]
    source:   outage_core::Error,
  },
}

impl Error {
  pub(crate) fn store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(err))
  }

  pub(crate) fn history(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::History(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
