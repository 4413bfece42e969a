//! Error type for `outage-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] outage_core::Error),

  #[error("database error: {0}")]
  Database(#[source] tokio_rusqlite::Error),
}

/// Core errors raised inside a connection call travel back boxed in
/// [`tokio_rusqlite::Error::Other`]; unwrap them so callers can match on the
/// record error rather than an opaque database failure.
impl From<tokio_rusqlite::Error> for Error {
  fn from(err: tokio_rusqlite::Error) -> Self {
    match err {
      tokio_rusqlite::Error::Other(inner) => match inner.downcast::<outage_core::Error>() {
        Ok(core) => Error::Core(*core),
        Err(inner) => Error::Database(tokio_rusqlite::Error::Other(inner)),
      },
      other => Error::Database(other),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
