//! The `HistorySource` trait.
//!
//! A history source enumerates the revisions of one tracked file and reads
//! the file's content at a given revision. The git implementation lives in
//! `outage-history`; tests use in-memory sources.

use std::future::Future;

use crate::snapshot::RevisionRef;

pub trait HistorySource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// List the revisions in which the tracked file changed, oldest first.
  ///
  /// With `since`, only revisions strictly after that revision are returned.
  fn list(
    &self,
    since: Option<String>,
  ) -> impl Future<Output = Result<Vec<RevisionRef>, Self::Error>> + Send + '_;

  /// Read the tracked file's content as of `revision`.
  fn read(
    &self,
    revision: RevisionRef,
  ) -> impl Future<Output = Result<Vec<u8>, Self::Error>> + Send + '_;
}
