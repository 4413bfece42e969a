//! Revisions of the tracked file and the snapshots recorded for them.
//!
//! A revision is what the history source hands us; a snapshot is the store's
//! record that a revision has been processed. Snapshot sequence ids are
//! assigned by the store in registration order and never renumbered.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One historical version of the tracked file, without its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionRef {
  /// Stable identifier of the revision (a commit hash for git).
  pub revision_id: String,
  /// When the revision was captured, with the offset it was recorded in.
  pub timestamp:   DateTime<FixedOffset>,
}

impl RevisionRef {
  pub fn new(revision_id: impl Into<String>, timestamp: DateTime<FixedOffset>) -> Self {
    Self { revision_id: revision_id.into(), timestamp }
  }

  /// Integer unix timestamp stored as the snapshot's `captured_at`.
  pub fn captured_at(&self) -> i64 { self.timestamp.timestamp() }

  /// Human-readable rendering used as the snapshot title,
  /// e.g. `2019-10-09 13:21:07-07:00`.
  pub fn title(&self) -> String {
    self.timestamp.format("%Y-%m-%d %H:%M:%S%:z").to_string()
  }
}

/// A revision that has been registered in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
  pub sequence_id: i64,
  pub revision_id: String,
  pub title:       String,
  pub captured_at: i64,
}
