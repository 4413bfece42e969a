//! The `OutageStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `outage-store-sqlite`).
//! The ingestion pipeline depends on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use chrono::{DateTime, FixedOffset};

use crate::{
  outage::{Category, DictionaryEntry, Outage, OutageFact, RevisionSummary, RollupRow},
  record::Observation,
  snapshot::{RevisionRef, Snapshot},
};

/// Abstraction over an outage store backend.
///
/// Every write is idempotent: dictionaries, snapshots and outages are
/// get-or-create, facts are upserted by their composite key, and the rollup is
/// rebuilt from scratch.
pub trait OutageStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Dictionaries ──────────────────────────────────────────────────────

  /// Return the id for `name` in `category`, creating it on first sight.
  fn resolve(
    &self,
    category: Category,
    name: String,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  // ── Snapshots ─────────────────────────────────────────────────────────

  /// Revision id of the most recently registered snapshot, if any.
  fn latest_revision(
    &self,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;

  /// Register `revision` and return its sequence id. A revision that is
  /// already registered keeps its existing id.
  fn register_snapshot(
    &self,
    revision: RevisionRef,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  // ── Outages and facts ─────────────────────────────────────────────────

  /// Create the outage from `observation` unless it already exists.
  /// Returns `true` when a row was created.
  fn ensure_outage(
    &self,
    observation: Observation,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Upsert the fact for `observation` as seen at `captured_at`.
  fn record_fact(
    &self,
    observation: Observation,
    captured_at: DateTime<FixedOffset>,
    snapshot_id: i64,
  ) -> impl Future<Output = Result<OutageFact, Self::Error>> + Send + '_;

  /// Register the snapshot, outages and facts of one revision in a single
  /// transaction.
  fn ingest_revision(
    &self,
    revision: RevisionRef,
    observations: Vec<Observation>,
  ) -> impl Future<Output = Result<RevisionSummary, Self::Error>> + Send + '_;

  // ── Rollup ────────────────────────────────────────────────────────────

  /// Atomically replace the rollup with one recomputed from all facts.
  /// Returns the number of rollup rows.
  fn rebuild_rollup(&self) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  fn list_snapshots(
    &self,
  ) -> impl Future<Output = Result<Vec<Snapshot>, Self::Error>> + Send + '_;

  fn list_dictionary(
    &self,
    category: Category,
  ) -> impl Future<Output = Result<Vec<DictionaryEntry>, Self::Error>> + Send + '_;

  fn get_outage(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Outage>, Self::Error>> + Send + '_;

  fn list_outages(
    &self,
  ) -> impl Future<Output = Result<Vec<Outage>, Self::Error>> + Send + '_;

  /// All facts, or only those of `outage_id`, ordered by snapshot.
  fn list_facts(
    &self,
    outage_id: Option<i64>,
  ) -> impl Future<Output = Result<Vec<OutageFact>, Self::Error>> + Send + '_;

  fn rollup(&self) -> impl Future<Output = Result<Vec<RollupRow>, Self::Error>> + Send + '_;
}
