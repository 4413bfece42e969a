//! [`SqliteStore`] — the SQLite implementation of [`OutageStore`].

use std::path::Path;

use chrono::{DateTime, FixedOffset};
use rusqlite::OptionalExtension as _;

use outage_core::{
  outage::{Category, DictionaryEntry, Outage, OutageFact, RevisionSummary, RollupRow},
  record::Observation,
  snapshot::{RevisionRef, Snapshot},
  store::OutageStore,
};

use crate::{
  encode::{
    FACT_COLUMNS, OUTAGE_COLUMNS, ROLLUP_COLUMNS, SNAPSHOT_COLUMNS, entry_from_row,
    fact_from_row, outage_from_row, rollup_from_row, snapshot_from_row,
  },
  ops,
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An outage store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── OutageStore impl ────────────────────────────────────────────────────────

impl OutageStore for SqliteStore {
  type Error = Error;

  // ── Dictionaries ──────────────────────────────────────────────────────────

  async fn resolve(&self, category: Category, name: String) -> Result<i64> {
    let id = self
      .conn
      .call(move |conn| ops::resolve(conn, category, &name))
      .await?;
    Ok(id)
  }

  // ── Snapshots ─────────────────────────────────────────────────────────────

  async fn latest_revision(&self) -> Result<Option<String>> {
    Ok(self.conn.call(|conn| ops::latest_revision(conn)).await?)
  }

  async fn register_snapshot(&self, revision: RevisionRef) -> Result<i64> {
    Ok(
      self
        .conn
        .call(move |conn| ops::register_snapshot(conn, &revision))
        .await?,
    )
  }

  // ── Outages and facts ─────────────────────────────────────────────────────

  async fn ensure_outage(&self, observation: Observation) -> Result<bool> {
    Ok(
      self
        .conn
        .call(move |conn| ops::ensure_outage(conn, &observation))
        .await?,
    )
  }

  async fn record_fact(
    &self,
    observation: Observation,
    captured_at: DateTime<FixedOffset>,
    snapshot_id: i64,
  ) -> Result<OutageFact> {
    let captured_at = captured_at.timestamp();
    Ok(
      self
        .conn
        .call(move |conn| ops::upsert_fact(conn, &observation, captured_at, snapshot_id))
        .await?,
    )
  }

  async fn ingest_revision(
    &self,
    revision:     RevisionRef,
    observations: Vec<Observation>,
  ) -> Result<RevisionSummary> {
    Ok(
      self
        .conn
        .call(move |conn| ops::ingest_revision(conn, &revision, &observations))
        .await?,
    )
  }

  // ── Rollup ────────────────────────────────────────────────────────────────

  async fn rebuild_rollup(&self) -> Result<usize> {
    Ok(self.conn.call(|conn| ops::rebuild_rollup(conn)).await?)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn list_snapshots(&self) -> Result<Vec<Snapshot>> {
    Ok(
      self
        .conn
        .call(|conn| {
          let mut stmt =
            conn.prepare(&format!("SELECT {SNAPSHOT_COLUMNS} FROM snapshots ORDER BY id"))?;
          let rows = stmt
            .query_map([], snapshot_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?,
    )
  }

  async fn list_dictionary(&self, category: Category) -> Result<Vec<DictionaryEntry>> {
    Ok(
      self
        .conn
        .call(move |conn| {
          let mut stmt = conn
            .prepare(&format!("SELECT id, name FROM {} ORDER BY id", category.table()))?;
          let rows = stmt
            .query_map([], entry_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?,
    )
  }

  async fn get_outage(&self, id: i64) -> Result<Option<Outage>> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row(
                &format!("SELECT {OUTAGE_COLUMNS} FROM outages WHERE id = ?1"),
                rusqlite::params![id],
                outage_from_row,
              )
              .optional()?,
          )
        })
        .await?,
    )
  }

  async fn list_outages(&self) -> Result<Vec<Outage>> {
    Ok(
      self
        .conn
        .call(|conn| {
          let mut stmt =
            conn.prepare(&format!("SELECT {OUTAGE_COLUMNS} FROM outages ORDER BY id"))?;
          let rows = stmt
            .query_map([], outage_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?,
    )
  }

  async fn list_facts(&self, outage_id: Option<i64>) -> Result<Vec<OutageFact>> {
    Ok(
      self
        .conn
        .call(move |conn| {
          // `?1 IS NULL` lets one statement serve both the filtered and the
          // unfiltered listing.
          let mut stmt = conn.prepare(&format!(
            "SELECT {FACT_COLUMNS} FROM outage_snapshots
             WHERE ?1 IS NULL OR outage_id = ?1
             ORDER BY snapshot_id, outage_id"
          ))?;
          let rows = stmt
            .query_map(rusqlite::params![outage_id], fact_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?,
    )
  }

  async fn rollup(&self) -> Result<Vec<RollupRow>> {
    Ok(
      self
        .conn
        .call(|conn| {
          let mut stmt = conn.prepare(&format!(
            "SELECT {ROLLUP_COLUMNS} FROM outages_expanded ORDER BY outage_id"
          ))?;
          let rows = stmt
            .query_map([], rollup_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?,
    )
  }
}
