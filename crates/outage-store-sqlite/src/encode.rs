//! Mapping between SQLite rows and the domain types of `outage-core`.
//!
//! Each `*_COLUMNS` constant lists the columns in the order its row mapper
//! reads them, so queries and mappers cannot drift apart.

use outage_core::{
  outage::{DictionaryEntry, Outage, OutageFact, RollupRow},
  snapshot::Snapshot,
};
use rusqlite::Row;

// ─── Snapshot ────────────────────────────────────────────────────────────────

pub const SNAPSHOT_COLUMNS: &str = "id, hash, title, captured_at";

pub fn snapshot_from_row(row: &Row<'_>) -> rusqlite::Result<Snapshot> {
  Ok(Snapshot {
    sequence_id: row.get(0)?,
    revision_id: row.get(1)?,
    title:       row.get(2)?,
    captured_at: row.get(3)?,
  })
}

// ─── Dictionary ──────────────────────────────────────────────────────────────

pub fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<DictionaryEntry> {
  Ok(DictionaryEntry { id: row.get(0)?, name: row.get(1)? })
}

// ─── Outage ──────────────────────────────────────────────────────────────────

pub const OUTAGE_COLUMNS: &str =
  "id, start_time, latitude, longitude, region_name_id, devices";

pub fn outage_from_row(row: &Row<'_>) -> rusqlite::Result<Outage> {
  Ok(Outage {
    id:         row.get(0)?,
    start_time: row.get(1)?,
    latitude:   row.get(2)?,
    longitude:  row.get(3)?,
    region_id:  row.get(4)?,
    devices:    row.get(5)?,
  })
}

// ─── Fact ────────────────────────────────────────────────────────────────────

pub const FACT_COLUMNS: &str = "id, outage_id, snapshot_id, last_update_time, \
   current_etor, auto_etor, est_cust_affected, hazard_flag, latitude, longitude, \
   region_name_id, cause_id, crew_status_id";

pub fn fact_from_row(row: &Row<'_>) -> rusqlite::Result<OutageFact> {
  Ok(OutageFact {
    key:                          row.get(0)?,
    outage_id:                    row.get(1)?,
    snapshot_id:                  row.get(2)?,
    last_update_time:             row.get(3)?,
    current_eta:                  row.get(4)?,
    auto_eta:                     row.get(5)?,
    estimated_customers_affected: row.get(6)?,
    hazard_flag:                  row.get(7)?,
    latitude:                     row.get(8)?,
    longitude:                    row.get(9)?,
    region_id:                    row.get(10)?,
    cause_id:                     row.get(11)?,
    crew_status_id:               row.get(12)?,
  })
}

// ─── Rollup ──────────────────────────────────────────────────────────────────

pub const ROLLUP_COLUMNS: &str = "outage_id, earliest, latest, snapshot_count, \
   duration_hours, probably_ended, min_customers, max_customers, region, \
   latitude, longitude";

pub fn rollup_from_row(row: &Row<'_>) -> rusqlite::Result<RollupRow> {
  Ok(RollupRow {
    outage_id:      row.get(0)?,
    earliest:       row.get(1)?,
    latest:         row.get(2)?,
    snapshot_count: row.get(3)?,
    duration_hours: row.get(4)?,
    probably_ended: row.get(5)?,
    min_customers:  row.get(6)?,
    max_customers:  row.get(7)?,
    region:         row.get(8)?,
    latitude:       row.get(9)?,
    longitude:      row.get(10)?,
  })
}
