//! Outages, the facts observed about them, and the derived rollup.

use std::fmt;

use serde::{Deserialize, Serialize};

// ─── Dictionaries ────────────────────────────────────────────────────────────

/// A categorical dictionary mapping names to small integer ids.
///
/// All three categories share one get-or-create implementation in the store;
/// the category only selects the backing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
  RegionName,
  Cause,
  CrewStatus,
}

impl Category {
  pub const ALL: [Category; 3] =
    [Category::RegionName, Category::Cause, Category::CrewStatus];

  /// Name of the table holding this dictionary.
  pub fn table(self) -> &'static str {
    match self {
      Category::RegionName => "region_names",
      Category::Cause => "causes",
      Category::CrewStatus => "crew_statuses",
    }
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.table())
  }
}

/// One `{id, name}` dictionary entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
  pub id:   i64,
  pub name: String,
}

// ─── Outage ──────────────────────────────────────────────────────────────────

/// Static attributes of an outage, frozen at the first revision it appeared
/// in. Later revisions never update this row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outage {
  pub id:         i64,
  pub start_time: i64,
  pub latitude:   String,
  pub longitude:  String,
  pub region_id:  i64,
  /// JSON-encoded device list; `[]` when the feed omitted it.
  pub devices:    String,
}

// ─── Fact ────────────────────────────────────────────────────────────────────

/// Build the composite key of a fact row: `<captured_at>:<outage_id>`.
pub fn fact_key(captured_at: i64, outage_id: i64) -> String {
  format!("{captured_at}:{outage_id}")
}

/// The mutable state of an outage as observed in one revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutageFact {
  pub key:                          String,
  pub outage_id:                    i64,
  pub snapshot_id:                  i64,
  pub last_update_time:             Option<i64>,
  pub current_eta:                  Option<i64>,
  pub auto_eta:                     Option<i64>,
  pub estimated_customers_affected: Option<i64>,
  pub hazard_flag:                  i64,
  pub latitude:                     String,
  pub longitude:                    String,
  pub region_id:                    i64,
  pub cause_id:                     i64,
  pub crew_status_id:               i64,
}

// ─── Rollup ──────────────────────────────────────────────────────────────────

/// One row of the per-outage summary, recomputed from all facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupRow {
  pub outage_id:      i64,
  pub earliest:       i64,
  pub latest:         i64,
  /// Number of fact rows recorded for the outage.
  pub snapshot_count: i64,
  pub duration_hours: f64,
  /// The outage is absent from the most recent snapshot.
  pub probably_ended: bool,
  pub min_customers:  Option<i64>,
  pub max_customers:  Option<i64>,
  /// Smallest value across the outage's facts, not necessarily the latest.
  pub region:         String,
  pub latitude:       String,
  pub longitude:      String,
}

/// Counts produced by ingesting one revision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionSummary {
  pub snapshot_id: i64,
  pub records:     usize,
  pub new_outages: usize,
}
