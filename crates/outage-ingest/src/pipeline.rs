//! The ingestion run: resume, record each pending revision, rebuild the
//! rollup.

use outage_core::{
  history::HistorySource,
  record::Observation,
  snapshot::RevisionRef,
  store::OutageStore,
};
use serde::Serialize;

use crate::{Error, Result};

/// Revisions the store has not seen yet.
#[derive(Debug, Clone)]
pub struct Pending {
  /// Newest revision already recorded, if any; the listing starts after it.
  pub since:     Option<String>,
  /// Oldest first.
  pub revisions: Vec<RevisionRef>,
}

/// What one run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
  pub resumed_from: Option<String>,
  pub revisions:    usize,
  pub records:      usize,
  pub new_outages:  usize,
  pub rollup_rows:  usize,
}

/// Drives one ingestion run over a store and a history source.
///
/// Revisions are processed strictly in listing order: snapshot sequence ids
/// are assigned as they are registered, so order is what makes them a
/// chronological index.
pub struct Ingestor<'a, S, H> {
  store:          &'a S,
  history:        &'a H,
  progress_every: usize,
}

impl<'a, S, H> Ingestor<'a, S, H>
where
  S: OutageStore,
  H: HistorySource,
{
  pub fn new(store: &'a S, history: &'a H) -> Self {
    Self { store, history, progress_every: 10 }
  }

  /// Log progress every `n` revisions; `0` turns it off.
  pub fn progress_every(mut self, n: usize) -> Self {
    self.progress_every = n;
    self
  }

  /// Work out which revisions still need ingesting.
  ///
  /// This is derived from the store on every call, never persisted: the
  /// newest registered snapshot is the cursor.
  pub async fn pending_revisions(&self) -> Result<Pending> {
    let since = self.store.latest_revision().await.map_err(Error::store)?;
    let revisions = self
      .history
      .list(since.clone())
      .await
      .map_err(Error::history)?;
    Ok(Pending { since, revisions })
  }

  /// Ingest every pending revision, then rebuild the rollup.
  ///
  /// The first failing revision aborts the run. Its writes are rolled back;
  /// revisions before it stay recorded and the next run resumes after them.
  pub async fn run(&self) -> Result<RunSummary> {
    let Pending { since, revisions } = self.pending_revisions().await?;
    tracing::info!(
      since = since.as_deref().unwrap_or("<start>"),
      pending = revisions.len(),
      "ingesting revisions"
    );

    let mut summary = RunSummary { resumed_from: since, ..RunSummary::default() };

    for revision in revisions {
      let observations = self.observe(&revision).await?;
      if observations.is_empty() {
        tracing::warn!(revision = %revision.revision_id, "revision has no outages");
      }

      let revision_id = revision.revision_id.clone();
      let recorded = self
        .store
        .ingest_revision(revision, observations)
        .await
        .map_err(Error::store)?;
      tracing::debug!(
        revision = %revision_id,
        snapshot = recorded.snapshot_id,
        records = recorded.records,
        new_outages = recorded.new_outages,
        "recorded revision"
      );

      summary.revisions += 1;
      summary.records += recorded.records;
      summary.new_outages += recorded.new_outages;

      if self.progress_every > 0 && summary.revisions % self.progress_every == 0 {
        tracing::info!(processed = summary.revisions, "progress");
      }
    }

    summary.rollup_rows = self.store.rebuild_rollup().await.map_err(Error::store)?;
    Ok(summary)
  }

  /// Read, decode and coerce one revision.
  async fn observe(&self, revision: &RevisionRef) -> Result<Vec<Observation>> {
    let bytes = self
      .history
      .read(revision.clone())
      .await
      .map_err(Error::history)?;

    let records = outage_history::decode(&bytes).map_err(|source| Error::Decode {
      revision: revision.revision_id.clone(),
      source,
    })?;

    records
      .iter()
      .map(Observation::try_from)
      .collect::<Result<Vec<_>, _>>()
      .map_err(|source| Error::Record {
        revision: revision.revision_id.clone(),
        source,
      })
  }
}

#[cfg(test)]
mod tests {
  use std::{io, sync::Mutex};

  use chrono::{FixedOffset, TimeZone};
  use outage_store_sqlite::SqliteStore;
  use serde_json::{Value, json};

  use super::*;

  /// An in-memory history that records every `since` it is asked for.
  struct MemoryHistory {
    revisions:    Vec<(RevisionRef, Vec<u8>)>,
    requests:     Mutex<Vec<Option<String>>>,
    /// Return the whole history regardless of `since`, as if the cursor had
    /// been lost.
    ignore_since: bool,
  }

  impl MemoryHistory {
    fn new(revisions: Vec<(RevisionRef, Vec<u8>)>) -> Self {
      Self { revisions, requests: Mutex::new(Vec::new()), ignore_since: false }
    }

    fn requests(&self) -> Vec<Option<String>> { self.requests.lock().unwrap().clone() }
  }

  impl HistorySource for MemoryHistory {
    type Error = io::Error;

    async fn list(&self, since: Option<String>) -> io::Result<Vec<RevisionRef>> {
      self.requests.lock().unwrap().push(since.clone());
      let all = self.revisions.iter().map(|(r, _)| r.clone());
      match since {
        Some(since) if !self.ignore_since => {
          let pos = self
            .revisions
            .iter()
            .position(|(r, _)| r.revision_id == since)
            .ok_or_else(|| io::Error::other(format!("unknown revision {since}")))?;
          Ok(all.skip(pos + 1).collect())
        }
        _ => Ok(all.collect()),
      }
    }

    async fn read(&self, revision: RevisionRef) -> io::Result<Vec<u8>> {
      self
        .revisions
        .iter()
        .find(|(r, _)| r.revision_id == revision.revision_id)
        .map(|(_, bytes)| bytes.clone())
        .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }
  }

  fn outage(number: i64, customers: Value, region: &str) -> Value {
    json!({
      "outageNumber": number.to_string(),
      "outageStartTime": "1569990000",
      "latitude": "38.44",
      "longitude": "-122.71",
      "regionName": region,
      "cause": "Under Investigation",
      "crewCurrentStatus": "Crew Dispatched",
      "lastUpdateTime": 1570000000,
      "estCustAffected": customers,
      "hazardFlag": 0
    })
  }

  fn revision(id: &str, secs: i64, outages: Vec<Value>) -> (RevisionRef, Vec<u8>) {
    let ts = FixedOffset::west_opt(7 * 3600)
      .unwrap()
      .timestamp_opt(secs, 0)
      .unwrap();
    let bytes = serde_json::to_vec(&Value::Array(outages)).unwrap();
    (RevisionRef::new(id, ts), bytes)
  }

  fn history() -> Vec<(RevisionRef, Vec<u8>)> {
    vec![
      revision("r1", 1000, vec![outage(1001, json!("50"), "Sonoma")]),
      revision("r2", 5000, vec![
        outage(1001, json!(80), "Marin"),
        outage(2002, json!(0), "Napa"),
      ]),
      revision("r3", 9000, vec![outage(2002, json!(12), "Napa")]),
    ]
  }

  async fn store() -> SqliteStore { SqliteStore::open_in_memory().await.unwrap() }

  #[tokio::test]
  async fn first_run_ingests_full_history() {
    let s = store().await;
    let h = MemoryHistory::new(history());

    let summary = Ingestor::new(&s, &h).run().await.unwrap();
    assert_eq!(summary, RunSummary {
      resumed_from: None,
      revisions:    3,
      records:      4,
      new_outages:  2,
      rollup_rows:  2,
    });
    assert_eq!(h.requests(), vec![None]);

    let rollup = s.rollup().await.unwrap();
    let first = &rollup[0];
    assert_eq!((first.outage_id, first.earliest, first.latest), (1001, 1000, 5000));
    assert!((first.duration_hours - 1.11).abs() < 1e-9);
    assert_eq!((first.min_customers, first.max_customers), (Some(50), Some(80)));
    assert!(first.probably_ended);

    let second = &rollup[1];
    assert_eq!(second.outage_id, 2002);
    assert_eq!((second.min_customers, second.max_customers), (Some(12), Some(12)));
    assert!(!second.probably_ended);
  }

  #[tokio::test]
  async fn second_run_resumes_after_last_revision() {
    let s = store().await;
    let mut revisions = history();
    let last = revisions.pop().unwrap();

    let h = MemoryHistory::new(revisions.clone());
    Ingestor::new(&s, &h).run().await.unwrap();
    let before = s.list_snapshots().await.unwrap();

    revisions.push(last);
    let h = MemoryHistory::new(revisions);
    let summary = Ingestor::new(&s, &h).run().await.unwrap();

    assert_eq!(h.requests(), vec![Some("r2".to_owned())]);
    assert_eq!(summary.resumed_from.as_deref(), Some("r2"));
    assert_eq!(summary.revisions, 1);

    let after = s.list_snapshots().await.unwrap();
    assert_eq!(after.len(), 3);
    assert_eq!(&after[..2], &before[..]);
    assert_eq!(after[2].revision_id, "r3");
  }

  #[tokio::test]
  async fn nothing_pending_still_rebuilds_rollup() {
    let s = store().await;
    let h = MemoryHistory::new(history());
    Ingestor::new(&s, &h).run().await.unwrap();

    let summary = Ingestor::new(&s, &h).run().await.unwrap();
    assert_eq!(summary.revisions, 0);
    assert_eq!(summary.rollup_rows, 2);
  }

  #[tokio::test]
  async fn rerunning_overlapping_history_is_idempotent() {
    let s = store().await;
    let mut h = MemoryHistory::new(history());
    h.ignore_since = true;

    Ingestor::new(&s, &h).run().await.unwrap();
    let snapshots = s.list_snapshots().await.unwrap();
    let outages = s.list_outages().await.unwrap();
    let facts = s.list_facts(None).await.unwrap();
    let rollup = s.rollup().await.unwrap();

    let summary = Ingestor::new(&s, &h).run().await.unwrap();
    assert_eq!(summary.revisions, 3);
    assert_eq!(summary.new_outages, 0);

    assert_eq!(s.list_snapshots().await.unwrap(), snapshots);
    assert_eq!(s.list_outages().await.unwrap(), outages);
    assert_eq!(s.list_facts(None).await.unwrap(), facts);
    assert_eq!(s.rollup().await.unwrap(), rollup);
  }

  #[tokio::test]
  async fn outage_keeps_first_seen_region() {
    let s = store().await;
    let h = MemoryHistory::new(history());
    Ingestor::new(&s, &h).run().await.unwrap();

    let outage = s.get_outage(1001).await.unwrap().unwrap();
    let sonoma = s
      .resolve(outage_core::outage::Category::RegionName, "Sonoma".into())
      .await
      .unwrap();
    assert_eq!(outage.region_id, sonoma);

    // The rollup picks the smallest region name across facts instead.
    assert_eq!(s.rollup().await.unwrap()[0].region, "Marin");
  }

  #[tokio::test]
  async fn zero_customers_are_recorded_as_null() {
    let s = store().await;
    let h = MemoryHistory::new(history());
    Ingestor::new(&s, &h).run().await.unwrap();

    let facts = s.list_facts(Some(2002)).await.unwrap();
    assert_eq!(facts.len(), 2);
    assert_eq!(facts[0].estimated_customers_affected, None);
    assert_eq!(facts[1].estimated_customers_affected, Some(12));
    assert_eq!(facts[0].key, "5000:2002");
  }

  #[tokio::test]
  async fn malformed_record_aborts_the_run() {
    let s = store().await;
    let mut broken = outage(3003, json!(1), "Napa");
    broken.as_object_mut().unwrap().remove("hazardFlag");

    let h = MemoryHistory::new(vec![
      revision("r1", 1000, vec![outage(1001, json!(5), "Sonoma")]),
      revision("r2", 2000, vec![outage(1001, json!(6), "Sonoma"), broken]),
      revision("r3", 3000, vec![outage(1001, json!(7), "Sonoma")]),
    ]);

    let err = Ingestor::new(&s, &h).run().await.unwrap_err();
    assert!(matches!(
      err,
      Error::Record { ref revision, source: outage_core::Error::MalformedRecord { field: "hazardFlag", .. } }
        if revision == "r2"
    ));

    assert_eq!(s.latest_revision().await.unwrap().as_deref(), Some("r1"));
    assert_eq!(s.list_facts(None).await.unwrap().len(), 1);
    assert!(s.rollup().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn undecodable_revision_aborts_the_run() {
    let s = store().await;
    let (r1, _) = revision("r1", 1000, vec![]);
    let h = MemoryHistory::new(vec![(r1, b"not json".to_vec())]);

    let err = Ingestor::new(&s, &h).run().await.unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
    assert_eq!(s.latest_revision().await.unwrap(), None);
  }

  #[tokio::test]
  async fn history_failure_is_surfaced() {
    let s = store().await;
    let (gone, _) = revision("gone", 1, vec![]);
    s.register_snapshot(gone).await.unwrap();
    let h = MemoryHistory::new(history());

    let err = Ingestor::new(&s, &h).run().await.unwrap_err();
    assert!(matches!(err, Error::History(_)));
  }
}
