//! Synchronous write operations over a borrowed connection.
//!
//! These run inside `tokio_rusqlite::Connection::call` closures, either one at
//! a time or together inside a transaction (a `Transaction` derefs to a
//! `Connection`). They return `tokio_rusqlite::Result` so that record errors
//! can ride back through the connection thread as
//! [`tokio_rusqlite::Error::Other`].

use outage_core::{
  outage::{Category, OutageFact, RevisionSummary, fact_key},
  record::Observation,
  snapshot::RevisionRef,
};
use rusqlite::{Connection, OptionalExtension as _, Params, params};
use tokio_rusqlite::Result;

use crate::schema::REBUILD_ROLLUP;

/// Look up an id with `find`; when nothing matches, run `insert` and return
/// the id it produced. The flag is `true` when a row was created.
///
/// This is the one get-or-create primitive behind dictionaries, snapshots and
/// outages.
pub fn get_or_insert<P, F>(
  conn:   &Connection,
  find:   &str,
  params: P,
  insert: F,
) -> Result<(i64, bool)>
where
  P: Params,
  F: FnOnce(&Connection) -> Result<i64>,
{
  let existing: Option<i64> = conn.query_row(find, params, |row| row.get(0)).optional()?;
  match existing {
    Some(id) => Ok((id, false)),
    None => insert(conn).map(|id| (id, true)),
  }
}

// ─── Dictionaries ────────────────────────────────────────────────────────────

pub fn resolve(conn: &Connection, category: Category, name: &str) -> Result<i64> {
  let table = category.table();
  let find = format!("SELECT id FROM {table} WHERE name = ?1");

  let (id, created) = get_or_insert(conn, &find, params![name], |conn| {
    conn.execute(&format!("INSERT INTO {table} (name) VALUES (?1)"), params![name])?;
    Ok(conn.last_insert_rowid())
  })?;

  if created {
    tracing::debug!(%category, name, id, "new dictionary entry");
  }
  Ok(id)
}

// ─── Snapshots ───────────────────────────────────────────────────────────────

pub fn latest_revision(conn: &Connection) -> Result<Option<String>> {
  Ok(
    conn
      .query_row("SELECT hash FROM snapshots ORDER BY id DESC LIMIT 1", [], |row| {
        row.get(0)
      })
      .optional()?,
  )
}

pub fn register_snapshot(conn: &Connection, revision: &RevisionRef) -> Result<i64> {
  let (id, _) = get_or_insert(
    conn,
    "SELECT id FROM snapshots WHERE hash = ?1",
    params![revision.revision_id],
    |conn| {
      conn.execute(
        "INSERT INTO snapshots (title, hash, captured_at) VALUES (?1, ?2, ?3)",
        params![revision.title(), revision.revision_id, revision.captured_at()],
      )?;
      Ok(conn.last_insert_rowid())
    },
  )?;
  Ok(id)
}

// ─── Outages ─────────────────────────────────────────────────────────────────

pub fn ensure_outage(conn: &Connection, obs: &Observation) -> Result<bool> {
  let (_, created) = get_or_insert(
    conn,
    "SELECT id FROM outages WHERE id = ?1",
    params![obs.outage_id],
    |conn| {
      let start_time = obs
        .start_time
        .ok_or_else(|| tokio_rusqlite::Error::Other(Box::new(Observation::missing_start_time())))?;
      let region_id = resolve(conn, Category::RegionName, &obs.region)?;

      conn.execute(
        "INSERT INTO outages (id, start_time, latitude, longitude, region_name_id, devices)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
          obs.outage_id,
          start_time,
          obs.latitude,
          obs.longitude,
          region_id,
          obs.devices,
        ],
      )?;
      Ok(obs.outage_id)
    },
  )?;
  Ok(created)
}

// ─── Facts ───────────────────────────────────────────────────────────────────

pub fn upsert_fact(
  conn:        &Connection,
  obs:         &Observation,
  captured_at: i64,
  snapshot_id: i64,
) -> Result<OutageFact> {
  let fact = OutageFact {
    key: fact_key(captured_at, obs.outage_id),
    outage_id: obs.outage_id,
    snapshot_id,
    last_update_time: obs.last_update_time,
    current_eta: obs.current_eta,
    auto_eta: obs.auto_eta,
    estimated_customers_affected: obs.estimated_customers_affected,
    hazard_flag: obs.hazard_flag,
    latitude: obs.latitude.clone(),
    longitude: obs.longitude.clone(),
    region_id: resolve(conn, Category::RegionName, &obs.region)?,
    cause_id: resolve(conn, Category::Cause, &obs.cause)?,
    crew_status_id: resolve(conn, Category::CrewStatus, &obs.crew_status)?,
  };

  conn.execute(
    "INSERT INTO outage_snapshots (
       id, outage_id, snapshot_id, last_update_time, current_etor, auto_etor,
       est_cust_affected, hazard_flag, latitude, longitude,
       region_name_id, cause_id, crew_status_id
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
     ON CONFLICT (id) DO UPDATE SET
       outage_id         = excluded.outage_id,
       snapshot_id       = excluded.snapshot_id,
       last_update_time  = excluded.last_update_time,
       current_etor      = excluded.current_etor,
       auto_etor         = excluded.auto_etor,
       est_cust_affected = excluded.est_cust_affected,
       hazard_flag       = excluded.hazard_flag,
       latitude          = excluded.latitude,
       longitude         = excluded.longitude,
       region_name_id    = excluded.region_name_id,
       cause_id          = excluded.cause_id,
       crew_status_id    = excluded.crew_status_id",
    params![
      fact.key,
      fact.outage_id,
      fact.snapshot_id,
      fact.last_update_time,
      fact.current_eta,
      fact.auto_eta,
      fact.estimated_customers_affected,
      fact.hazard_flag,
      fact.latitude,
      fact.longitude,
      fact.region_id,
      fact.cause_id,
      fact.crew_status_id,
    ],
  )?;

  Ok(fact)
}

// ─── Whole revision ──────────────────────────────────────────────────────────

/// Register one revision and everything observed in it, atomically.
pub fn ingest_revision(
  conn:         &mut Connection,
  revision:     &RevisionRef,
  observations: &[Observation],
) -> Result<RevisionSummary> {
  let tx = conn.transaction()?;

  let snapshot_id = register_snapshot(&tx, revision)?;
  let captured_at = revision.captured_at();

  let mut new_outages = 0;
  for obs in observations {
    if ensure_outage(&tx, obs)? {
      new_outages += 1;
    }
    upsert_fact(&tx, obs, captured_at, snapshot_id)?;
  }

  tx.commit()?;

  Ok(RevisionSummary { snapshot_id, records: observations.len(), new_outages })
}

// ─── Rollup ──────────────────────────────────────────────────────────────────

pub fn rebuild_rollup(conn: &mut Connection) -> Result<usize> {
  let tx = conn.transaction()?;
  tx.execute_batch(REBUILD_ROLLUP)?;
  let rows: i64 = tx.query_row("SELECT count(*) FROM outages_expanded", [], |row| row.get(0))?;
  tx.commit()?;
  Ok(rows as usize)
}
