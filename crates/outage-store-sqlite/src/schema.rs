//! SQL schema for the outage SQLite store.
//!
//! Executed once at connection startup. Every statement is idempotent, so
//! opening an existing store leaves its contents untouched.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per processed revision. `id` doubles as the chronological
-- sequence: it is assigned on insert and never renumbered.
CREATE TABLE IF NOT EXISTS snapshots (
    id          INTEGER PRIMARY KEY,
    title       TEXT    NOT NULL,
    hash        TEXT    NOT NULL UNIQUE,
    captured_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS region_names (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS causes (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS crew_statuses (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

-- Static attributes as first observed. Never updated.
CREATE TABLE IF NOT EXISTS outages (
    id             INTEGER PRIMARY KEY,   -- outageNumber from the feed
    start_time     INTEGER NOT NULL,
    latitude       TEXT    NOT NULL,
    longitude      TEXT    NOT NULL,
    region_name_id INTEGER NOT NULL REFERENCES region_names(id),
    devices        TEXT    NOT NULL DEFAULT '[]'
);

-- One row per (captured_at, outage); upserted, never duplicated.
CREATE TABLE IF NOT EXISTS outage_snapshots (
    id                TEXT PRIMARY KEY,    -- fact key: <captured_at>:<outage id>
    outage_id         INTEGER NOT NULL REFERENCES outages(id),
    snapshot_id       INTEGER NOT NULL REFERENCES snapshots(id),
    last_update_time  INTEGER,
    current_etor      INTEGER,
    auto_etor         INTEGER,
    est_cust_affected INTEGER,             -- NULL when absent or zero
    hazard_flag       INTEGER NOT NULL,
    latitude          TEXT    NOT NULL,
    longitude         TEXT    NOT NULL,
    region_name_id    INTEGER NOT NULL REFERENCES region_names(id),
    cause_id          INTEGER NOT NULL REFERENCES causes(id),
    crew_status_id    INTEGER NOT NULL REFERENCES crew_statuses(id)
);

CREATE INDEX IF NOT EXISTS outage_snapshots_outage_idx   ON outage_snapshots(outage_id);
CREATE INDEX IF NOT EXISTS outage_snapshots_snapshot_idx ON outage_snapshots(snapshot_id);

-- Facts belonging to the snapshot with the highest sequence id.
CREATE VIEW IF NOT EXISTS most_recent_snapshot AS
    SELECT * FROM outage_snapshots
    WHERE snapshot_id = (SELECT max(id) FROM snapshots);

-- Derived per-outage summary; replaced wholesale by `REBUILD_ROLLUP`.
CREATE TABLE IF NOT EXISTS outages_expanded (
    outage_id      INTEGER PRIMARY KEY,
    earliest       INTEGER NOT NULL,
    latest         INTEGER NOT NULL,
    snapshot_count INTEGER NOT NULL,
    duration_hours REAL    NOT NULL,
    probably_ended INTEGER NOT NULL,
    min_customers  INTEGER,
    max_customers  INTEGER,
    region         TEXT    NOT NULL,
    latitude       TEXT    NOT NULL,
    longitude      TEXT    NOT NULL
);

PRAGMA user_version = 1;
";

/// Recompute the rollup from every fact. Must run inside one transaction so
/// readers see either the old rollup or the new one.
pub const REBUILD_ROLLUP: &str = "
DELETE FROM outages_expanded;

INSERT INTO outages_expanded (
    outage_id, earliest, latest, snapshot_count, duration_hours,
    probably_ended, min_customers, max_customers, region, latitude, longitude
)
SELECT
    f.outage_id,
    min(s.captured_at),
    max(s.captured_at),
    count(f.id),
    round(CAST(max(s.captured_at) - min(s.captured_at) AS REAL) / 3600, 2),
    f.outage_id NOT IN (SELECT outage_id FROM most_recent_snapshot),
    min(f.est_cust_affected),
    max(f.est_cust_affected),
    min(r.name),
    min(f.latitude),
    min(f.longitude)
FROM outage_snapshots f
JOIN snapshots    s ON s.id = f.snapshot_id
JOIN region_names r ON r.id = f.region_name_id
GROUP BY f.outage_id;
";
