//! Incremental ingestion of an outage feed's history into an outage store.
//!
//! [`Ingestor`] resumes from the newest revision the store already knows,
//! records every later revision in order, then rebuilds the rollup.
//! [`IngestConfig`] carries the knobs for the `outages` binary.

pub mod error;
pub mod pipeline;
pub mod settings;

pub use error::{Error, Result};
pub use pipeline::{Ingestor, Pending, RunSummary};
pub use settings::IngestConfig;
