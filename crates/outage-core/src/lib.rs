//! Core types and trait definitions for the outage history ingester.
//!
//! This crate is deliberately free of git and database dependencies. It
//! describes what a revision, a snapshot, an outage and a fact are, how loosely
//! typed feed records are coerced into them, and the two seams the pipeline is
//! built on: [`store::OutageStore`] and [`history::HistorySource`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod history;
pub mod outage;
pub mod record;
pub mod snapshot;
pub mod store;

pub use error::{Error, Result};
