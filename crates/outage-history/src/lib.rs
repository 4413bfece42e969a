//! Where revisions come from and how their content is decoded.
//!
//! [`GitHistory`] walks the commits that touched one file of a git repository
//! by shelling out to the `git` binary. [`decode`] turns one revision of the
//! outage feed into loosely typed records.

mod decode;
mod git;

pub mod error;

pub use decode::decode;
pub use error::{Error, Result};
pub use git::GitHistory;
