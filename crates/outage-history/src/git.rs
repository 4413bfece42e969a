//! [`GitHistory`] — a [`HistorySource`] backed by the `git` command line.

use std::path::PathBuf;

use chrono::DateTime;
use outage_core::{history::HistorySource, snapshot::RevisionRef};
use tokio::process::Command;

use crate::{Error, Result};

/// The revisions of one file in a git repository.
///
/// `path` is relative to the repository root. Only commits reachable from
/// `git_ref` that changed the file are listed.
#[derive(Debug, Clone)]
pub struct GitHistory {
  repo:    PathBuf,
  path:    String,
  git_ref: String,
}

impl GitHistory {
  pub fn new(repo: impl Into<PathBuf>, path: impl Into<String>, git_ref: impl Into<String>) -> Self {
    Self { repo: repo.into(), path: path.into(), git_ref: git_ref.into() }
  }

  async fn git(&self, args: &[&str]) -> Result<Vec<u8>> {
    let output = Command::new("git")
      .arg("-C")
      .arg(&self.repo)
      .args(args)
      .output()
      .await?;

    if !output.status.success() {
      return Err(Error::Git {
        command: args.join(" "),
        stderr:  String::from_utf8_lossy(&output.stderr).trim().to_owned(),
      });
    }
    Ok(output.stdout)
  }
}

/// Parse one `%H %cI` line of `git log` output.
fn parse_log_line(line: &str) -> Result<RevisionRef> {
  let (hash, date) = line
    .split_once(' ')
    .ok_or_else(|| Error::LogLine(line.to_owned()))?;
  let timestamp = DateTime::parse_from_rfc3339(date.trim()).map_err(|source| {
    Error::Timestamp { value: date.to_owned(), source }
  })?;
  Ok(RevisionRef::new(hash, timestamp))
}

impl HistorySource for GitHistory {
  type Error = Error;

  async fn list(&self, since: Option<String>) -> Result<Vec<RevisionRef>> {
    let range = match since {
      Some(since) => format!("{since}..{}", self.git_ref),
      None => self.git_ref.clone(),
    };

    let stdout = self
      .git(&["log", "--reverse", "--format=%H %cI", &range, "--", &self.path])
      .await?;

    let revisions = String::from_utf8_lossy(&stdout)
      .lines()
      .filter(|line| !line.trim().is_empty())
      .map(parse_log_line)
      .collect::<Result<Vec<_>>>()?;

    tracing::debug!(%range, count = revisions.len(), "listed revisions");
    Ok(revisions)
  }

  async fn read(&self, revision: RevisionRef) -> Result<Vec<u8>> {
    let object = format!("{}:{}", revision.revision_id, self.path);
    self.git(&["show", &object]).await
  }
}
