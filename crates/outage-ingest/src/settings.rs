//! Runtime configuration for the `outages` binary.
//!
//! Layered lowest to highest: an optional TOML file, `OUTAGES_*` environment
//! variables, then command-line flags.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// File extension the store path must carry.
pub const STORE_EXTENSION: &str = "db";

#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
  /// SQLite file to create or update.
  pub store_path:     PathBuf,
  /// Git repository holding the feed's history.
  #[serde(default = "default_repo")]
  pub repo:           PathBuf,
  /// Path of the feed file, relative to the repository root.
  #[serde(default = "default_file")]
  pub file:           String,
  /// Commit to walk history back from.
  #[serde(default = "default_git_ref")]
  pub git_ref:        String,
  /// Log progress every this many revisions; `0` disables it.
  #[serde(default = "default_progress_every")]
  pub progress_every: usize,
}

fn default_repo() -> PathBuf { PathBuf::from(".") }

fn default_file() -> String { "pge-outages.json".to_owned() }

fn default_git_ref() -> String { "HEAD".to_owned() }

fn default_progress_every() -> usize { 10 }

impl IngestConfig {
  pub fn validate(&self) -> Result<()> {
    match self.store_path.extension() {
      Some(ext) if ext == STORE_EXTENSION => Ok(()),
      _ => Err(Error::InvalidStorePath(self.store_path.clone())),
    }
  }
}

/// Values given on the command line. `None` leaves lower layers in charge.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
  pub store_path:     Option<PathBuf>,
  pub repo:           Option<PathBuf>,
  pub file:           Option<String>,
  pub git_ref:        Option<String>,
  pub progress_every: Option<usize>,
}

fn path_value(path: PathBuf) -> String { path.to_string_lossy().into_owned() }

/// Build and validate the configuration from every layer.
pub fn load(config_file: Option<&Path>, overrides: Overrides) -> Result<IngestConfig> {
  let mut builder = ::config::Config::builder();
  if let Some(path) = config_file {
    builder = builder.add_source(::config::File::from(path));
  }

  let settings = builder
    .add_source(::config::Environment::with_prefix("OUTAGES"))
    .set_override_option("store_path", overrides.store_path.map(path_value))?
    .set_override_option("repo", overrides.repo.map(path_value))?
    .set_override_option("file", overrides.file)?
    .set_override_option("git_ref", overrides.git_ref)?
    .set_override_option("progress_every", overrides.progress_every.map(|n| n as i64))?
    .build()?;

  let cfg: IngestConfig = settings.try_deserialize()?;
  cfg.validate()?;
  Ok(cfg)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn temp_toml(contents: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
      .duration_since(std::time::UNIX_EPOCH)
      .expect("time")
      .as_nanos();
    let path = std::env::temp_dir().join(format!("outage-ingest-{nanos}.toml"));
    std::fs::write(&path, contents).expect("write config");
    path
  }

  #[test]
  fn defaults_apply_when_only_store_is_given() {
    let cfg = load(None, Overrides {
      store_path: Some("outages.db".into()),
      ..Overrides::default()
    })
    .unwrap();

    assert_eq!(cfg.store_path, PathBuf::from("outages.db"));
    assert_eq!(cfg.repo, PathBuf::from("."));
    assert_eq!(cfg.file, "pge-outages.json");
    assert_eq!(cfg.git_ref, "HEAD");
    assert_eq!(cfg.progress_every, 10);
  }

  #[test]
  fn flags_override_the_config_file() {
    let path = temp_toml(
      "store_path = \"from-file.db\"\nfile = \"feed.json\"\nprogress_every = 3\n",
    );

    let cfg = load(Some(path.as_path()), Overrides {
      store_path: Some("from-flag.db".into()),
      ..Overrides::default()
    })
    .unwrap();

    assert_eq!(cfg.store_path, PathBuf::from("from-flag.db"));
    assert_eq!(cfg.file, "feed.json");
    assert_eq!(cfg.progress_every, 3);

    let _ = std::fs::remove_file(path);
  }

  #[test]
  fn store_path_must_end_in_db() {
    for bad in ["outages.sqlite", "outages", "db"] {
      let err = load(None, Overrides {
        store_path: Some(bad.into()),
        ..Overrides::default()
      })
      .unwrap_err();
      assert!(matches!(err, Error::InvalidStorePath(_)), "{bad}");
    }
  }
}
