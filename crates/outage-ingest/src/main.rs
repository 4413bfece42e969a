//! `outages` — normalise the git history of an outage feed into SQLite.
//!
//! Run from (or point `--repo` at) the repository that tracks the feed:
//!
//! ```text
//! outages outages.db
//! outages --repo ~/pge-outages --file pge-outages.json outages.db
//! ```
//!
//! Re-running against the same store only ingests commits made since the
//! previous run.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use outage_history::GitHistory;
use outage_ingest::{
  Ingestor,
  settings::{self, Overrides},
};
use outage_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Normalise an outage feed's git history into SQLite")]
struct Cli {
  /// SQLite store to create or update; must end in `.db`.
  store: PathBuf,

  /// Path to an optional TOML configuration file.
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Git repository that tracks the feed [default: .]
  #[arg(long)]
  repo: Option<PathBuf>,

  /// Feed file, relative to the repository root [default: pge-outages.json]
  #[arg(long)]
  file: Option<String>,

  /// Commit to read history back from [default: HEAD]
  #[arg(long)]
  git_ref: Option<String>,

  /// Log progress every N revisions [default: 10]
  #[arg(long, value_name = "N")]
  progress_every: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let cfg = settings::load(cli.config.as_deref(), Overrides {
    store_path:     Some(cli.store),
    repo:           cli.repo,
    file:           cli.file,
    git_ref:        cli.git_ref,
    progress_every: cli.progress_every,
  })
  .context("failed to load configuration")?;

  if !cfg.store_path.exists() {
    tracing::info!(path = %cfg.store_path.display(), "creating tables");
  }
  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;

  let history = GitHistory::new(&cfg.repo, &cfg.file, &cfg.git_ref);

  let summary = Ingestor::new(&store, &history)
    .progress_every(cfg.progress_every)
    .run()
    .await
    .context("ingestion failed")?;

  tracing::info!(
    revisions = summary.revisions,
    records = summary.records,
    new_outages = summary.new_outages,
    rollup_rows = summary.rollup_rows,
    "done"
  );
  println!("{}", serde_json::to_string(&summary)?);

  Ok(())
}
