//! `skillbridge` — record activity facts and print analytics as JSON.
//!
//! Reads `skillbridge.toml` (or the path given with `--config`) layered
//! under `SKILLBRIDGE_*` environment variables, opens the SQLite store and
//! runs one subcommand. Results go to stdout; logs go to stderr.
//!
//! # Usage
//!
//! ```text
//! skillbridge record-engagement --input engagement.json
//! skillbridge heatmap --counterpart <TUTOR> --from 2026-03-01 --to 2026-03-31
//! skillbridge match-tutors --skill <SKILL> --learner <LEARNER> --limit 5
//! ```

mod command;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use skillbridge_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::{
  command::{Command, Context},
  settings::CliConfig,
};

#[derive(Parser, Debug)]
#[command(name = "skillbridge", author, version, about = "Tutoring analytics and matching")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "skillbridge.toml")]
  config: PathBuf,

  /// SQLite database file; overrides `store_path` from the config.
  #[arg(long, value_name = "FILE")]
  store: Option<PathBuf>,

  /// Pretty-print JSON output.
  #[arg(long)]
  pretty: bool,

  #[command(subcommand)]
  command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr so stdout stays machine-readable.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let cfg = CliConfig::load(&cli.config)?;
  let store_path = cli.store.unwrap_or(cfg.store_path);

  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  tracing::debug!(path = %store_path.display(), "opened store");

  command::run(cli.command, Context {
    store,
    default_window_days: cfg.default_window_days,
    pretty: cli.pretty || cfg.pretty,
  })
  .await
}
