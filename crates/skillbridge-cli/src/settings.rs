//! Runtime configuration: an optional TOML file layered under
//! `SKILLBRIDGE_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CliConfig {
  /// SQLite database file. A leading `~/` expands to `$HOME`.
  pub store_path:          PathBuf,
  /// Window used by the analytics commands when `--from` is not given.
  pub default_window_days: u32,
  /// Pretty-print JSON output.
  pub pretty:              bool,
}

impl Default for CliConfig {
  fn default() -> Self {
    Self {
      store_path:          PathBuf::from("~/.local/share/skillbridge/skillbridge.db"),
      default_window_days: 30,
      pretty:              false,
    }
  }
}

impl CliConfig {
  /// Read `path` (if it exists) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    Self::from_builder(
      Config::builder()
        .add_source(File::from(path).required(false))
        .add_source(Environment::with_prefix("SKILLBRIDGE").try_parsing(true)),
    )
  }

  fn from_builder(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
    let mut cfg: CliConfig = builder
      .build()
      .context("failed to read config")?
      .try_deserialize()
      .context("failed to deserialise CliConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use config::FileFormat;
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn file_values_override_defaults() {
    let toml = r#"
      store_path = "/var/lib/skillbridge.db"
      pretty = true
    "#;
    let cfg = CliConfig::from_builder(
      Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
    )
    .unwrap();
    assert_eq!(cfg, CliConfig {
      store_path:          PathBuf::from("/var/lib/skillbridge.db"),
      default_window_days: 30,
      pretty:              true,
    });
  }

  #[test]
  fn missing_file_falls_back_to_defaults() {
    let cfg = CliConfig::from_builder(Config::builder().add_source(
      File::from(Path::new("/nonexistent/skillbridge.toml")).required(false),
    ))
    .unwrap();
    assert_eq!(cfg.default_window_days, 30);
    assert!(!cfg.pretty);
  }

  #[test]
  fn tilde_expands_only_at_start() {
    let home = std::env::var("HOME").unwrap_or_default();
    if !home.is_empty() {
      assert_eq!(
        expand_tilde(Path::new("~/data/sb.db")),
        PathBuf::from(&home).join("data/sb.db")
      );
    }
    assert_eq!(expand_tilde(Path::new("/tmp/~/x")), PathBuf::from("/tmp/~/x"));
  }
}
