//! Application configuration.
//!
//! Read from an optional TOML file layered with `TIMETABLE_*` environment
//! variables (`__` separates nested keys, e.g.
//! `TIMETABLE_INGEST__HEADER_ROW=1`). Every field has a default, so running
//! without a file works.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;
use timetable_core::reference::AreaPolicy;
use timetable_ingest::IngestConfig;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  /// SQLite file holding the canonical store. A leading `~/` is expanded.
  pub store_path: PathBuf,
  pub ingest:     IngestConfig,
  pub areas:      AreaPolicy,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      store_path: PathBuf::from("timetable.db"),
      ingest:     IngestConfig::default(),
      areas:      AreaPolicy::default(),
    }
  }
}

impl AppConfig {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("TIMETABLE").separator("__"))
      .build()
      .context("failed to read config file")?;
    settings
      .try_deserialize()
      .context("failed to deserialise AppConfig")
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
