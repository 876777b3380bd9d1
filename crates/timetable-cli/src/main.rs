//! `timetable`: instructor timetable dashboard over a SQLite store.
//!
//! # Usage
//!
//! ```text
//! timetable refresh listings/*.xlsx --addresses 주소록.xlsx
//! timetable mapping 영역표.xlsx
//! timetable periods
//! timetable instructors --year 2024 --month 3 --area 과학
//! timetable timetable 김철수 --year 2024 --month 3
//! timetable coverage --year 2024 --month 3 --output coverage.xlsx
//! timetable export-grids --year 2024 --month 3 --output grids.xlsx
//! ```

mod commands;
mod render;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use settings::{AppConfig, expand_tilde};
use timetable_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "timetable", version, about = "Instructor timetable dashboard")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "timetable.toml", global = true)]
  config: PathBuf,

  /// SQLite store; overrides `store_path` from the configuration.
  #[arg(long, env = "TIMETABLE_STORE", global = true)]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

/// Period and narrowing filters shared by the read commands. Year and month
/// default to the newest period in the store.
#[derive(Args, Debug, Clone, Default)]
pub struct Filters {
  #[arg(long)]
  pub year:    Option<String>,
  /// Month as `3` or `3월`.
  #[arg(long)]
  pub month:   Option<String>,
  #[arg(long)]
  pub area:    Option<String>,
  #[arg(long)]
  pub subject: Option<String>,
  /// Case-insensitive substring of instructor or subject name.
  #[arg(long)]
  pub search:  Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Ingest listing files into the store and optionally replace the
  /// address book.
  Refresh {
    /// Listing exports (xlsx, xls, or HTML saved as xls).
    files:     Vec<PathBuf>,
    /// Address file with `강사명` and `자택 주소` columns.
    #[arg(long, value_name = "FILE")]
    addresses: Option<PathBuf>,
    #[arg(long)]
    json:      bool,
  },

  /// Replace the subject → area table from a file with `선택과목` and `영역`
  /// columns.
  Mapping { file: PathBuf },

  /// List the years and months present in the store.
  Periods {
    #[arg(long)]
    json: bool,
  },

  /// Instructors of the selected period with their new/existing status.
  Instructors {
    #[command(flatten)]
    filters: Filters,
    #[arg(long)]
    json:    bool,
  },

  /// One instructor's profile and weekly grid.
  Timetable {
    instructor: String,
    #[command(flatten)]
    filters:    Filters,
    /// Print the grid as an HTML table.
    #[arg(long, conflicts_with = "json")]
    html:       bool,
    #[arg(long)]
    json:       bool,
  },

  /// Instructor × venue coverage of the selected period.
  Coverage {
    #[command(flatten)]
    filters: Filters,
    /// Write an xlsx workbook instead of printing.
    #[arg(long, value_name = "FILE")]
    output:  Option<PathBuf>,
    #[arg(long)]
    json:    bool,
  },

  /// Write one timetable sheet per area for the selected period.
  ExportGrids {
    #[command(flatten)]
    filters: Filters,
    #[arg(long, value_name = "FILE")]
    output:  PathBuf,
  },

  /// Write the selected offerings as a flat sheet.
  ExportDump {
    #[command(flatten)]
    filters:    Filters,
    #[arg(long)]
    instructor: Option<String>,
    #[arg(long, value_name = "FILE")]
    output:     PathBuf,
  },
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let config = AppConfig::load(&cli.config)?;

  let store_path = expand_tilde(cli.store.as_deref().unwrap_or(config.store_path.as_path()));
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command {
    Command::Refresh {
      files,
      addresses,
      json,
    } => commands::refresh(&store, &config, &files, addresses.as_deref(), json).await,
    Command::Mapping { file } => commands::mapping(&store, &file).await,
    Command::Periods { json } => commands::periods(&store, &config, json).await,
    Command::Instructors { filters, json } => {
      commands::instructors(&store, &config, &filters, json).await
    }
    Command::Timetable {
      instructor,
      filters,
      html,
      json,
    } => commands::timetable(&store, &config, &instructor, &filters, html, json).await,
    Command::Coverage {
      filters,
      output,
      json,
    } => commands::coverage(&store, &config, &filters, output.as_deref(), json).await,
    Command::ExportGrids { filters, output } => {
      commands::export_grids(&store, &config, &filters, &output).await
    }
    Command::ExportDump {
      filters,
      instructor,
      output,
    } => commands::export_dump(&store, &config, &filters, instructor, &output).await,
  }
}
