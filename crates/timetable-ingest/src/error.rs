//! Error type for `timetable-ingest`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("workbook error: {0}")]
  Workbook(#[from] calamine::Error),

  #[error("workbook has no sheets")]
  NoSheet,

  #[error("no <table> found in HTML document")]
  NoTable,

  #[error("table has no header row at index {0}")]
  MissingHeader(usize),

  #[error("missing required column(s): {}", .0.join(", "))]
  MissingColumns(Vec<&'static str>),

  #[error("could not read {file}: {source}")]
  Io {
    file:   String,
    #[source]
    source: std::io::Error,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
