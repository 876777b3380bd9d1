//! Error types for `timetable-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown weekday token: {0:?}")]
  UnknownWeekday(String),

  #[error("unknown time slot label: {0:?}")]
  UnknownTimeSlot(String),

  #[error("refresh needs at least one ingested offering or an address update")]
  NothingToRefresh,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
