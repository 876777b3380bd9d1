//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Stores written by other tools may hold numbers where text is expected
//! (a year of `2024` rather than `'2024'`), so reads go through
//! [`value_text`] instead of typed getters.

use chrono::NaiveDate;
use rusqlite::types::Value;
use timetable_core::{
  normalize::normalize,
  offering::{Offering, TimeSlot, Weekday, parse_start_date},
};

use crate::Result;

// ─── Values ──────────────────────────────────────────────────────────────────

/// Text of a stored value; `None` for NULL and blobs.
pub fn value_text(v: Value) -> Option<String> {
  match v {
    Value::Null | Value::Blob(_) => None,
    Value::Integer(i) => Some(i.to_string()),
    Value::Real(f) if f.fract() == 0.0 => Some(format!("{f:.0}")),
    Value::Real(f) => Some(f.to_string()),
    Value::Text(s) => Some(s),
  }
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Option<NaiveDate> { parse_start_date(s) }

// ─── Offering ────────────────────────────────────────────────────────────────

/// An `offerings` row with one slot per known column; absent columns and
/// NULLs are `None`.
#[derive(Debug, Default)]
pub struct RawOffering {
  pub year:        Option<String>,
  pub month:       Option<String>,
  pub instructor:  Option<String>,
  pub subject:     Option<String>,
  pub weekday:     Option<String>,
  pub time_slot:   Option<String>,
  pub venue:       Option<String>,
  pub course_type: Option<String>,
  pub start_date:  Option<String>,
}

impl RawOffering {
  /// Build from values in `OFFERING_COLUMNS` order.
  pub fn from_values(values: [Option<String>; 9]) -> Self {
    let [
      year,
      month,
      instructor,
      subject,
      weekday,
      time_slot,
      venue,
      course_type,
      start_date,
    ] = values;
    Self {
      year,
      month,
      instructor,
      subject,
      weekday,
      time_slot,
      venue,
      course_type,
      start_date,
    }
  }

  /// Fails when the weekday or time slot is missing or unrecognised. Other
  /// missing text fields become `""`.
  pub fn into_offering(self) -> Result<Offering> {
    let text = |v: Option<String>| normalize(v.as_deref().unwrap_or(""));
    let weekday: Weekday = text(self.weekday).parse()?;
    let time_slot: TimeSlot = text(self.time_slot).parse()?;
    Ok(Offering {
      year: text(self.year),
      month: text(self.month),
      instructor: text(self.instructor),
      subject: text(self.subject),
      weekday,
      time_slot,
      venue: text(self.venue),
      course_type: text(self.course_type),
      start_date: self.start_date.as_deref().and_then(decode_date),
    })
  }
}
