//! Offering: the atomic canonical record.
//!
//! One offering is one (instructor, subject, weekday, time slot, venue,
//! course type) combination for a given year and month. Offerings are
//! created by the ingestor, persisted by a [`crate::store::ScheduleStore`],
//! and never mutated afterwards.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

use crate::{Error, normalize::normalize};

// ─── Weekday ─────────────────────────────────────────────────────────────────

/// Day of the week, stored as the single-character Korean token.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter,
  Serialize, Deserialize,
)]
pub enum Weekday {
  #[serde(rename = "월")]
  Mon,
  #[serde(rename = "화")]
  Tue,
  #[serde(rename = "수")]
  Wed,
  #[serde(rename = "목")]
  Thu,
  #[serde(rename = "금")]
  Fri,
  #[serde(rename = "토")]
  Sat,
  #[serde(rename = "일")]
  Sun,
}

impl Weekday {
  /// Monday first, the grid column order.
  pub const ALL: [Self; 7] = [
    Self::Mon,
    Self::Tue,
    Self::Wed,
    Self::Thu,
    Self::Fri,
    Self::Sat,
    Self::Sun,
  ];

  /// The token stored in the canonical table and shown in grid headers.
  pub fn token(self) -> &'static str {
    match self {
      Self::Mon => "월",
      Self::Tue => "화",
      Self::Wed => "수",
      Self::Thu => "목",
      Self::Fri => "금",
      Self::Sat => "토",
      Self::Sun => "일",
    }
  }

  /// Accepts the Korean single-character token or an English three-letter
  /// abbreviation (any case).
  pub fn from_token(s: &str) -> Option<Self> {
    let s = s.trim();
    Self::iter().find(|d| {
      d.token() == s || d.english().eq_ignore_ascii_case(s)
    })
  }

  pub fn english(self) -> &'static str {
    match self {
      Self::Mon => "Mon",
      Self::Tue => "Tue",
      Self::Wed => "Wed",
      Self::Thu => "Thu",
      Self::Fri => "Fri",
      Self::Sat => "Sat",
      Self::Sun => "Sun",
    }
  }
}

impl std::str::FromStr for Weekday {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::from_token(s).ok_or_else(|| Error::UnknownWeekday(s.to_owned()))
  }
}

// ─── TimeSlot ────────────────────────────────────────────────────────────────

/// Coarse part of the day a class starts in.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter,
  Serialize, Deserialize,
)]
pub enum TimeSlot {
  #[serde(rename = "오전")]
  Morning,
  #[serde(rename = "오후")]
  Afternoon,
  #[serde(rename = "저녁")]
  Evening,
}

impl TimeSlot {
  /// `< 12` → Morning, `12..18` → Afternoon, `>= 18` → Evening.
  pub fn from_hour(hour: u32) -> Self {
    match hour {
      0..12 => Self::Morning,
      12..18 => Self::Afternoon,
      _ => Self::Evening,
    }
  }

  /// Slot for a `H:MM` / `HH:MM` start time; `None` if the hour is missing or
  /// not a number.
  pub fn from_start_time(start: &str) -> Option<Self> {
    let (hour, _) = start.trim().split_once(':')?;
    hour.parse::<u32>().ok().map(Self::from_hour)
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::Morning => "오전",
      Self::Afternoon => "오후",
      Self::Evening => "저녁",
    }
  }

  pub fn from_label(s: &str) -> Option<Self> {
    let s = s.trim();
    Self::iter().find(|t| t.label() == s)
  }
}

impl std::str::FromStr for TimeSlot {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::from_label(s).ok_or_else(|| Error::UnknownTimeSlot(s.to_owned()))
  }
}

// ─── Offering ────────────────────────────────────────────────────────────────

/// A canonical offering row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offering {
  pub year:        String,
  pub month:       String,
  pub instructor:  String,
  pub subject:     String,
  pub weekday:     Weekday,
  pub time_slot:   TimeSlot,
  pub venue:       String,
  pub course_type: String,
  /// `None` when the source date could not be parsed.
  pub start_date:  Option<NaiveDate>,
}

/// One column of the canonical dedup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum KeyColumn {
  Year,
  Month,
  Instructor,
  Subject,
  Weekday,
  TimeSlot,
  Venue,
  CourseType,
}

impl KeyColumn {
  /// Column name used by the canonical store.
  pub fn name(self) -> &'static str {
    match self {
      Self::Year => "year",
      Self::Month => "month",
      Self::Instructor => "instructor",
      Self::Subject => "subject",
      Self::Weekday => "weekday",
      Self::TimeSlot => "time_slot",
      Self::Venue => "venue",
      Self::CourseType => "course_type",
    }
  }

  /// The full canonical key, in order.
  pub fn all() -> Vec<Self> { Self::iter().collect() }

  /// The canonical key restricted to the columns present in a store.
  pub fn present_in<S: AsRef<str>>(columns: &[S]) -> Vec<Self> {
    Self::iter()
      .filter(|k| columns.iter().any(|c| c.as_ref() == k.name()))
      .collect()
  }
}

impl Offering {
  /// The value of one key column, as stored.
  pub fn key_field(&self, column: KeyColumn) -> &str {
    match column {
      KeyColumn::Year => &self.year,
      KeyColumn::Month => &self.month,
      KeyColumn::Instructor => &self.instructor,
      KeyColumn::Subject => &self.subject,
      KeyColumn::Weekday => self.weekday.token(),
      KeyColumn::TimeSlot => self.time_slot.label(),
      KeyColumn::Venue => &self.venue,
      KeyColumn::CourseType => &self.course_type,
    }
  }
}

// ─── Dates and months ────────────────────────────────────────────────────────

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] =
  &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Best-effort start-date parser. Never fails: anything unrecognised is
/// `None`.
///
/// Accepts ISO dates (optionally with a time part), dotted/slashed dates,
/// Korean `2024. 3. 4.` spacing, bare `YYYY`/`YYYYMM`/`YYYYMMDD` digits and
/// five-digit Excel serial day numbers.
pub fn parse_start_date(raw: &str) -> Option<NaiveDate> {
  let s = normalize(raw);
  if s.is_empty() || s == "NaT" || s == "None" {
    return None;
  }

  for fmt in DATETIME_FORMATS {
    if let Ok(dt) = NaiveDateTime::parse_from_str(&s, fmt) {
      return Some(dt.date());
    }
  }

  let compact: String = s
    .trim_end_matches('.')
    .chars()
    .filter(|c| !c.is_whitespace())
    .collect();
  let head = s.split_whitespace().next().unwrap_or_default();
  for candidate in [s.as_str(), compact.as_str(), head] {
    for fmt in DATE_FORMATS {
      if let Ok(d) = NaiveDate::parse_from_str(candidate, fmt) {
        return Some(d);
      }
    }
  }

  digits_date(&s).or_else(|| excel_serial_date(&s))
}

/// All-digit dates: `YYYY`, `YYYYMM` and `YYYYMMDD`, missing parts being 1.
fn digits_date(s: &str) -> Option<NaiveDate> {
  if !s.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  let part = |range: std::ops::Range<usize>| s.get(range)?.parse::<u32>().ok();
  let (month, day) = match s.len() {
    4 => (1, 1),
    6 => (part(4..6)?, 1),
    8 => (part(4..6)?, part(6..8)?),
    _ => return None,
  };
  NaiveDate::from_ymd_opt(s[..4].parse().ok()?, month, day)
}

/// Excel stores dates as days since 1899-12-30. Only five-digit serials
/// (1927 to 2173) are taken as dates; shorter numbers are not.
fn excel_serial_date(s: &str) -> Option<NaiveDate> {
  let whole = s.split_once('.').map_or(s, |(w, _)| w);
  if whole.len() != 5 || !whole.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  let serial: f64 = s.parse().ok()?;
  let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
  epoch.checked_add_days(chrono::Days::new(serial.trunc() as u64))
}

/// Four-digit year of `date`, or the `"0"` sentinel when unknown.
pub fn year_of(date: Option<NaiveDate>) -> String {
  date.map(|d| d.year().to_string()).unwrap_or_else(|| "0".to_owned())
}

/// `"<N>월"` label for a month number.
pub fn month_label(month: u32) -> String { format!("{month}월") }

/// Numeric part of a `"<N>월"` label.
pub fn month_number(label: &str) -> Option<u32> {
  label.trim().strip_suffix('월')?.trim().parse().ok()
}

/// First day of the given year/month labels, if both are valid.
pub fn month_start(year: &str, month: &str) -> Option<NaiveDate> {
  let y: i32 = year.trim().parse().ok().filter(|y| *y > 0)?;
  NaiveDate::from_ymd_opt(y, month_number(month)?, 1)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn weekday_tokens_round_trip() {
    for d in Weekday::iter() {
      assert_eq!(Weekday::from_token(d.token()), Some(d));
      assert_eq!(Weekday::from_token(d.english()), Some(d));
    }
    assert_eq!(Weekday::from_token("wed"), Some(Weekday::Wed));
    assert_eq!(Weekday::from_token("x"), None);
    assert!(matches!("x".parse::<Weekday>(), Err(Error::UnknownWeekday(_))));
    assert_eq!("저녁".parse::<TimeSlot>().unwrap(), TimeSlot::Evening);
  }

  #[test]
  fn time_slot_boundaries() {
    assert_eq!(TimeSlot::from_start_time("09:00"), Some(TimeSlot::Morning));
    assert_eq!(TimeSlot::from_start_time("11:59"), Some(TimeSlot::Morning));
    assert_eq!(TimeSlot::from_start_time("12:00"), Some(TimeSlot::Afternoon));
    assert_eq!(TimeSlot::from_start_time("17:30"), Some(TimeSlot::Afternoon));
    assert_eq!(TimeSlot::from_start_time("18:00"), Some(TimeSlot::Evening));
    assert_eq!(TimeSlot::from_start_time("23:10"), Some(TimeSlot::Evening));
    assert_eq!(TimeSlot::from_start_time("??"), None);
    assert_eq!(TimeSlot::from_start_time("ab:00"), None);
  }

  #[test]
  fn start_date_variants() {
    let d = NaiveDate::from_ymd_opt(2024, 3, 4);
    assert_eq!(parse_start_date("2024-03-04"), d);
    assert_eq!(parse_start_date("2024-03-04 00:00:00"), d);
    assert_eq!(parse_start_date("2024.03.04"), d);
    assert_eq!(parse_start_date("2024. 3. 4."), d);
    assert_eq!(parse_start_date("20240304"), d);
    assert_eq!(parse_start_date("45355"), d);
    assert_eq!(parse_start_date("45355.5"), d);
  }

  #[test]
  fn bare_year_and_month_digits_are_not_serials() {
    let d = parse_start_date("2024");
    assert_eq!(d, NaiveDate::from_ymd_opt(2024, 1, 1));
    assert_eq!(year_of(d), "2024");
    assert_eq!(parse_start_date("202403"), NaiveDate::from_ymd_opt(2024, 3, 1));
    for raw in ["12", "1", "999", "2024031", "2958465"] {
      assert_eq!(parse_start_date(raw), None, "input {raw:?}");
    }
  }

  #[test]
  fn unparseable_dates_are_unknown() {
    for raw in ["", "NaT", "nan", "soon", "2024-13-40"] {
      assert_eq!(parse_start_date(raw), None, "input {raw:?}");
    }
  }

  #[test]
  fn year_sentinel() {
    assert_eq!(year_of(None), "0");
    assert_eq!(year_of(NaiveDate::from_ymd_opt(2023, 1, 2)), "2023");
  }

  #[test]
  fn month_helpers() {
    assert_eq!(month_label(3), "3월");
    assert_eq!(month_number("11월"), Some(11));
    assert_eq!(month_number("월"), None);
    assert_eq!(
      month_start("2024", "3월"),
      NaiveDate::from_ymd_opt(2024, 3, 1)
    );
    assert_eq!(month_start("0", "3월"), None);
  }

  #[test]
  fn key_columns_follow_store_schema() {
    let present = ["year", "month", "instructor", "venue", "start_date"];
    assert_eq!(
      KeyColumn::present_in(&present),
      vec![
        KeyColumn::Year,
        KeyColumn::Month,
        KeyColumn::Instructor,
        KeyColumn::Venue
      ]
    );
    assert_eq!(KeyColumn::all().len(), 8);
  }
}
