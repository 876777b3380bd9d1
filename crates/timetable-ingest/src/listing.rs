//! Course listings → canonical offerings.
//!
//! One listing row may describe several weekly sessions (one per line of the
//! schedule column); each becomes its own [`Offering`] sharing every other
//! field of the row.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use timetable_core::{
  dedupe::dedupe_exact,
  normalize::normalize,
  offering::{
    Offering, TimeSlot, Weekday, month_label, parse_start_date, year_of,
  },
};
use tracing::debug;

use crate::{
  Result,
  table::{RawTable, cell},
};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Listing filters. Deserialised from the `[ingest]` section of the
/// configuration file; every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
  /// Status values marking a cancelled course. Exact match.
  pub discontinued_statuses:   Vec<String>,
  /// Course types containing any of these (case-sensitive) are dropped.
  pub excluded_course_markers: Vec<String>,
  /// Brand tokens removed from venue names.
  pub venue_strip_tokens:      Vec<String>,
  /// Sheet row holding the column headers.
  pub header_row:              usize,
}

impl Default for IngestConfig {
  fn default() -> Self {
    Self {
      discontinued_statuses:   vec!["폐강".into(), "discontinued".into()],
      excluded_course_markers: vec!["코어".into(), "core".into()],
      venue_strip_tokens:      vec!["러셀".into(), "CORE".into()],
      header_row:              1,
    }
  }
}

// ─── Columns ─────────────────────────────────────────────────────────────────

const SEQ: (&str, &[&str]) = ("No", &["No", "seq", "번호"]);
const STATUS: (&str, &[&str]) = ("판매", &["판매", "status"]);
const COURSE_TYPE: (&str, &[&str]) = ("강좌구분", &["강좌구분", "course_type"]);
const START_DATE: (&str, &[&str]) = ("개강일", &["개강일", "start_date"]);
const TERM: (&str, &[&str]) = ("과정", &["과정", "term"]);
const INSTRUCTOR: (&str, &[&str]) = ("강사", &["강사", "instructor"]);
const SUBJECT: (&str, &[&str]) = ("과목", &["과목", "subject"]);
const VENUE: (&str, &[&str]) = ("학원", &["학원", "venue"]);
const SCHEDULE: (&str, &[&str]) = ("수업시간", &["수업시간", "schedule"]);

static MONTH_TOKEN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(\d+)\s*월").expect("static regex"));

/// A whole run of ASCII letters, or one Korean weekday character.
static WEEKDAY_TOKEN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"[A-Za-z]+|[월화수목금토일]").expect("static regex"));

static START_TIME: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(\d{1,2}):(\d{2})").expect("static regex"));

// ─── Ingestion ───────────────────────────────────────────────────────────────

/// Where a table came from. HTML exports carry footer and spacer rows, so
/// only rows with a numeric sequence number are kept there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
  Workbook,
  Html,
}

/// Turn one listing table into canonical offerings.
pub fn ingest_table(
  table: &RawTable,
  kind: SourceKind,
  config: &IngestConfig,
) -> Result<Vec<Offering>> {
  let [
    seq,
    status,
    course_type,
    start_date,
    term,
    instructor,
    subject,
    venue,
    schedule,
  ] = table.require([
    SEQ,
    STATUS,
    COURSE_TYPE,
    START_DATE,
    TERM,
    INSTRUCTOR,
    SUBJECT,
    VENUE,
    SCHEDULE,
  ])?;

  let mut out = Vec::new();
  let mut skipped = 0usize;
  for row in &table.rows {
    if kind == SourceKind::Html && !is_sequence_number(cell(row, seq)) {
      continue;
    }

    let status = normalize(cell(row, status));
    if config.discontinued_statuses.iter().any(|s| *s == status) {
      skipped += 1;
      continue;
    }
    let course_type = normalize(cell(row, course_type));
    if config
      .excluded_course_markers
      .iter()
      .any(|m| !m.is_empty() && course_type.contains(m.as_str()))
    {
      skipped += 1;
      continue;
    }

    let start_date = parse_start_date(&normalize(cell(row, start_date)));
    let Some(month) = month_from_term(&normalize(cell(row, term)))
      .or_else(|| start_date.map(|d| chrono::Datelike::month(&d)))
      .filter(|&m| m != 0)
      .map(month_label)
    else {
      skipped += 1;
      continue;
    };
    let instructor = normalize(cell(row, instructor));
    if instructor.is_empty() {
      skipped += 1;
      continue;
    }
    let subject = normalize(cell(row, subject));
    let venue = strip_venue(cell(row, venue), &config.venue_strip_tokens);
    let year = year_of(start_date);

    for (weekday, time_slot) in sessions(cell(row, schedule)) {
      out.push(Offering {
        year: year.clone(),
        month: month.clone(),
        instructor: instructor.clone(),
        subject: subject.clone(),
        weekday,
        time_slot,
        venue: venue.clone(),
        course_type: course_type.clone(),
        start_date,
      });
    }
  }

  let exploded = out.len();
  let out = dedupe_exact(out);
  debug!(
    rows = table.rows.len(),
    skipped,
    exploded,
    kept = out.len(),
    "listing ingested"
  );
  Ok(out)
}

fn is_sequence_number(raw: &str) -> bool {
  raw.trim().parse::<f64>().is_ok_and(f64::is_finite)
}

/// The `N` of the first `N월` token.
fn month_from_term(term: &str) -> Option<u32> {
  MONTH_TOKEN
    .captures(term)
    .and_then(|c| c[1].parse::<u32>().ok())
}

/// Remove brand tokens from a venue name, then normalize.
pub fn strip_venue(raw: &str, tokens: &[String]) -> String {
  let mut venue = normalize(raw);
  for token in tokens.iter().filter(|t| !t.is_empty()) {
    venue = venue.replace(token.as_str(), "");
  }
  normalize(&venue)
}

/// `월`, `Mon` or `Monday` (any case). Other words such as `Monthly` are not
/// weekdays.
fn weekday_word(word: &str) -> Option<Weekday> {
  Weekday::from_token(word).or_else(|| {
    let lower = word.to_ascii_lowercase();
    let day = Weekday::from_token(lower.get(..3)?)?;
    lower.ends_with("day").then_some(day)
  })
}

/// One `(weekday, slot)` per schedule line that names both a weekday and a
/// start time. Lines missing either are dropped.
pub fn sessions(raw: &str) -> Vec<(Weekday, TimeSlot)> {
  normalize(raw)
    .lines()
    .filter_map(|line| {
      // `3월` is a month, not Monday.
      let day = WEEKDAY_TOKEN
        .find_iter(line)
        .filter(|m| {
          !line[..m.start()]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_digit())
        })
        .find_map(|m| weekday_word(m.as_str()))?;
      let hour = START_TIME
        .captures(line)
        .and_then(|c| c[1].parse::<u32>().ok())?;
      Some((day, TimeSlot::from_hour(hour)))
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  const HEADERS: [&str; 9] = [
    "No", "판매", "강좌구분", "개강일", "과정", "강사", "과목", "학원", "수업시간",
  ];

  fn table(rows: &[[&str; 9]]) -> RawTable {
    RawTable {
      headers: HEADERS.map(str::to_owned).to_vec(),
      rows:    rows
        .iter()
        .map(|r| r.map(str::to_owned).to_vec())
        .collect(),
    }
  }

  fn ingest(rows: &[[&str; 9]]) -> Vec<Offering> {
    ingest_table(&table(rows), SourceKind::Workbook, &IngestConfig::default())
      .unwrap()
  }

  #[test]
  fn one_row_explodes_into_one_offering_per_session() {
    let out = ingest_table(
      &RawTable {
        headers: [
          "seq",
          "status",
          "course_type",
          "start_date",
          "term",
          "instructor",
          "subject",
          "venue",
          "schedule",
        ]
        .map(str::to_owned)
        .to_vec(),
        rows:    vec![
          [
            "1",
            "active",
            "regular",
            "2024-03-04",
            "3월반",
            "Kim",
            "Algebra",
            "CenterA\\nCenterB",
            "Mon 09:00\\nWed 15:00",
          ]
          .map(str::to_owned)
          .to_vec(),
        ],
      },
      SourceKind::Workbook,
      &IngestConfig::default(),
    )
    .unwrap();

    assert_eq!(out.len(), 2);
    assert_eq!(out[0].weekday, Weekday::Mon);
    assert_eq!(out[0].time_slot, TimeSlot::Morning);
    assert_eq!(out[1].weekday, Weekday::Wed);
    assert_eq!(out[1].time_slot, TimeSlot::Afternoon);
    for o in &out {
      assert_eq!(o.year, "2024");
      assert_eq!(o.month, "3월");
      assert_eq!(o.instructor, "Kim");
      assert_eq!(o.subject, "Algebra");
      assert_eq!(o.venue, "CenterA\nCenterB");
      assert_eq!(o.course_type, "regular");
      assert_eq!(o.start_date, NaiveDate::from_ymd_opt(2024, 3, 4));
    }
  }

  #[test]
  fn discontinued_and_core_courses_are_dropped() {
    let out = ingest(&[
      ["1", "폐강", "정규", "2024-03-04", "3월", "김", "물리학", "대치", "월 10:00"],
      ["2", "판매", "코어반", "2024-03-04", "3월", "김", "물리학", "대치", "월 10:00"],
      ["3", "판매", "core", "2024-03-04", "3월", "김", "물리학", "대치", "화 10:00"],
      ["4", "판매", "Core", "2024-03-04", "3월", "김", "물리학", "대치", "수 10:00"],
    ]);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].course_type, "Core");
  }

  #[test]
  fn month_falls_back_to_start_date() {
    let out = ingest(&[
      ["1", "판매", "정규", "2024-05-02", "여름 특강", "김", "물리학", "대치", "토 19:00"],
      ["2", "판매", "정규", "", "0월", "이", "화학", "대치", "토 19:00"],
    ]);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].month, "5월");
    assert_eq!(out[0].time_slot, TimeSlot::Evening);
  }

  #[test]
  fn unknown_start_date_gives_year_zero() {
    let out = ingest(&[[
      "1", "판매", "정규", "미정", "3월", "김", "물리학", "대치", "월 10:00",
    ]]);
    assert_eq!(out[0].year, "0");
    assert_eq!(out[0].start_date, None);
  }

  #[test]
  fn brand_tokens_are_stripped_from_venue() {
    let out = ingest(&[[
      "1", "판매", "정규", "2024-03-04", "3월", "김", "물리학", " 러셀 대치 ", "월 10:00",
    ]]);
    assert_eq!(out[0].venue, "대치");
    assert_eq!(
      strip_venue("CORE 목동", &IngestConfig::default().venue_strip_tokens),
      "목동"
    );
  }

  #[test]
  fn rows_without_instructor_or_session_are_dropped() {
    let out = ingest(&[
      ["1", "판매", "정규", "2024-03-04", "3월", "nan", "물리학", "대치", "월 10:00"],
      ["2", "판매", "정규", "2024-03-04", "3월", "김", "물리학", "대치", "시간 미정"],
      ["3", "판매", "정규", "2024-03-04", "3월", "김", "물리학", "대치", "월요일"],
    ]);
    assert!(out.is_empty());
  }

  #[test]
  fn exact_duplicates_collapse() {
    let row = ["1", "판매", "정규", "2024-03-04", "3월", "김", "물리학", "대치", "월 10:00"];
    let out = ingest(&[row, row]);
    assert_eq!(out.len(), 1);
  }

  #[test]
  fn html_tables_keep_only_numbered_rows() {
    let t = table(&[
      ["1", "판매", "정규", "2024-03-04", "3월", "김", "물리학", "대치", "월 10:00"],
      ["합계", "", "", "", "3월", "김", "", "", "화 10:00"],
    ]);
    let html = ingest_table(&t, SourceKind::Html, &IngestConfig::default()).unwrap();
    assert_eq!(html.len(), 1);
    let workbook =
      ingest_table(&t, SourceKind::Workbook, &IngestConfig::default()).unwrap();
    assert_eq!(workbook.len(), 2);
  }

  #[test]
  fn missing_columns_are_reported() {
    let t = RawTable {
      headers: vec!["No".into(), "강사".into()],
      rows:    Vec::new(),
    };
    let err = ingest_table(&t, SourceKind::Workbook, &IngestConfig::default())
      .unwrap_err();
    assert!(err.to_string().contains("수업시간"));
  }

  #[test]
  fn session_parsing() {
    assert_eq!(
      sessions("월 09:00~10:30\n목 18:30~21:00"),
      vec![(Weekday::Mon, TimeSlot::Morning), (Weekday::Thu, TimeSlot::Evening)]
    );
    assert_eq!(sessions("fri 7:30"), vec![(Weekday::Fri, TimeSlot::Morning)]);
    assert_eq!(sessions("nan"), vec![]);
    assert_eq!(
      sessions("3월 화 19:00"),
      vec![(Weekday::Tue, TimeSlot::Evening)]
    );
    assert_eq!(
      sessions("Monthly Tue 10:00\nSaturday 13:00"),
      vec![
        (Weekday::Tue, TimeSlot::Morning),
        (Weekday::Sat, TimeSlot::Afternoon),
      ]
    );
    assert_eq!(sessions("Sunset 10:00"), vec![]);
  }
}
