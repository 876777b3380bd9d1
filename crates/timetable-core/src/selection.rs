//! Period/area/instructor selection, threaded explicitly through every
//! render instead of living in ambient state.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  enrich::{EnrichedOffering, display_date},
  offering::{month_number, month_start},
};

// ─── Selection ───────────────────────────────────────────────────────────────

/// What the operator is currently looking at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
  pub year:       String,
  pub month:      String,
  pub area:       Option<String>,
  pub subject:    Option<String>,
  pub instructor: Option<String>,
  /// Case-insensitive substring over instructor and subject names.
  pub search:     Option<String>,
}

impl Selection {
  pub fn new(year: impl Into<String>, month: impl Into<String>) -> Self {
    Self {
      year: year.into(),
      month: month.into(),
      ..Self::default()
    }
  }

  pub fn area(mut self, area: Option<String>) -> Self {
    self.area = area;
    self
  }

  pub fn subject(mut self, subject: Option<String>) -> Self {
    self.subject = subject;
    self
  }

  pub fn instructor(mut self, instructor: Option<String>) -> Self {
    self.instructor = instructor;
    self
  }

  pub fn search(mut self, search: Option<String>) -> Self {
    self.search = search.filter(|s| !s.trim().is_empty());
    self
  }

  pub fn matches(&self, e: &EnrichedOffering) -> bool {
    let o = &e.offering;
    o.year == self.year
      && o.month == self.month
      && self.area.as_ref().is_none_or(|a| *a == e.area)
      && self.subject.as_ref().is_none_or(|s| *s == o.subject)
      && self.instructor.as_ref().is_none_or(|i| *i == o.instructor)
      && self.search.as_ref().is_none_or(|q| {
        let q = q.trim().to_lowercase();
        o.instructor.to_lowercase().contains(&q)
          || o.subject.to_lowercase().contains(&q)
      })
  }

  /// The matching offerings, in store order.
  pub fn apply(&self, offerings: &[EnrichedOffering]) -> Vec<EnrichedOffering> {
    offerings
      .iter()
      .filter(|e| self.matches(e))
      .cloned()
      .collect()
  }

  /// First day of the selected month, if year and month are valid.
  pub fn month_start(&self) -> Option<NaiveDate> {
    month_start(&self.year, &self.month)
  }

  /// `"2024 / 3월"`.
  pub fn period_label(&self) -> String {
    format!("{} / {}", self.year, self.month)
  }
}

// ─── Period discovery ────────────────────────────────────────────────────────

/// Distinct years, newest first.
pub fn available_years(offerings: &[EnrichedOffering]) -> Vec<String> {
  let mut years: Vec<&str> =
    offerings.iter().map(|e| e.offering.year.as_str()).collect();
  years.sort_by_key(|y| (y.parse::<i64>().unwrap_or(i64::MIN), *y));
  years.dedup();
  years.into_iter().rev().map(str::to_owned).collect()
}

/// Distinct months of `year`, in calendar order.
pub fn available_months(offerings: &[EnrichedOffering], year: &str) -> Vec<String> {
  let mut months: Vec<&str> = offerings
    .iter()
    .filter(|e| e.offering.year == year)
    .map(|e| e.offering.month.as_str())
    .collect();
  months.sort_by_key(|m| (month_number(m).unwrap_or(u32::MAX), *m));
  months.dedup();
  months.into_iter().map(str::to_owned).collect()
}

// ─── Roster ──────────────────────────────────────────────────────────────────

/// Whether an instructor started teaching in (or after) the selected month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InstructorStatus {
  #[serde(rename = "신규")]
  New,
  #[serde(rename = "기존")]
  Existing,
}

impl InstructorStatus {
  /// New when the first offering date is on or after `month_start`. Unknown
  /// dates on either side count as existing.
  pub fn classify(first: Option<NaiveDate>, month_start: Option<NaiveDate>) -> Self {
    match (first, month_start) {
      (Some(first), Some(start)) if first >= start => Self::New,
      _ => Self::Existing,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::New => "신규",
      Self::Existing => "기존",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
  pub name:                String,
  pub status:              InstructorStatus,
  pub first_offering_date: Option<NaiveDate>,
}

impl RosterEntry {
  /// `"김철수 (신규)"`.
  pub fn display(&self) -> String {
    format!("{} ({})", self.name, self.status.label())
  }
}

/// Unique instructors of an already-filtered set, sorted by name.
pub fn roster(
  filtered: &[EnrichedOffering],
  selection: &Selection,
) -> Vec<RosterEntry> {
  let start = selection.month_start();
  let mut firsts: BTreeMap<&str, Option<NaiveDate>> = BTreeMap::new();
  for e in filtered {
    firsts
      .entry(e.offering.instructor.as_str())
      .or_insert(e.first_offering_date);
  }
  firsts
    .into_iter()
    .map(|(name, first)| RosterEntry {
      name:                name.to_owned(),
      status:              InstructorStatus::classify(first, start),
      first_offering_date: first,
    })
    .collect()
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// The instructor info panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstructorProfile {
  pub name:                String,
  pub home_address:        String,
  pub status:              InstructorStatus,
  pub first_offering_date: Option<NaiveDate>,
}

impl InstructorProfile {
  pub fn first_offering_display(&self) -> String {
    display_date(self.first_offering_date)
  }
}

/// Profile of `name`, looked up over the whole store so that it does not
/// depend on the selected period. `None` if the instructor is unknown.
pub fn profile(
  all: &[EnrichedOffering],
  name: &str,
  selection: &Selection,
) -> Option<InstructorProfile> {
  let e = all.iter().find(|e| e.offering.instructor == name)?;
  Some(InstructorProfile {
    name:                name.to_owned(),
    home_address:        e.home_address.clone(),
    status:              InstructorStatus::classify(
      e.first_offering_date,
      selection.month_start(),
    ),
    first_offering_date: e.first_offering_date,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    enrich::enrich,
    offering::{Offering, TimeSlot, Weekday, parse_start_date, year_of},
    reference::{AddressBook, AreaPolicy},
  };

  fn o(instructor: &str, subject: &str, month: &str, date: &str) -> Offering {
    let start_date = parse_start_date(date);
    Offering {
      year: year_of(start_date),
      month: month.into(),
      instructor: instructor.into(),
      subject: subject.into(),
      weekday: Weekday::Mon,
      time_slot: TimeSlot::Morning,
      venue: "대치".into(),
      course_type: "정규".into(),
      start_date,
    }
  }

  fn store() -> Vec<EnrichedOffering> {
    enrich(
      vec![
        o("김철수", "물리학", "9월", "2023-09-01"),
        o("김철수", "물리학", "3월", "2024-03-04"),
        o("이영희", "Calculus", "3월", "2024-03-05"),
        o("이영희", "Calculus", "10월", "2024-10-01"),
        o("박민수", "화학", "2월", "2024-02-05"),
      ],
      None,
      &AddressBook::default(),
      &AreaPolicy::default(),
    )
  }

  #[test]
  fn periods_are_discovered_in_order() {
    let s = store();
    assert_eq!(available_years(&s), vec!["2024", "2023"]);
    assert_eq!(available_months(&s, "2024"), vec!["2월", "3월", "10월"]);
    assert_eq!(available_months(&s, "2023"), vec!["9월"]);
  }

  #[test]
  fn period_filter_and_search() {
    let s = store();
    let march = Selection::new("2024", "3월").apply(&s);
    assert_eq!(march.len(), 2);

    let searched = Selection::new("2024", "3월")
      .search(Some("calc".into()))
      .apply(&s);
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].offering.instructor, "이영희");

    let by_name = Selection::new("2024", "3월")
      .search(Some("철수".into()))
      .apply(&s);
    assert_eq!(by_name.len(), 1);

    let blank_search = Selection::new("2024", "3월").search(Some("  ".into()));
    assert_eq!(blank_search.search, None);
  }

  #[test]
  fn roster_classifies_new_and_existing() {
    let s = store();
    let sel = Selection::new("2024", "3월");
    let filtered = sel.apply(&s);
    let r = roster(&filtered, &sel);
    assert_eq!(r.len(), 2);
    assert_eq!(r[0].name, "김철수");
    assert_eq!(r[0].status, InstructorStatus::Existing);
    assert_eq!(r[0].display(), "김철수 (기존)");
    assert_eq!(r[1].name, "이영희");
    assert_eq!(r[1].status, InstructorStatus::New);
  }

  #[test]
  fn profile_is_independent_of_period() {
    let s = store();
    let in_2024 = profile(&s, "김철수", &Selection::new("2024", "3월")).unwrap();
    let in_2023 = profile(&s, "김철수", &Selection::new("2023", "9월")).unwrap();
    assert_eq!(in_2024.first_offering_date, in_2023.first_offering_date);
    assert_eq!(in_2024.first_offering_display(), "2023-09-01");
    assert_eq!(in_2024.status, InstructorStatus::Existing);
    assert_eq!(in_2023.status, InstructorStatus::New);
    assert!(profile(&s, "없는사람", &Selection::new("2024", "3월")).is_none());
  }

  #[test]
  fn unknown_dates_count_as_existing() {
    assert_eq!(
      InstructorStatus::classify(None, NaiveDate::from_ymd_opt(2024, 3, 1)),
      InstructorStatus::Existing
    );
    assert_eq!(
      InstructorStatus::classify(NaiveDate::from_ymd_opt(2024, 3, 1), None),
      InstructorStatus::Existing
    );
  }
}
