//! Reference data: the subject → area taxonomy, the instructor address book,
//! and the area display policy.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::normalize::normalize;

/// Rendered in place of a missing home address.
pub const UNKNOWN_ADDRESS: &str = "정보 없음";

// ─── AreaPolicy ──────────────────────────────────────────────────────────────

/// Area labels and ordering rules. Deserialised from the `[areas]` section
/// of the configuration file; every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaPolicy {
  /// Display precedence of areas. Areas not listed sort after all of these.
  pub priority:          Vec<String>,
  /// Areas whose subject name is left out of timetable cells.
  pub suppress_subject:  Vec<String>,
  /// Area given to subjects the mapping table does not list.
  pub unmapped_fallback: String,
  /// Area given to every subject when no mapping table is available.
  pub missing_fallback:  String,
}

impl Default for AreaPolicy {
  fn default() -> Self {
    Self {
      priority:          ["국어", "수학", "영어", "사회", "과학", "논술/제2외국어", "한국사"]
        .map(str::to_owned)
        .to_vec(),
      suppress_subject:  ["국어", "수학", "영어", "한국사"]
        .map(str::to_owned)
        .to_vec(),
      unmapped_fallback: "한국사".to_owned(),
      missing_fallback:  "기타".to_owned(),
    }
  }
}

impl AreaPolicy {
  /// Position of `area` in the priority list; `None` for unranked areas.
  pub fn rank(&self, area: &str) -> Option<usize> {
    self.priority.iter().position(|a| a == area)
  }

  pub fn suppresses_subject(&self, area: &str) -> bool {
    self.suppress_subject.iter().any(|a| a == area)
  }
}

// ─── AreaMapping ─────────────────────────────────────────────────────────────

/// One row of the subject taxonomy table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaMappingRow {
  pub selected_subject: String,
  pub area:             String,
}

/// The subject → area table. Row order is the subject display rank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AreaMapping {
  rows:    Vec<AreaMappingRow>,
  by_name: HashMap<String, usize>,
}

impl AreaMapping {
  /// Build from rows in display order. Blank subjects are ignored; for a
  /// subject listed twice the first row wins.
  pub fn new(rows: impl IntoIterator<Item = AreaMappingRow>) -> Self {
    let mut mapping = Self::default();
    for row in rows {
      let subject = normalize(&row.selected_subject);
      if subject.is_empty() || mapping.by_name.contains_key(&subject) {
        continue;
      }
      mapping.by_name.insert(subject.clone(), mapping.rows.len());
      mapping.rows.push(AreaMappingRow {
        selected_subject: subject,
        area:             normalize(&row.area),
      });
    }
    mapping
  }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  pub fn rows(&self) -> &[AreaMappingRow] { &self.rows }

  pub fn area_of(&self, subject: &str) -> Option<&str> {
    self
      .by_name
      .get(subject)
      .map(|&i| self.rows[i].area.as_str())
  }

  /// Row position of `subject`; `None` for subjects not in the table.
  pub fn subject_rank(&self, subject: &str) -> Option<usize> {
    self.by_name.get(subject).copied()
  }
}

// ─── AddressBook ─────────────────────────────────────────────────────────────

/// One row of the address table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressEntry {
  pub instructor_name: String,
  pub home_address:    String,
}

/// Instructor → home address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressBook {
  entries: Vec<AddressEntry>,
  by_name: HashMap<String, usize>,
}

impl AddressBook {
  /// Build from rows. The first row for an instructor wins.
  pub fn new(entries: impl IntoIterator<Item = AddressEntry>) -> Self {
    let mut book = Self::default();
    for entry in entries {
      let name = normalize(&entry.instructor_name);
      if name.is_empty() || book.by_name.contains_key(&name) {
        continue;
      }
      book.by_name.insert(name.clone(), book.entries.len());
      book.entries.push(AddressEntry {
        instructor_name: name,
        home_address:    normalize(&entry.home_address),
      });
    }
    book
  }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  pub fn entries(&self) -> &[AddressEntry] { &self.entries }

  /// Home address of `instructor`, or [`UNKNOWN_ADDRESS`]. Never empty.
  pub fn address_of(&self, instructor: &str) -> &str {
    self
      .by_name
      .get(instructor)
      .map(|&i| self.entries[i].home_address.as_str())
      .filter(|a| !a.is_empty())
      .unwrap_or(UNKNOWN_ADDRESS)
  }
}
