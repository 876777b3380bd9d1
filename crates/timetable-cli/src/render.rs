//! Plain-text rendering for the terminal.

use std::fmt::Write as _;

use timetable_core::{
  grid::{CoverageMatrix, DayGrid},
  offering::Weekday,
  selection::{InstructorProfile, RosterEntry},
};

/// One line per populated cell: `오전 월  대치 / 물리학 / (정규)`. Entries
/// sharing a cell get a line each. Expects spreadsheet-mode cell text.
pub fn grid_text(grid: &DayGrid) -> String {
  let mut out = String::new();
  for (slot, cells) in grid.rows() {
    for (day, cell) in Weekday::ALL.iter().zip(cells) {
      for entry in cell.split("\n\n").filter(|e| !e.is_empty()) {
        let _ = writeln!(
          out,
          "{} {}  {}",
          slot.label(),
          day.token(),
          entry.replace('\n', " / ")
        );
      }
    }
  }
  if out.is_empty() {
    out.push_str("(no offerings)\n");
  }
  out
}

pub fn profile_text(profile: &InstructorProfile) -> String {
  format!(
    "{} ({})\n  자택 주소: {}\n  최초 강의일: {}\n",
    profile.name,
    profile.status.label(),
    profile.home_address,
    profile.first_offering_display(),
  )
}

pub fn roster_text(roster: &[RosterEntry]) -> String {
  roster.iter().map(|r| format!("{}\n", r.display())).collect()
}

/// Tab-separated, header first.
pub fn coverage_text(matrix: &CoverageMatrix) -> String {
  let mut out = String::from("영역\t과목\t강사");
  for venue in &matrix.venues {
    out.push('\t');
    out.push_str(&venue.replace('\n', " "));
  }
  out.push('\n');
  for row in &matrix.rows {
    let _ = write!(out, "{}\t{}\t{}", row.area, row.subject, row.instructor);
    for cell in &row.cells {
      out.push('\t');
      out.push_str(cell);
    }
    out.push('\n');
  }
  out
}
