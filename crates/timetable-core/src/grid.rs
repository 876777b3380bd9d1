//! Pivoted views over a filtered set of enriched offerings.
//!
//! - [`CoverageMatrix`]: (area, subject, instructor) × venue presence grid.
//! - [`DayGrid`]: one instructor's fixed 3 × 7 time-slot × weekday grid.
//! - [`area_sheet`]: every instructor of an area as a stack of day grids,
//!   laid out as spreadsheet rows with computed heights.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use strum::IntoEnumIterator;

use crate::{
  enrich::EnrichedOffering,
  format::{CellTextFormatter, escape_html},
  normalize::normalize,
  offering::{TimeSlot, Weekday},
  reference::{AreaMapping, AreaPolicy},
};

/// Marks a venue an instructor teaches at in the coverage matrix.
pub const PRESENCE_MARK: &str = "■";

/// Height of a grid row with single-line cells.
pub const BASE_ROW_HEIGHT: f64 = 60.0;
/// Extra height per line break in the tallest cell of a row.
pub const LINE_HEIGHT: f64 = 16.0;
/// Blank rows after each instructor block.
pub const BLOCK_PADDING_ROWS: usize = 2;

const SLOTS: usize = 3;
const DAYS: usize = 7;

fn rank_key(rank: Option<usize>) -> usize { rank.unwrap_or(usize::MAX) }

// ─── Coverage matrix ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageRow {
  pub area:       String,
  pub subject:    String,
  pub instructor: String,
  /// One entry per venue column: [`PRESENCE_MARK`] or `""`.
  pub cells:      Vec<String>,
}

/// Instructor × venue presence grid.
///
/// Venue columns are in first-encountered order. Any stable order would do;
/// callers must not depend on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoverageMatrix {
  pub venues: Vec<String>,
  pub rows:   Vec<CoverageRow>,
}

impl CoverageMatrix {
  /// Rows sort by area priority, then mapping-table subject order, then
  /// instructor name. Unranked areas and subjects go last, grouped by name.
  pub fn build(
    offerings: &[EnrichedOffering],
    mapping: Option<&AreaMapping>,
    policy: &AreaPolicy,
  ) -> Self {
    let mut venues: Vec<String> = Vec::new();
    let mut venue_index: HashMap<&str, usize> = HashMap::new();
    let mut presence: HashMap<(&str, &str, &str), HashSet<usize>> =
      HashMap::new();

    for e in offerings {
      let venue = e.offering.venue.as_str();
      let col = *venue_index.entry(venue).or_insert_with(|| {
        venues.push(venue.to_owned());
        venues.len() - 1
      });
      presence
        .entry((
          e.area.as_str(),
          e.offering.subject.as_str(),
          e.offering.instructor.as_str(),
        ))
        .or_default()
        .insert(col);
    }

    let mut keys: Vec<_> = presence.keys().copied().collect();
    keys.sort_by_key(|&(area, subject, instructor)| {
      (
        rank_key(policy.rank(area)),
        area,
        rank_key(mapping.and_then(|m| m.subject_rank(subject))),
        subject,
        instructor,
      )
    });

    let rows = keys
      .into_iter()
      .map(|key| {
        let cols = &presence[&key];
        let (area, subject, instructor) = key;
        CoverageRow {
          area:       area.to_owned(),
          subject:    subject.to_owned(),
          instructor: instructor.to_owned(),
          cells:      (0..venues.len())
            .map(|c| {
              let mark = if cols.contains(&c) { PRESENCE_MARK } else { "" };
              mark.to_owned()
            })
            .collect(),
        }
      })
      .collect();

    Self { venues, rows }
  }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }
}

// ─── Day/time grid ───────────────────────────────────────────────────────────

/// One instructor's weekly grid: always 3 slot rows × 7 weekday columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayGrid {
  pub instructor: String,
  cells:          [[String; DAYS]; SLOTS],
}

impl DayGrid {
  /// Gather `instructor`'s offerings per (slot, weekday) and render each
  /// cell with `formatter`. Offerings of other instructors are ignored.
  pub fn build<'o>(
    instructor: &str,
    offerings: impl IntoIterator<Item = &'o EnrichedOffering>,
    formatter: &CellTextFormatter<'_>,
  ) -> Self {
    let mut buckets: [[Vec<&EnrichedOffering>; DAYS]; SLOTS] = Default::default();
    for e in offerings {
      if e.offering.instructor == instructor {
        buckets[e.offering.time_slot as usize][e.offering.weekday as usize]
          .push(e);
      }
    }

    let mut cells: [[String; DAYS]; SLOTS] = Default::default();
    for (slot_cells, slot_buckets) in cells.iter_mut().zip(&buckets) {
      for (cell, bucket) in slot_cells.iter_mut().zip(slot_buckets) {
        *cell = formatter.format_cell(bucket.iter().copied());
      }
    }

    Self {
      instructor: instructor.to_owned(),
      cells,
    }
  }

  pub fn cell(&self, slot: TimeSlot, day: Weekday) -> &str {
    &self.cells[slot as usize][day as usize]
  }

  /// Rows in Morning, Afternoon, Evening order.
  pub fn rows(&self) -> impl Iterator<Item = (TimeSlot, &[String; DAYS])> {
    TimeSlot::iter().zip(self.cells.iter())
  }

  pub fn populated_cells(&self) -> usize {
    self.cells.iter().flatten().filter(|c| !c.is_empty()).count()
  }

  /// Screen markup. Cell text is expected to come from a
  /// [`crate::format::RenderMode::Screen`] formatter and is inserted as-is.
  pub fn to_html(&self) -> String {
    let mut html = String::from("<table class=\"timetable\">\n<thead>\n<tr><th></th>");
    for day in Weekday::iter() {
      html.push_str(&format!("<th>{}</th>", day.token()));
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");
    for (slot, cells) in self.rows() {
      html.push_str(&format!("<tr><th>{}</th>", escape_html(slot.label())));
      for cell in cells {
        html.push_str(&format!("<td>{cell}</td>"));
      }
      html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");
    html
  }
}

// ─── Area sheets ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowKind {
  Title,
  Header,
  Slot,
  Blank,
}

/// One spreadsheet row of an area sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetRow {
  pub kind:   RowKind,
  pub cells:  Vec<String>,
  /// Explicit row height; `None` keeps the sheet default.
  pub height: Option<f64>,
}

/// A named sheet of rows, ready to be written cell by cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetLayout {
  pub name: String,
  pub rows: Vec<SheetRow>,
}

/// `BASE_ROW_HEIGHT + LINE_HEIGHT × max line breaks` over `cells`.
pub fn row_height(cells: &[String]) -> f64 {
  let breaks = cells
    .iter()
    .map(|c| c.matches('\n').count())
    .max()
    .unwrap_or(0);
  BASE_ROW_HEIGHT + LINE_HEIGHT * breaks as f64
}

/// Areas present in `offerings`, in priority order (unranked last, by name).
pub fn areas_in_order(
  offerings: &[EnrichedOffering],
  policy: &AreaPolicy,
) -> Vec<String> {
  let mut areas: Vec<&str> = offerings.iter().map(|e| e.area.as_str()).collect();
  areas.sort_by_key(|a| (rank_key(policy.rank(a)), *a));
  areas.dedup();
  areas.into_iter().map(str::to_owned).collect()
}

/// (subject, instructor) blocks of one area, ordered by subject rank,
/// subject name, then instructor. An instructor appears once, under the
/// first subject they were reached through. Offerings with neither venue nor
/// subject never render, so they do not open a block.
pub fn area_blocks(
  offerings: &[EnrichedOffering],
  area: &str,
  mapping: Option<&AreaMapping>,
) -> Vec<(String, String)> {
  let mut pairs: Vec<(&str, &str)> = offerings
    .iter()
    .filter(|e| e.area == area)
    .filter(|e| {
      !normalize(&e.offering.venue).is_empty() || !normalize(&e.offering.subject).is_empty()
    })
    .map(|e| (e.offering.subject.as_str(), e.offering.instructor.as_str()))
    .collect();
  pairs.sort_by_key(|&(subject, instructor)| {
    (
      rank_key(mapping.and_then(|m| m.subject_rank(subject))),
      subject,
      instructor,
    )
  });

  let mut seen: HashSet<&str> = HashSet::new();
  pairs
    .into_iter()
    .filter(|&(_, instructor)| seen.insert(instructor))
    .map(|(s, i)| (s.to_owned(), i.to_owned()))
    .collect()
}

/// Lay out every instructor block of `area`.
///
/// Each block is a title row, a weekday header row, the three slot rows
/// (height from [`row_height`]), then [`BLOCK_PADDING_ROWS`] blank rows.
///
/// Blocks come from `selected`; each grid shows all of the instructor's
/// offerings in `in_period`, not only those of this area. Pass the same
/// slice twice when nothing narrows the period. `formatter` should be in
/// spreadsheet mode.
pub fn area_sheet(
  area: &str,
  selected: &[EnrichedOffering],
  in_period: &[EnrichedOffering],
  mapping: Option<&AreaMapping>,
  formatter: &CellTextFormatter<'_>,
  period: &str,
) -> SheetLayout {
  let mut rows = Vec::new();
  for (subject, instructor) in area_blocks(selected, area, mapping) {
    let mut title = instructor.clone();
    if !subject.is_empty() {
      title.push_str(&format!(" ({subject})"));
    }
    if !period.is_empty() {
      title.push(' ');
      title.push_str(period);
    }
    rows.push(SheetRow {
      kind:   RowKind::Title,
      cells:  vec![title],
      height: None,
    });

    let mut header = vec![String::new()];
    header.extend(Weekday::iter().map(|d| d.token().to_owned()));
    rows.push(SheetRow {
      kind:   RowKind::Header,
      cells:  header,
      height: None,
    });

    let grid = DayGrid::build(&instructor, in_period, formatter);
    for (slot, cells) in grid.rows() {
      let mut row = vec![slot.label().to_owned()];
      row.extend(cells.iter().cloned());
      rows.push(SheetRow {
        kind:   RowKind::Slot,
        height: Some(row_height(&row)),
        cells:  row,
      });
    }

    for _ in 0..BLOCK_PADDING_ROWS {
      rows.push(SheetRow {
        kind:   RowKind::Blank,
        cells:  Vec::new(),
        height: None,
      });
    }
  }

  SheetLayout {
    name: area.to_owned(),
    rows,
  }
}

/// One [`area_sheet`] per area present in `selected`, in area priority
/// order.
pub fn combined_sheets(
  selected: &[EnrichedOffering],
  in_period: &[EnrichedOffering],
  mapping: Option<&AreaMapping>,
  policy: &AreaPolicy,
  formatter: &CellTextFormatter<'_>,
  period: &str,
) -> Vec<SheetLayout> {
  areas_in_order(selected, policy)
    .iter()
    .map(|area| area_sheet(area, selected, in_period, mapping, formatter, period))
    .collect()
}
