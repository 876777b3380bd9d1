//! Spreadsheet output: the coverage matrix, the per-area timetable workbook
//! and a flat dump of the selected offerings.
//!
//! Every writer returns the workbook as bytes; callers decide where they go.

pub mod error;
pub mod sheet_name;

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use timetable_core::{
  enrich::{EnrichedOffering, display_date},
  grid::{CoverageMatrix, RowKind, SheetLayout},
};
use tracing::debug;

pub use error::{Error, Result};
pub use sheet_name::SheetNames;

/// Header of the coverage sheet, before the venue columns.
pub const COVERAGE_HEADER: [&str; 3] = ["영역", "과목", "강사"];

/// Header of the offerings dump.
pub const DUMP_HEADER: [&str; 12] = [
  "연도",
  "월",
  "강사",
  "과목",
  "요일",
  "시간대",
  "학원",
  "강좌구분",
  "개강일",
  "영역",
  "자택 주소",
  "최초 강의일",
];

struct Formats {
  title:  Format,
  header: Format,
  slot:   Format,
  cell:   Format,
}

impl Formats {
  fn new() -> Self {
    Self {
      title:  Format::new().set_bold().set_font_size(13),
      header: Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin)
        .set_background_color(0xF2F2F2),
      slot:   Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin),
      cell:   Format::new()
        .set_text_wrap()
        .set_align(FormatAlign::Top)
        .set_border(FormatBorder::Thin),
    }
  }
}

fn write_header(sheet: &mut Worksheet, row: u32, cells: &[&str], format: &Format) -> Result<()> {
  for (col, text) in cells.iter().enumerate() {
    sheet.write_string_with_format(row, col as u16, *text, format)?;
  }
  Ok(())
}

// ─── Coverage ────────────────────────────────────────────────────────────────

/// One sheet: `영역, 과목, 강사` then one column per venue.
pub fn coverage_workbook(matrix: &CoverageMatrix) -> Result<Vec<u8>> {
  let formats = Formats::new();
  let mut workbook = Workbook::new();
  let sheet = workbook.add_worksheet();
  sheet.set_name("커버리지")?;

  let mut header: Vec<&str> = COVERAGE_HEADER.to_vec();
  header.extend(matrix.venues.iter().map(String::as_str));
  write_header(sheet, 0, &header, &formats.header)?;

  let center = Format::new().set_align(FormatAlign::Center);
  for (i, row) in matrix.rows.iter().enumerate() {
    let r = i as u32 + 1;
    sheet.write_string(r, 0, &row.area)?;
    sheet.write_string(r, 1, &row.subject)?;
    sheet.write_string(r, 2, &row.instructor)?;
    for (j, mark) in row.cells.iter().enumerate() {
      if !mark.is_empty() {
        sheet.write_string_with_format(r, (j + COVERAGE_HEADER.len()) as u16, mark, &center)?;
      }
    }
  }
  sheet.set_column_width(0, 14)?;
  sheet.set_column_width(1, 18)?;
  sheet.set_column_width(2, 12)?;
  sheet.set_freeze_panes(1, COVERAGE_HEADER.len() as u16)?;

  debug!(rows = matrix.rows.len(), venues = matrix.venues.len(), "coverage sheet written");
  Ok(workbook.save_to_buffer()?)
}

// ─── Timetable grids ─────────────────────────────────────────────────────────

/// One sheet per layout. Slot rows wrap text and take the layout's height.
pub fn grid_workbook(layouts: &[SheetLayout]) -> Result<Vec<u8>> {
  let formats = Formats::new();
  let mut workbook = Workbook::new();
  let mut names = SheetNames::new();

  for layout in layouts {
    let sheet = workbook.add_worksheet();
    sheet.set_name(names.assign(&layout.name))?;
    sheet.set_column_width(0, 8)?;
    for col in 1..=7u16 {
      sheet.set_column_width(col, 22)?;
    }

    for (i, row) in layout.rows.iter().enumerate() {
      let r = i as u32;
      match row.kind {
        RowKind::Blank => {}
        RowKind::Title => {
          if let Some(title) = row.cells.first() {
            sheet.write_string_with_format(r, 0, title, &formats.title)?;
          }
        }
        RowKind::Header => {
          let cells: Vec<&str> = row.cells.iter().map(String::as_str).collect();
          write_header(sheet, r, &cells, &formats.header)?;
        }
        RowKind::Slot => {
          for (col, text) in row.cells.iter().enumerate() {
            let format = if col == 0 { &formats.slot } else { &formats.cell };
            sheet.write_string_with_format(r, col as u16, text, format)?;
          }
        }
      }
      if let Some(height) = row.height {
        sheet.set_row_height(r, height)?;
      }
    }
  }

  debug!(sheets = layouts.len(), "grid workbook written");
  Ok(workbook.save_to_buffer()?)
}

// ─── Dump ────────────────────────────────────────────────────────────────────

/// The offerings as a flat table, one row each.
pub fn dump_workbook(offerings: &[EnrichedOffering]) -> Result<Vec<u8>> {
  let formats = Formats::new();
  let mut workbook = Workbook::new();
  let sheet = workbook.add_worksheet();
  sheet.set_name("강의 목록")?;
  write_header(sheet, 0, &DUMP_HEADER, &formats.header)?;

  let wrap = Format::new().set_text_wrap();
  for (i, e) in offerings.iter().enumerate() {
    let r = i as u32 + 1;
    let o = &e.offering;
    let start = o
      .start_date
      .map(|d| d.format("%Y-%m-%d").to_string())
      .unwrap_or_default();
    let first = display_date(e.first_offering_date);
    let cells = [
      o.year.as_str(),
      o.month.as_str(),
      o.instructor.as_str(),
      o.subject.as_str(),
      o.weekday.token(),
      o.time_slot.label(),
      o.venue.as_str(),
      o.course_type.as_str(),
      start.as_str(),
      e.area.as_str(),
      e.home_address.as_str(),
      first.as_str(),
    ];
    for (col, text) in cells.iter().enumerate() {
      if text.contains('\n') {
        sheet.write_string_with_format(r, col as u16, *text, &wrap)?;
      } else {
        sheet.write_string(r, col as u16, *text)?;
      }
    }
  }
  sheet.set_freeze_panes(1, 0)?;
  sheet.autofit();

  debug!(rows = offerings.len(), "offerings dump written");
  Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
  use std::io::Cursor;

  use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
  use timetable_core::{
    format::{CellTextFormatter, RenderMode},
    grid::{CoverageRow, PRESENCE_MARK, combined_sheets},
    offering::{Offering, TimeSlot, Weekday},
    reference::AreaPolicy,
  };

  use super::*;

  fn read(bytes: Vec<u8>) -> Xlsx<Cursor<Vec<u8>>> {
    open_workbook_from_rs(Cursor::new(bytes)).unwrap()
  }

  fn text(d: &Data) -> String {
    match d {
      Data::Empty => String::new(),
      other => other.to_string(),
    }
  }

  fn e(instructor: &str, subject: &str, area: &str, day: Weekday, slot: TimeSlot) -> EnrichedOffering {
    EnrichedOffering {
      offering:            Offering {
        year: "2024".into(),
        month: "3월".into(),
        instructor: instructor.into(),
        subject: subject.into(),
        weekday: day,
        time_slot: slot,
        venue: "대치\n센터".into(),
        course_type: "정규".into(),
        start_date: chrono::NaiveDate::from_ymd_opt(2024, 3, 4),
      },
      area:                area.into(),
      home_address:        "서울".into(),
      first_offering_date: chrono::NaiveDate::from_ymd_opt(2023, 9, 1),
    }
  }

  #[test]
  fn coverage_sheet_has_header_and_marks() {
    let matrix = CoverageMatrix {
      venues: vec!["대치".into(), "목동".into()],
      rows:   vec![CoverageRow {
        area:       "과학".into(),
        subject:    "물리학".into(),
        instructor: "김".into(),
        cells:      vec![String::new(), PRESENCE_MARK.into()],
      }],
    };
    let mut wb = read(coverage_workbook(&matrix).unwrap());
    let range = wb.worksheet_range("커버리지").unwrap();
    let header: Vec<String> = range.rows().next().unwrap().iter().map(text).collect();
    assert_eq!(header, vec!["영역", "과목", "강사", "대치", "목동"]);
    assert_eq!(text(range.get_value((1, 4)).unwrap()), PRESENCE_MARK);
    assert_eq!(range.get_value((1, 3)).map(text).unwrap_or_default(), "");
  }

  #[test]
  fn grid_workbook_has_one_sheet_per_area() {
    let policy = AreaPolicy::default();
    let formatter = CellTextFormatter::new(&policy, RenderMode::Spreadsheet);
    let offerings = vec![
      e("김", "물리학", "과학", Weekday::Mon, TimeSlot::Morning),
      e("이", "미적분", "수학", Weekday::Tue, TimeSlot::Evening),
      e("박", "윤리", "논술/제2외국어", Weekday::Sat, TimeSlot::Afternoon),
    ];
    let layouts = combined_sheets(&offerings, &offerings, None, &policy, &formatter, "2024 / 3월");
    let mut wb = read(grid_workbook(&layouts).unwrap());

    assert_eq!(wb.sheet_names(), vec!["수학", "과학", "논술_제2외국어"]);

    let science = wb.worksheet_range("과학").unwrap();
    assert_eq!(text(science.get_value((0, 0)).unwrap()), "김 (물리학) 2024 / 3월");
    assert_eq!(text(science.get_value((1, 1)).unwrap()), "월");
    assert_eq!(text(science.get_value((2, 0)).unwrap()), "오전");
    assert_eq!(
      text(science.get_value((2, 1)).unwrap()),
      "대치\n센터\n물리학\n(정규)"
    );
  }

  #[test]
  fn dump_lists_every_offering() {
    let offerings = vec![
      e("김", "물리학", "과학", Weekday::Mon, TimeSlot::Morning),
      e("김", "물리학", "과학", Weekday::Wed, TimeSlot::Afternoon),
    ];
    let mut wb = read(dump_workbook(&offerings).unwrap());
    let range = wb.worksheet_range("강의 목록").unwrap();
    assert_eq!(range.height(), 3);
    assert_eq!(text(range.get_value((0, 0)).unwrap()), "연도");
    assert_eq!(text(range.get_value((2, 4)).unwrap()), "수");
    assert_eq!(text(range.get_value((2, 11)).unwrap()), "2023-09-01");
  }
}
