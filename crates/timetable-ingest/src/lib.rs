//! Readers for uploaded course listings and reference files.
//!
//! Every reader accepts raw file bytes. Workbooks (xlsx, xls, ods) are tried
//! first; bytes that are not a workbook are read as an HTML document, which
//! is what some listing exports actually are despite their extension (UTF-8
//! or cp949).
//!
//! ```text
//! bytes ─▶ read_workbook ─┬─▶ RawTable ─▶ ingest_table ─▶ Vec<Offering>
//!          read_html ─────┘
//! ```

pub mod error;
pub mod listing;
pub mod reference;
pub mod table;

use std::path::Path;

use timetable_core::{
  offering::Offering,
  reference::{AddressBook, AreaMapping},
};
use tracing::{info, warn};

pub use error::{Error, Result};
pub use listing::{IngestConfig, SourceKind};

use crate::table::{RawTable, read_html, read_workbook};

// ─── Files ───────────────────────────────────────────────────────────────────

/// An uploaded file: a display name and its bytes.
#[derive(Debug, Clone)]
pub struct SourceFile {
  pub name:  String,
  pub bytes: Vec<u8>,
}

impl SourceFile {
  pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
    Self {
      name: name.into(),
      bytes,
    }
  }

  pub fn read(path: &Path) -> Result<Self> {
    let name = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|source| Error::Io {
      file: name.clone(),
      source,
    })?;
    Ok(Self { name, bytes })
  }
}

/// Read the raw cell grid of a file, falling back to HTML.
pub fn read_grid(file: &SourceFile) -> Result<(Vec<Vec<String>>, SourceKind)> {
  match read_workbook(&file.bytes) {
    Ok(grid) => Ok((grid, SourceKind::Workbook)),
    Err(e) => {
      warn!(file = %file.name, error = %e, "not a workbook; trying HTML");
      Ok((read_html(&file.bytes)?, SourceKind::Html))
    }
  }
}

// ─── Listings ────────────────────────────────────────────────────────────────

/// Ingest one listing file.
pub fn ingest_file(file: &SourceFile, config: &IngestConfig) -> Result<Vec<Offering>> {
  let (grid, kind) = read_grid(file)?;
  let table = RawTable::from_grid(grid, config.header_row)?;
  listing::ingest_table(&table, kind, config)
}

/// A file that contributed nothing, and why.
#[derive(Debug)]
pub struct FileFailure {
  pub file:  String,
  pub error: Error,
}

/// The result of ingesting several files.
#[derive(Debug, Default)]
pub struct BatchOutcome {
  pub offerings: Vec<Offering>,
  pub failures:  Vec<FileFailure>,
}

/// Ingest each file independently. A file that fails contributes no rows
/// and is reported in [`BatchOutcome::failures`]; the others are unaffected.
pub fn ingest_batch<'a>(
  files: impl IntoIterator<Item = &'a SourceFile>,
  config: &IngestConfig,
) -> BatchOutcome {
  let mut outcome = BatchOutcome::default();
  for file in files {
    match ingest_file(file, config) {
      Ok(rows) => {
        info!(file = %file.name, rows = rows.len(), "file ingested");
        outcome.offerings.extend(rows);
      }
      Err(error) => {
        warn!(file = %file.name, %error, "file skipped");
        outcome.failures.push(FileFailure {
          file: file.name.clone(),
          error,
        });
      }
    }
  }
  outcome
}

// ─── Reference files ─────────────────────────────────────────────────────────

/// Read an address file (header on the first row).
pub fn read_address_book(file: &SourceFile) -> Result<AddressBook> {
  let (grid, _) = read_grid(file)?;
  reference::address_book_from_table(&RawTable::from_grid(grid, 0)?)
}

/// Read a subject → area mapping file (header on the first row).
pub fn read_area_mapping(file: &SourceFile) -> Result<AreaMapping> {
  let (grid, _) = read_grid(file)?;
  reference::area_mapping_from_table(&RawTable::from_grid(grid, 0)?)
}

#[cfg(test)]
mod tests {
  use rust_xlsxwriter::Workbook;
  use timetable_core::offering::{TimeSlot, Weekday};

  use super::*;

  fn xlsx(rows: &[&[&str]]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (r, row) in rows.iter().enumerate() {
      for (c, value) in row.iter().enumerate() {
        if !value.is_empty() {
          sheet.write_string(r as u32, c as u16, *value).unwrap();
        }
      }
    }
    workbook.save_to_buffer().unwrap()
  }

  const LISTING_HEADER: &[&str] = &[
    "No", "판매", "강좌구분", "개강일", "과정", "강사", "과목", "학원", "수업시간",
  ];

  #[test]
  fn workbook_listing_is_ingested() {
    let bytes = xlsx(&[
      &["2024년 3월 강좌 목록"],
      LISTING_HEADER,
      &["1", "판매", "정규", "2024-03-04", "3월", "김철수", "물리학", "러셀 대치", "월 10:00\n수 19:00"],
      &["2", "폐강", "정규", "2024-03-04", "3월", "이영희", "화학", "목동", "화 10:00"],
    ]);
    let out = ingest_file(
      &SourceFile::new("march.xlsx", bytes),
      &IngestConfig::default(),
    )
    .unwrap();

    assert_eq!(out.len(), 2);
    assert_eq!(out[0].venue, "대치");
    assert_eq!(out[0].weekday, Weekday::Mon);
    assert_eq!(out[1].time_slot, TimeSlot::Evening);
  }

  #[test]
  fn html_export_is_read_when_not_a_workbook() {
    let html = "<html><head><meta charset=\"utf-8\"></head><body><table>
      <tr><td colspan=\"9\">강좌 목록</td></tr>
      <tr><td>No</td><td>판매</td><td>강좌구분</td><td>개강일</td><td>과정</td>
          <td>강사</td><td>과목</td><td>학원</td><td>수업시간</td></tr>
      <tr><td>1</td><td>판매</td><td>정규</td><td>2024-03-04</td><td>3월</td>
          <td>김철수</td><td>물리학</td><td>대치</td><td>월 10:00<br>금 14:00</td></tr>
      <tr><td>합계</td><td></td><td></td><td></td><td></td>
          <td></td><td></td><td></td><td></td></tr>
    </table></body></html>";
    let out = ingest_file(
      &SourceFile::new("march.xls", html.as_bytes().to_vec()),
      &IngestConfig::default(),
    )
    .unwrap();

    assert_eq!(out.len(), 2);
    assert_eq!(out[1].weekday, Weekday::Fri);
    assert_eq!(out[1].time_slot, TimeSlot::Afternoon);
  }

  #[test]
  fn cp949_html_export_is_ingested() {
    let html = "<html><head><meta charset=\"euc-kr\"></head><body><table>
      <tr><td colspan=\"9\">강좌 목록</td></tr>
      <tr><td>No</td><td>판매</td><td>강좌구분</td><td>개강일</td><td>과정</td>
          <td>강사</td><td>과목</td><td>학원</td><td>수업시간</td></tr>
      <tr><td>1</td><td>판매</td><td>정규</td><td>2024-03-04</td><td>3월</td>
          <td>김철수</td><td>물리학</td><td>대치</td><td>목 18:30</td></tr>
    </table></body></html>";
    let (bytes, _, _) = encoding_rs::EUC_KR.encode(html);
    let out = ingest_file(
      &SourceFile::new("march.xls", bytes.into_owned()),
      &IngestConfig::default(),
    )
    .unwrap();

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].instructor, "김철수");
    assert_eq!(out[0].subject, "물리학");
    assert_eq!(out[0].weekday, Weekday::Thu);
    assert_eq!(out[0].time_slot, TimeSlot::Evening);
  }

  #[test]
  fn failing_file_does_not_abort_the_batch() {
    let good = SourceFile::new(
      "good.xlsx",
      xlsx(&[
        &[""],
        LISTING_HEADER,
        &["1", "판매", "정규", "2024-03-04", "3월", "김철수", "물리학", "대치", "월 10:00"],
      ]),
    );
    let missing_column = SourceFile::new(
      "bad.xlsx",
      xlsx(&[&["title"], &["No", "강사"], &["1", "김철수"]]),
    );
    let garbage = SourceFile::new("junk.bin", b"\x00\x01\x02".to_vec());

    let outcome = ingest_batch([&missing_column, &good, &garbage], &IngestConfig::default());
    assert_eq!(outcome.offerings.len(), 1);
    assert_eq!(outcome.failures.len(), 2);
    assert_eq!(outcome.failures[0].file, "bad.xlsx");
    assert!(matches!(outcome.failures[0].error, Error::MissingColumns(_)));
    assert!(matches!(outcome.failures[1].error, Error::NoTable));
  }

  #[test]
  fn reference_files_from_workbooks() {
    let book = read_address_book(&SourceFile::new(
      "addresses.xlsx",
      xlsx(&[&["강사명", "자택 주소"], &["김철수", "서울 강남구"]]),
    ))
    .unwrap();
    assert_eq!(book.address_of("김철수"), "서울 강남구");

    let mapping = read_area_mapping(&SourceFile::new(
      "areas.xlsx",
      xlsx(&[&["선택과목", "영역"], &["물리학", "과학"], &["미적분", "수학"]]),
    ))
    .unwrap();
    assert_eq!(mapping.area_of("미적분"), Some("수학"));
    assert_eq!(mapping.subject_rank("물리학"), Some(0));
  }
}
