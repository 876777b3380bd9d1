//! Raw cell grids from uploaded files.
//!
//! Two readers produce the same `Vec<Vec<String>>` shape: a workbook reader
//! (first sheet, any format calamine understands) and an HTML reader (first
//! `<table>` in the document). [`RawTable`] then splits off the header row.

use std::{
  borrow::Cow,
  io::Cursor,
  sync::LazyLock,
};

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use encoding_rs::{EUC_KR, Encoding, UTF_8};
use regex::bytes::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use timetable_core::normalize::normalize;
use tracing::{debug, warn};

use crate::{Error, Result};

// ─── Workbook ────────────────────────────────────────────────────────────────

/// Read the first sheet of an xlsx/xls/ods workbook.
///
/// Rows above the used range are kept as empty rows so that row indices
/// match the sheet.
pub fn read_workbook(bytes: &[u8]) -> Result<Vec<Vec<String>>> {
  let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
  let sheet = workbook
    .sheet_names()
    .first()
    .cloned()
    .ok_or(Error::NoSheet)?;
  let range = workbook.worksheet_range(&sheet)?;

  let (first_row, first_col) = range.start().unwrap_or((0, 0));
  let mut grid: Vec<Vec<String>> = vec![Vec::new(); first_row as usize];
  for row in range.rows() {
    let mut cells = vec![String::new(); first_col as usize];
    cells.extend(row.iter().map(cell_to_string));
    grid.push(cells);
  }
  Ok(grid)
}

fn cell_to_string(cell: &Data) -> String {
  match cell {
    Data::Empty => String::new(),
    Data::DateTime(dt) => dt
      .as_datetime()
      .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
      .unwrap_or_default(),
    other => other.to_string(),
  }
}

// ─── HTML ────────────────────────────────────────────────────────────────────

static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"(?i)<meta[^>]*charset\s*=\s*["']?([A-Za-z0-9_:.\-]+)"#)
    .expect("static regex")
});

/// Decode an HTML export. A byte-order mark wins, then valid UTF-8, then the
/// document's `<meta charset>`, then EUC-KR (cp949).
pub fn decode_html(bytes: &[u8]) -> Cow<'_, str> {
  if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
    return encoding.decode_without_bom_handling(&bytes[bom_len..]).0;
  }
  if let Ok(text) = std::str::from_utf8(bytes) {
    return Cow::Borrowed(text);
  }

  let declared = META_CHARSET
    .captures(&bytes[..bytes.len().min(4096)])
    .and_then(|c| Encoding::for_label(&c[1]))
    .filter(|e| *e != UTF_8);
  let encoding = declared.unwrap_or(EUC_KR);
  let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
  if had_errors {
    warn!(encoding = encoding.name(), "undecodable bytes in HTML export");
  } else {
    debug!(encoding = encoding.name(), "HTML export decoded");
  }
  text
}

/// Read the first `<table>` of an HTML document. `<br>` inside a cell
/// becomes a line break; other whitespace runs collapse to one space. A cell
/// with `colspan=N` is repeated N times. Rows of tables nested inside it are
/// not part of it.
pub fn read_html(bytes: &[u8]) -> Result<Vec<Vec<String>>> {
  let text = decode_html(bytes);
  let document = Html::parse_document(&text);

  let table_sel = Selector::parse("table").expect("static selector");
  let table = document.select(&table_sel).next().ok_or(Error::NoTable)?;
  let grid = own_rows(table)
    .map(|tr| {
      let mut cells = Vec::new();
      for cell in child_elements(tr).filter(|c| matches!(c.value().name(), "th" | "td")) {
        let text = cell_text(cell);
        let span = cell
          .value()
          .attr("colspan")
          .and_then(|s| s.trim().parse::<usize>().ok())
          .filter(|&n| n > 1)
          .unwrap_or(1);
        cells.extend(std::iter::repeat_n(text, span));
      }
      cells
    })
    .collect();
  Ok(grid)
}

fn child_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
  el.children().filter_map(ElementRef::wrap)
}

/// `<tr>` children of `table` and of its `thead`/`tbody`/`tfoot` sections.
fn own_rows<'a>(table: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
  child_elements(table).flat_map(|child| {
    let rows: Vec<ElementRef<'a>> = match child.value().name() {
      "tr" => vec![child],
      "thead" | "tbody" | "tfoot" => child_elements(child)
        .filter(|r| r.value().name() == "tr")
        .collect(),
      _ => Vec::new(),
    };
    rows
  })
}

fn cell_text(cell: ElementRef<'_>) -> String {
  let mut out = String::new();
  for node in cell.descendants() {
    match node.value() {
      Node::Text(t) => {
        for c in t.text.chars() {
          if c.is_whitespace() {
            if !out.is_empty() && !out.ends_with([' ', '\n']) {
              out.push(' ');
            }
          } else {
            out.push(c);
          }
        }
      }
      Node::Element(e) if e.name() == "br" => {
        while out.ends_with(' ') {
          out.pop();
        }
        out.push('\n');
      }
      _ => {}
    }
  }
  out.lines().map(str::trim).collect::<Vec<_>>().join("\n")
}

// ─── RawTable ────────────────────────────────────────────────────────────────

/// A header row and the data rows below it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
  pub headers: Vec<String>,
  pub rows:    Vec<Vec<String>>,
}

impl RawTable {
  /// Use `grid[header_row]` as the header; rows above it are discarded.
  pub fn from_grid(mut grid: Vec<Vec<String>>, header_row: usize) -> Result<Self> {
    if grid.len() <= header_row {
      return Err(Error::MissingHeader(header_row));
    }
    let rows = grid.split_off(header_row + 1);
    let headers = grid
      .swap_remove(header_row)
      .iter()
      .map(|h| normalize(h))
      .collect();
    Ok(Self { headers, rows })
  }

  /// Index of the first header matching any alias (ASCII case-insensitive).
  pub fn column(&self, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|alias| {
      self
        .headers
        .iter()
        .position(|h| h == alias || h.eq_ignore_ascii_case(alias))
    })
  }

  /// Resolve every `(name, aliases)` pair, or report all missing names.
  pub fn require<const N: usize>(
    &self,
    columns: [(&'static str, &[&str]); N],
  ) -> Result<[usize; N]> {
    let mut missing = Vec::new();
    let mut found = [0usize; N];
    for (slot, (name, aliases)) in found.iter_mut().zip(columns) {
      match self.column(aliases) {
        Some(i) => *slot = i,
        None => missing.push(name),
      }
    }
    if missing.is_empty() {
      Ok(found)
    } else {
      Err(Error::MissingColumns(missing))
    }
  }
}

/// Cell `col` of `row`, or `""` for short rows.
pub fn cell(row: &[String], col: usize) -> &str {
  row.get(col).map(String::as_str).unwrap_or("")
}

#[cfg(test)]
mod tests {
  use super::*;

  fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
    rows
      .iter()
      .map(|r| r.iter().map(|c| (*c).to_owned()).collect())
      .collect()
  }

  #[test]
  fn header_offset_discards_first_row() {
    let t = RawTable::from_grid(
      grid(&[&["강좌 목록"], &["No", " 강사 "], &["1", "김"], &["2", "이"]]),
      1,
    )
    .unwrap();
    assert_eq!(t.headers, vec!["No", "강사"]);
    assert_eq!(t.rows.len(), 2);
    assert_eq!(t.column(&["강사"]), Some(1));
    assert_eq!(t.column(&["no"]), Some(0));
  }

  #[test]
  fn too_short_grid_has_no_header() {
    let r = RawTable::from_grid(grid(&[&["title"]]), 1);
    assert!(matches!(r, Err(Error::MissingHeader(1))));
  }

  #[test]
  fn require_reports_every_missing_column() {
    let t = RawTable::from_grid(grid(&[&["a", "b"]]), 0).unwrap();
    let err = t
      .require([("a", &["a"][..]), ("c", &["c"][..]), ("d", &["d", "dd"][..])])
      .unwrap_err();
    assert!(matches!(err, Error::MissingColumns(ref m) if m == &["c", "d"]));
    assert_eq!(err.to_string(), "missing required column(s): c, d");
  }

  #[test]
  fn html_first_table_with_breaks_and_colspan() {
    let html = br#"<html><body>
      <table>
        <tr><th colspan="2">title</th></tr>
        <tr><td>No</td><td>schedule</td></tr>
        <tr><td>1</td><td>Mon 09:00<br/>Wed   15:00</td></tr>
      </table>
      <table><tr><td>ignored</td></tr></table>
    </body></html>"#;
    let g = read_html(html).unwrap();
    assert_eq!(g.len(), 3);
    assert_eq!(g[0], vec!["title", "title"]);
    assert_eq!(g[2][1], "Mon 09:00\nWed 15:00");
  }

  #[test]
  fn nested_table_rows_stay_out() {
    let html = br#"<table><tbody>
        <tr><td>No</td><td>note</td></tr>
        <tr><td>1</td><td><table><tr><td>inner</td></tr></table></td></tr>
      </tbody></table>"#;
    let g = read_html(html).unwrap();
    assert_eq!(g.len(), 2);
    assert_eq!(g[1], vec!["1", "inner"]);
  }

  #[test]
  fn cp949_export_decodes() {
    let html = "<html><head><meta http-equiv=\"Content-Type\" \
                content=\"text/html; charset=euc-kr\"></head><body><table>\
                <tr><td>강사</td><td>수업시간</td></tr>\
                <tr><td>김철수</td><td>월 10:00</td></tr></table></body></html>";
    let (bytes, _, unmappable) = EUC_KR.encode(html);
    assert!(!unmappable);
    assert!(std::str::from_utf8(&bytes).is_err());

    let g = read_html(&bytes).unwrap();
    assert_eq!(g[0], vec!["강사", "수업시간"]);
    assert_eq!(g[1], vec!["김철수", "월 10:00"]);
  }

  #[test]
  fn undeclared_legacy_bytes_fall_back_to_cp949() {
    let (bytes, ..) = EUC_KR.encode("<table><tr><td>과목</td></tr></table>");
    assert_eq!(read_html(&bytes).unwrap(), vec![vec!["과목".to_owned()]]);
    assert_eq!(decode_html("학원".as_bytes()), "학원");
  }

  #[test]
  fn html_without_table_fails() {
    assert!(matches!(read_html(b"<p>nothing</p>"), Err(Error::NoTable)));
  }

  #[test]
  fn garbage_is_not_a_workbook() {
    assert!(read_workbook(b"definitely not a zip").is_err());
  }

  #[test]
  fn short_rows_read_as_empty() {
    let row = vec!["x".to_owned()];
    assert_eq!(cell(&row, 0), "x");
    assert_eq!(cell(&row, 3), "");
  }
}
