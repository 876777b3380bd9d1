//! Reference files: the instructor address book and the subject → area
//! mapping. Both have their header on the first row.

use timetable_core::{
  normalize::normalize,
  reference::{AddressBook, AddressEntry, AreaMapping, AreaMappingRow},
};
use tracing::debug;

use crate::{
  Result,
  table::{RawTable, cell},
};

const INSTRUCTOR_NAME: (&str, &[&str]) =
  ("강사명", &["강사명", "instructor_name"]);
const HOME_ADDRESS: (&str, &[&str]) =
  ("자택 주소", &["자택 주소", "자택주소", "home_address"]);
const SELECTED_SUBJECT: (&str, &[&str]) =
  ("선택과목", &["선택과목", "selected_subject"]);
const AREA: (&str, &[&str]) = ("영역", &["영역", "area"]);

/// Build an address book. Both columns are required; a file without them is
/// rejected as a whole.
pub fn address_book_from_table(table: &RawTable) -> Result<AddressBook> {
  let [name, address] = table.require([INSTRUCTOR_NAME, HOME_ADDRESS])?;
  let book = AddressBook::new(table.rows.iter().map(|row| AddressEntry {
    instructor_name: normalize(cell(row, name)),
    home_address:    normalize(cell(row, address)),
  }));
  debug!(rows = table.rows.len(), kept = book.entries().len(), "address book read");
  Ok(book)
}

/// Build an area mapping, preserving row order.
pub fn area_mapping_from_table(table: &RawTable) -> Result<AreaMapping> {
  let [subject, area] = table.require([SELECTED_SUBJECT, AREA])?;
  let mapping = AreaMapping::new(table.rows.iter().map(|row| AreaMappingRow {
    selected_subject: normalize(cell(row, subject)),
    area:             normalize(cell(row, area)),
  }));
  debug!(rows = table.rows.len(), kept = mapping.rows().len(), "area mapping read");
  Ok(mapping)
}
