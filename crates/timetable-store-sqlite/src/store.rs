//! [`SqliteStore`], the SQLite implementation of [`ScheduleStore`].

use std::path::Path;

use rusqlite::types::Value;
use timetable_core::{
  offering::Offering,
  reference::{AddressBook, AddressEntry, AreaMapping, AreaMappingRow},
  store::{ScheduleStore, StoredOfferings},
};
use tracing::{debug, warn};

use crate::{
  Result,
  encode::{RawOffering, encode_date, value_text},
  schema::{ADDRESS_BOOK, AREA_SUBJECTS, OFFERING_COLUMNS, OFFERINGS, PRAGMAS, USER_VERSION},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A timetable store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(PRAGMAS)?;
        conn.execute_batch(OFFERINGS)?;
        conn.execute_batch(ADDRESS_BOOK)?;
        conn.execute_batch(AREA_SUBJECTS)?;
        conn.execute_batch(USER_VERSION)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  #[cfg(test)]
  pub(crate) fn connection(&self) -> &tokio_rusqlite::Connection { &self.conn }

  /// Clear the subject → area table and write `mapping` in row order.
  pub async fn replace_area_mapping(&self, mapping: AreaMapping) -> Result<usize> {
    let rows = mapping.rows().to_vec();
    let n = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute_batch("DROP TABLE IF EXISTS area_subjects;")?;
        tx.execute_batch(AREA_SUBJECTS)?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO area_subjects (selected_subject, area) VALUES (?1, ?2)",
          )?;
          for row in &rows {
            stmt.execute(rusqlite::params![row.selected_subject, row.area])?;
          }
        }
        tx.commit()?;
        Ok(rows.len())
      })
      .await?;
    debug!(rows = n, "area mapping rewritten");
    Ok(n)
  }
}

/// Column names of `table`; empty if the table does not exist.
fn table_columns(conn: &rusqlite::Connection, table: &str) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
  let names = stmt
    .query_map([], |row| row.get::<_, String>(1))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(names)
}

/// Read `(a, b)` text pairs from a two-column reference table, or `None` if
/// the table or either column is missing, or the table is empty.
fn read_pairs(
  conn: &rusqlite::Connection,
  table: &str,
  a: &str,
  b: &str,
) -> rusqlite::Result<Option<Vec<(String, String)>>> {
  let columns = table_columns(conn, table)?;
  if !columns.iter().any(|c| c == a) || !columns.iter().any(|c| c == b) {
    return Ok(None);
  }
  let mut stmt = conn.prepare(&format!("SELECT {a}, {b} FROM {table} ORDER BY rowid"))?;
  let pairs = stmt
    .query_map([], |row| {
      Ok((
        value_text(row.get::<_, Value>(0)?).unwrap_or_default(),
        value_text(row.get::<_, Value>(1)?).unwrap_or_default(),
      ))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok((!pairs.is_empty()).then_some(pairs))
}

// ─── ScheduleStore impl ──────────────────────────────────────────────────────

impl ScheduleStore for SqliteStore {
  type Error = crate::Error;

  async fn load_offerings(&self) -> Result<StoredOfferings> {
    let (columns, raws): (Vec<String>, Vec<RawOffering>) = self
      .conn
      .call(|conn| {
        let present = table_columns(conn, "offerings")?;
        let columns: Vec<String> = OFFERING_COLUMNS
          .iter()
          .filter(|c| present.iter().any(|p| p == *c))
          .map(|c| (*c).to_owned())
          .collect();
        if columns.is_empty() {
          return Ok((columns, Vec::new()));
        }

        let select = OFFERING_COLUMNS
          .iter()
          .map(|c| {
            if columns.iter().any(|p| p == c) {
              (*c).to_owned()
            } else {
              format!("NULL AS {c}")
            }
          })
          .collect::<Vec<_>>()
          .join(", ");
        let mut stmt =
          conn.prepare(&format!("SELECT {select} FROM offerings ORDER BY rowid"))?;
        let raws = stmt
          .query_map([], |row| {
            let mut values: [Option<String>; 9] = Default::default();
            for (i, slot) in values.iter_mut().enumerate() {
              *slot = value_text(row.get::<_, Value>(i)?);
            }
            Ok(RawOffering::from_values(values))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((columns, raws))
      })
      .await?;

    let total = raws.len();
    let mut rows = Vec::with_capacity(total);
    let mut first_error = None;
    for raw in raws {
      match raw.into_offering() {
        Ok(o) => rows.push(o),
        Err(e) => {
          first_error.get_or_insert(e);
        }
      }
    }
    if let Some(error) = first_error {
      warn!(
        skipped = total - rows.len(),
        %error,
        "stored offerings without a usable weekday or time slot were skipped"
      );
    }
    debug!(rows = rows.len(), columns = columns.len(), "offerings loaded");
    Ok(StoredOfferings { rows, columns })
  }

  async fn replace_offerings(&self, rows: Vec<Offering>) -> Result<usize> {
    let n = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute_batch("DROP TABLE IF EXISTS offerings;")?;
        tx.execute_batch(OFFERINGS)?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO offerings
               (year, month, instructor, subject, weekday, time_slot,
                venue, course_type, start_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          )?;
          for o in &rows {
            stmt.execute(rusqlite::params![
              o.year,
              o.month,
              o.instructor,
              o.subject,
              o.weekday.token(),
              o.time_slot.label(),
              o.venue,
              o.course_type,
              o.start_date.map(encode_date),
            ])?;
          }
        }
        tx.commit()?;
        Ok(rows.len())
      })
      .await?;
    Ok(n)
  }

  async fn load_address_book(&self) -> Result<Option<AddressBook>> {
    let pairs = self
      .conn
      .call(|conn| {
        Ok(read_pairs(conn, "address_book", "instructor_name", "home_address")?)
      })
      .await?;
    Ok(pairs.map(|pairs| {
      AddressBook::new(pairs.into_iter().map(|(instructor_name, home_address)| {
        AddressEntry {
          instructor_name,
          home_address,
        }
      }))
    }))
  }

  async fn replace_address_book(&self, book: AddressBook) -> Result<usize> {
    let entries = book.entries().to_vec();
    let n = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute_batch("DROP TABLE IF EXISTS address_book;")?;
        tx.execute_batch(ADDRESS_BOOK)?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO address_book (instructor_name, home_address) VALUES (?1, ?2)",
          )?;
          for e in &entries {
            stmt.execute(rusqlite::params![e.instructor_name, e.home_address])?;
          }
        }
        tx.commit()?;
        Ok(entries.len())
      })
      .await?;
    Ok(n)
  }

  async fn load_area_mapping(&self) -> Result<Option<AreaMapping>> {
    let pairs = self
      .conn
      .call(|conn| {
        Ok(read_pairs(conn, "area_subjects", "selected_subject", "area")?)
      })
      .await?;
    Ok(pairs.map(|pairs| {
      AreaMapping::new(pairs.into_iter().map(|(selected_subject, area)| {
        AreaMappingRow {
          selected_subject,
          area,
        }
      }))
    }))
  }
}
