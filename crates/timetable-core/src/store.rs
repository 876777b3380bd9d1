//! The `ScheduleStore` trait: the canonical record collections.
//!
//! The trait is implemented by storage backends (e.g.
//! `timetable-store-sqlite`). The pipeline in [`crate::service`] depends on
//! this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  offering::Offering,
  reference::{AddressBook, AreaMapping},
};

/// Offerings as read from the store, with the columns the store actually
/// has. Values of absent columns are filled with their documented defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredOfferings {
  pub rows:    Vec<Offering>,
  pub columns: Vec<String>,
}

/// Abstraction over the canonical store.
///
/// Writes are wholesale: a `replace_*` call clears the collection and
/// rewrites it. There is no partial update and no coordination between
/// concurrent writers; the last write wins.
pub trait ScheduleStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every stored offering, in storage order, without deduplication.
  fn load_offerings(
    &self,
  ) -> impl Future<Output = Result<StoredOfferings, Self::Error>> + Send + '_;

  /// Clear the offerings collection and write `rows`. Returns the row count.
  fn replace_offerings(
    &self,
    rows: Vec<Offering>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// The address book; `None` if the collection or one of its required
  /// columns is missing.
  fn load_address_book(
    &self,
  ) -> impl Future<Output = Result<Option<AddressBook>, Self::Error>> + Send + '_;

  /// Clear the address collection and write `book`. Returns the row count.
  fn replace_address_book(
    &self,
    book: AddressBook,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// The subject → area table; `None` if the collection or one of its
  /// required columns is missing. Read-only from the pipeline's side.
  fn load_area_mapping(
    &self,
  ) -> impl Future<Output = Result<Option<AreaMapping>, Self::Error>> + Send + '_;
}
