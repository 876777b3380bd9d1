//! Core types and pipeline for the instructor timetable dashboard.
//!
//! This crate has no file-format or database dependencies. Ingestion
//! (`timetable-ingest`), storage (`timetable-store-sqlite`) and spreadsheet
//! output (`timetable-xlsx`) all depend on it.
//!
//! Pipeline:
//!   canonical store
//!     └─ dedupe()                 → unique offerings
//!          └─ enrich()            → area, address, first-offering date
//!               └─ Selection      → filtered period
//!                    └─ DayGrid / CoverageMatrix / area_sheet()

pub mod dedupe;
pub mod enrich;
pub mod error;
pub mod format;
pub mod grid;
pub mod normalize;
pub mod offering;
pub mod reference;
pub mod selection;
pub mod service;
pub mod store;

pub use error::{Error, Result};
