//! SQL schema for the timetable SQLite store.
//!
//! Executed at connection startup. Each collection is rewritten wholesale,
//! so a rewrite drops and recreates its table; that is also how stores
//! written by older versions pick up new columns.

pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
";

/// One row per (instructor, subject, weekday, slot, venue, course type) for
/// a year and month. Row order is insertion order (`rowid`).
pub const OFFERINGS: &str = "
CREATE TABLE IF NOT EXISTS offerings (
    year        TEXT NOT NULL DEFAULT '',   -- four digits, or '0' if unknown
    month       TEXT NOT NULL DEFAULT '',   -- '<N>월'
    instructor  TEXT NOT NULL DEFAULT '',
    subject     TEXT NOT NULL DEFAULT '',
    weekday     TEXT NOT NULL,              -- 월 화 수 목 금 토 일
    time_slot   TEXT NOT NULL,              -- 오전 | 오후 | 저녁
    venue       TEXT NOT NULL DEFAULT '',
    course_type TEXT NOT NULL DEFAULT '',
    start_date  TEXT                        -- YYYY-MM-DD or NULL
);
CREATE INDEX IF NOT EXISTS offerings_period_idx ON offerings(year, month);
";

pub const ADDRESS_BOOK: &str = "
CREATE TABLE IF NOT EXISTS address_book (
    instructor_name TEXT NOT NULL,
    home_address    TEXT NOT NULL DEFAULT ''
);
";

/// Row order is the subject display rank.
pub const AREA_SUBJECTS: &str = "
CREATE TABLE IF NOT EXISTS area_subjects (
    selected_subject TEXT NOT NULL,
    area             TEXT NOT NULL DEFAULT ''
);
";

pub const USER_VERSION: &str = "PRAGMA user_version = 1;";

/// Columns `offerings` may carry, in select order.
pub const OFFERING_COLUMNS: [&str; 9] = [
  "year",
  "month",
  "instructor",
  "subject",
  "weekday",
  "time_slot",
  "venue",
  "course_type",
  "start_date",
];
