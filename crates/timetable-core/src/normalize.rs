//! Cell-text normalisation.
//!
//! Spreadsheet round-trips leave behind escaped newlines (`\n`, `\\n`, ...)
//! and NaN markers. Everything that is compared, keyed, or rendered goes
//! through [`normalize`] first.

use std::sync::LazyLock;

use regex::Regex;

static ESCAPED_NEWLINE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\\+n").expect("static regex"));

/// Canonicalise one cell's text.
///
/// - any run of backslashes followed by `n` becomes a single `'\n'`;
/// - leading/trailing whitespace is trimmed;
/// - `NaN`/`nan` (any case) and whitespace-only input become `""`.
pub fn normalize(raw: &str) -> String {
  let unescaped = ESCAPED_NEWLINE.replace_all(raw, "\n");
  let trimmed = unescaped.trim();
  if trimmed.eq_ignore_ascii_case("nan") {
    return String::new();
  }
  trimmed.to_owned()
}

/// [`normalize`] for a value that may be absent.
pub fn normalize_opt(raw: Option<&str>) -> String {
  raw.map(normalize).unwrap_or_default()
}
