//! Worksheet names under Excel's rules: at most 31 characters, none of
//! `[ ] : * ? / \`, no leading or trailing apostrophe, unique within the
//! workbook ignoring case.

use std::collections::HashSet;

pub const MAX_LEN: usize = 31;

const FORBIDDEN: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Hands out sanitized, unique names for one workbook.
#[derive(Debug, Default)]
pub struct SheetNames {
  used: HashSet<String>,
}

impl SheetNames {
  pub fn new() -> Self { Self::default() }

  /// A valid name derived from `wanted`. Collisions get ` (2)`, ` (3)`, …
  /// with the base shortened to fit.
  pub fn assign(&mut self, wanted: &str) -> String {
    let base = sanitize(wanted);
    let mut candidate = base.clone();
    let mut n = 2;
    while self.used.contains(&candidate.to_lowercase()) {
      let suffix = format!(" ({n})");
      let keep = MAX_LEN - suffix.chars().count();
      candidate = format!("{}{suffix}", truncate(&base, keep).trim_end());
      n += 1;
    }
    self.used.insert(candidate.to_lowercase());
    candidate
  }
}

/// Replace forbidden characters with `_`, strip apostrophes at either end
/// and truncate. An empty result becomes `Sheet`.
pub fn sanitize(name: &str) -> String {
  let replaced: String = name
    .chars()
    .map(|c| if FORBIDDEN.contains(&c) || c.is_control() { '_' } else { c })
    .collect();
  let trimmed = replaced.trim().trim_matches('\'');
  let out = truncate(trimmed, MAX_LEN).trim_end().to_owned();
  if out.is_empty() { "Sheet".to_owned() } else { out }
}

fn truncate(s: &str, max: usize) -> &str {
  match s.char_indices().nth(max) {
    Some((i, _)) => &s[..i],
    None => s,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn forbidden_characters_are_replaced() {
    assert_eq!(sanitize("논술/제2외국어"), "논술_제2외국어");
    assert_eq!(sanitize("a[b]:c*d?e\\f"), "a_b__c_d_e_f");
    assert_eq!(sanitize("'quoted'"), "quoted");
    assert_eq!(sanitize("  "), "Sheet");
  }

  #[test]
  fn long_names_are_truncated_by_character() {
    let long = "가".repeat(40);
    let s = sanitize(&long);
    assert_eq!(s.chars().count(), MAX_LEN);
  }

  #[test]
  fn duplicates_get_numbered() {
    let mut names = SheetNames::new();
    assert_eq!(names.assign("과학"), "과학");
    assert_eq!(names.assign("과학"), "과학 (2)");
    assert_eq!(names.assign("과학"), "과학 (3)");
    assert_eq!(names.assign("Math"), "Math");
    assert_eq!(names.assign("MATH"), "MATH (2)");

    let long = "x".repeat(35);
    let first = names.assign(&long);
    let second = names.assign(&long);
    assert_eq!(first.len(), MAX_LEN);
    assert_eq!(second.len(), MAX_LEN);
    assert!(second.ends_with(" (2)"));
  }
}
