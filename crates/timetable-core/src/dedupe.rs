//! Composite-key deduplication.
//!
//! Applied twice: when the canonical store is loaded, and when freshly
//! ingested offerings are appended to the store before it is rewritten. A
//! duplicate purged on read can come back through a re-upload, so both call
//! sites must run it.

use std::collections::HashSet;

use crate::offering::{KeyColumn, Offering};

/// Keep the first offering seen for each value of `key`, preserving input
/// order. An empty `key` treats every offering as the same record.
pub fn dedupe(records: Vec<Offering>, key: &[KeyColumn]) -> Vec<Offering> {
  let mut seen: HashSet<Vec<String>> = HashSet::with_capacity(records.len());
  records
    .into_iter()
    .filter(|o| {
      let k = key.iter().map(|&c| o.key_field(c).to_owned()).collect();
      seen.insert(k)
    })
    .collect()
}

/// Collapse rows that are equal in every field, including the start date.
pub fn dedupe_exact(records: Vec<Offering>) -> Vec<Offering> {
  let mut out: Vec<Offering> = Vec::with_capacity(records.len());
  let mut seen = HashSet::with_capacity(records.len());
  for o in records {
    let k = (
      KeyColumn::all()
        .into_iter()
        .map(|c| o.key_field(c).to_owned())
        .collect::<Vec<_>>(),
      o.start_date,
    );
    if seen.insert(k) {
      out.push(o);
    }
  }
  out
}
