//! Reference merge: attaches area, home address and first-offering date to
//! every offering.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
  offering::Offering,
  reference::{AddressBook, AreaMapping, AreaPolicy},
};

/// Shown wherever a first-offering date is unknown.
pub const NO_DATE: &str = "—";

/// An offering with its derived attributes. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedOffering {
  #[serde(flatten)]
  pub offering:            Offering,
  pub area:                String,
  pub home_address:        String,
  /// Earliest known start date of this instructor across the whole store.
  pub first_offering_date: Option<NaiveDate>,
}

/// Earliest parseable start date per instructor.
///
/// Must be computed over the entire store, never over a period-filtered
/// subset: it answers "has this instructor taught before the selected
/// month".
pub fn first_offering_dates(
  offerings: &[Offering],
) -> HashMap<String, Option<NaiveDate>> {
  let mut firsts: HashMap<String, Option<NaiveDate>> = HashMap::new();
  for o in offerings {
    let entry = firsts.entry(o.instructor.clone()).or_insert(None);
    if let Some(d) = o.start_date {
      *entry = Some(entry.map_or(d, |cur| cur.min(d)));
    }
  }
  firsts
}

/// Resolve the area for one subject.
pub fn area_for(
  subject: &str,
  mapping: Option<&AreaMapping>,
  policy: &AreaPolicy,
) -> String {
  match mapping.filter(|m| !m.is_empty()) {
    None => policy.missing_fallback.clone(),
    Some(m) => m
      .area_of(subject)
      .filter(|a| !a.is_empty())
      .unwrap_or(policy.unmapped_fallback.as_str())
      .to_owned(),
  }
}

/// Left-join `offerings` against the mapping and the address book.
///
/// An absent or empty mapping gives every offering
/// [`AreaPolicy::missing_fallback`]; a subject missing from a present
/// mapping gets [`AreaPolicy::unmapped_fallback`]. Nothing here fails.
pub fn enrich(
  offerings: Vec<Offering>,
  mapping: Option<&AreaMapping>,
  addresses: &AddressBook,
  policy: &AreaPolicy,
) -> Vec<EnrichedOffering> {
  let firsts = first_offering_dates(&offerings);
  offerings
    .into_iter()
    .map(|offering| {
      let area = area_for(&offering.subject, mapping, policy);
      let home_address = addresses.address_of(&offering.instructor).to_owned();
      let first_offering_date =
        firsts.get(&offering.instructor).copied().flatten();
      EnrichedOffering {
        offering,
        area,
        home_address,
        first_offering_date,
      }
    })
    .collect()
}

/// `YYYY-MM-DD`, or [`NO_DATE`].
pub fn display_date(date: Option<NaiveDate>) -> String {
  date
    .map(|d| d.format("%Y-%m-%d").to_string())
    .unwrap_or_else(|| NO_DATE.to_owned())
}
