//! Read and refresh passes over a [`ScheduleStore`].
//!
//! Reads: load → dedupe → enrich → [`Snapshot`]. Every render works from one
//! snapshot; nothing derived survives a refresh.
//!
//! Refresh: load existing → append ingested → dedupe → rewrite wholesale.

use tracing::{debug, info, warn};

use crate::{
  dedupe::dedupe,
  enrich::{EnrichedOffering, enrich},
  offering::{KeyColumn, Offering},
  reference::{AddressBook, AreaMapping, AreaPolicy},
  store::{ScheduleStore, StoredOfferings},
};

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// A consistent, enriched view of the whole store for one rendering pass.
#[derive(Debug, Clone)]
pub struct Snapshot {
  pub offerings: Vec<EnrichedOffering>,
  pub mapping:   Option<AreaMapping>,
  pub policy:    AreaPolicy,
}

impl Snapshot {
  /// Deduplicate on the key columns the store has, then enrich.
  pub fn build(
    stored: StoredOfferings,
    mapping: Option<AreaMapping>,
    addresses: Option<AddressBook>,
    policy: AreaPolicy,
  ) -> Self {
    let key = KeyColumn::present_in(&stored.columns);
    let before = stored.rows.len();
    let rows = dedupe(stored.rows, &key);
    debug!(before, after = rows.len(), "deduplicated store on load");

    if mapping.as_ref().is_none_or(AreaMapping::is_empty) {
      warn!(
        fallback = %policy.missing_fallback,
        "area mapping unavailable; every subject gets the fallback area"
      );
    }
    let addresses = addresses.unwrap_or_else(|| {
      warn!("address book unavailable; every address is unknown");
      AddressBook::default()
    });

    let offerings = enrich(rows, mapping.as_ref(), &addresses, &policy);
    Self {
      offerings,
      mapping,
      policy,
    }
  }

  /// The store holds no offerings yet. An expected state, not an error.
  pub fn is_empty(&self) -> bool { self.offerings.is_empty() }
}

/// Read the whole store into a [`Snapshot`].
pub async fn load_snapshot<S: ScheduleStore>(
  store: &S,
  policy: &AreaPolicy,
) -> Result<Snapshot, S::Error> {
  let stored = store.load_offerings().await?;
  let mapping = store.load_area_mapping().await?;
  let addresses = store.load_address_book().await?;
  Ok(Snapshot::build(stored, mapping, addresses, policy.clone()))
}

// ─── Refresh ─────────────────────────────────────────────────────────────────

/// What a refresh did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct RefreshReport {
  /// Rows in the store before the refresh.
  pub existing:  usize,
  /// Rows contributed by the ingested files.
  pub ingested:  usize,
  /// Rows written back after deduplication.
  pub written:   usize,
  /// Address rows written, if the address book was replaced.
  pub addresses: Option<usize>,
}

/// Existing rows followed by new rows, deduplicated on the full canonical
/// key. Existing rows win over re-uploaded copies.
pub fn merge(existing: Vec<Offering>, new: Vec<Offering>) -> Vec<Offering> {
  let mut combined = existing;
  combined.extend(new);
  dedupe(combined, &KeyColumn::all())
}

/// Merge `new` into the store and rewrite it; replace the address book when
/// one is given.
pub async fn refresh<S>(
  store: &S,
  new: Vec<Offering>,
  addresses: Option<AddressBook>,
) -> Result<RefreshReport, S::Error>
where
  S: ScheduleStore,
  S::Error: From<crate::Error>,
{
  if new.is_empty() && addresses.is_none() {
    return Err(crate::Error::NothingToRefresh.into());
  }

  let existing = store.load_offerings().await?.rows;
  let existing_len = existing.len();
  let ingested = new.len();
  info!(existing = existing_len, ingested, "merging offerings");

  let merged = merge(existing, new);
  let written = store.replace_offerings(merged).await?;
  info!(written, "offerings rewritten");

  let addresses = match addresses {
    Some(book) => {
      let n = store.replace_address_book(book).await?;
      info!(rows = n, "address book rewritten");
      Some(n)
    }
    None => None,
  };

  Ok(RefreshReport {
    existing: existing_len,
    ingested,
    written,
    addresses,
  })
}
