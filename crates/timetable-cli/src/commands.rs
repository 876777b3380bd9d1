//! Subcommand handlers. Each read command loads one [`Snapshot`] and renders
//! from it.

use std::path::Path;

use anyhow::{Context as _, bail};
use serde::Serialize;
use timetable_core::{
  format::{CellTextFormatter, RenderMode},
  grid::{CoverageMatrix, DayGrid, combined_sheets},
  offering::{month_label, month_number},
  selection::{
    InstructorProfile, Selection, available_months, available_years, profile, roster,
  },
  service::{Snapshot, load_snapshot},
};
use timetable_ingest::{
  SourceFile, ingest_batch, read_address_book, read_area_mapping,
};
use timetable_store_sqlite::SqliteStore;
use tracing::{info, warn};

use crate::{Filters, render, settings::AppConfig};

const NO_DATA: &str = "no data yet: run `timetable refresh <FILES>` first";

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

/// Load a snapshot, or print [`NO_DATA`] and return `None` for an empty
/// store.
async fn snapshot(store: &SqliteStore, config: &AppConfig) -> anyhow::Result<Option<Snapshot>> {
  let snapshot = load_snapshot(store, &config.areas)
    .await
    .context("failed to load store")?;
  if snapshot.is_empty() {
    println!("{NO_DATA}");
    return Ok(None);
  }
  Ok(Some(snapshot))
}

/// `"3"` and `"3월"` both mean `"3월"`.
pub fn month_arg(raw: &str) -> String {
  let raw = raw.trim();
  match raw.parse::<u32>() {
    Ok(n) => month_label(n),
    Err(_) => raw.to_owned(),
  }
}

/// Build the selection from `filters`, defaulting to the newest year and its
/// latest month.
pub fn resolve_selection(snapshot: &Snapshot, filters: &Filters) -> anyhow::Result<Selection> {
  let year = match &filters.year {
    Some(y) => y.trim().to_owned(),
    None => available_years(&snapshot.offerings)
      .into_iter()
      .next()
      .context("store has no years")?,
  };
  let month = match &filters.month {
    Some(m) => month_arg(m),
    None => available_months(&snapshot.offerings, &year)
      .pop()
      .with_context(|| format!("no months for year {year}"))?,
  };
  if month_number(&month).is_none() {
    bail!("invalid month {month:?}; expected e.g. 3 or 3월");
  }
  Ok(
    Selection::new(year, month)
      .area(filters.area.clone())
      .subject(filters.subject.clone())
      .search(filters.search.clone()),
  )
}

// ─── Writes ──────────────────────────────────────────────────────────────────

pub async fn refresh(
  store: &SqliteStore,
  config: &AppConfig,
  files: &[std::path::PathBuf],
  addresses: Option<&Path>,
  json: bool,
) -> anyhow::Result<()> {
  let mut sources = Vec::with_capacity(files.len());
  for path in files {
    match SourceFile::read(path) {
      Ok(file) => sources.push(file),
      Err(error) => warn!(%error, "file skipped"),
    }
  }
  let outcome = ingest_batch(&sources, &config.ingest);
  for failure in &outcome.failures {
    println!("skipped {}: {}", failure.file, failure.error);
  }

  let book = addresses
    .map(|path| {
      let file = SourceFile::read(path)?;
      read_address_book(&file)
    })
    .transpose()
    .context("address file rejected")?;

  let report = timetable_core::service::refresh(store, outcome.offerings, book)
    .await
    .context("refresh failed")?;
  info!(
    failed_files = outcome.failures.len() + files.len() - sources.len(),
    "refresh complete"
  );

  if json {
    return print_json(&report);
  }
  println!(
    "{} existing + {} ingested → {} rows",
    report.existing, report.ingested, report.written
  );
  if let Some(n) = report.addresses {
    println!("address book replaced ({n} rows)");
  }
  Ok(())
}

pub async fn mapping(store: &SqliteStore, file: &Path) -> anyhow::Result<()> {
  let source = SourceFile::read(file)?;
  let mapping = read_area_mapping(&source).context("mapping file rejected")?;
  if mapping.is_empty() {
    bail!("mapping file {} has no rows", source.name);
  }
  let n = store.replace_area_mapping(mapping).await?;
  println!("area mapping replaced ({n} subjects)");
  Ok(())
}

// ─── Reads ───────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct Period {
  year:   String,
  months: Vec<String>,
}

pub async fn periods(store: &SqliteStore, config: &AppConfig, json: bool) -> anyhow::Result<()> {
  let Some(snap) = snapshot(store, config).await? else {
    return Ok(());
  };
  let periods: Vec<Period> = available_years(&snap.offerings)
    .into_iter()
    .map(|year| Period {
      months: available_months(&snap.offerings, &year),
      year,
    })
    .collect();

  if json {
    return print_json(&periods);
  }
  for p in periods {
    println!("{}: {}", p.year, p.months.join(", "));
  }
  Ok(())
}

pub async fn instructors(
  store: &SqliteStore,
  config: &AppConfig,
  filters: &Filters,
  json: bool,
) -> anyhow::Result<()> {
  let Some(snap) = snapshot(store, config).await? else {
    return Ok(());
  };
  let selection = resolve_selection(&snap, filters)?;
  let filtered = selection.apply(&snap.offerings);
  let roster = roster(&filtered, &selection);

  if json {
    return print_json(&roster);
  }
  println!("{}", selection.period_label());
  print!("{}", render::roster_text(&roster));
  Ok(())
}

#[derive(Serialize)]
struct TimetableView {
  profile: InstructorProfile,
  grid:    DayGrid,
}

pub async fn timetable(
  store: &SqliteStore,
  config: &AppConfig,
  instructor: &str,
  filters: &Filters,
  html: bool,
  json: bool,
) -> anyhow::Result<()> {
  let Some(snap) = snapshot(store, config).await? else {
    return Ok(());
  };
  let selection = resolve_selection(&snap, filters)?;
  let Some(profile) = profile(&snap.offerings, instructor, &selection) else {
    bail!("unknown instructor {instructor:?}");
  };
  // The grid covers the whole period regardless of narrowing filters.
  let filtered = Selection::new(selection.year.clone(), selection.month.clone())
    .instructor(Some(instructor.to_owned()))
    .apply(&snap.offerings);

  let mode = if html { RenderMode::Screen } else { RenderMode::Spreadsheet };
  let formatter = CellTextFormatter::new(&snap.policy, mode);
  let grid = DayGrid::build(instructor, &filtered, &formatter);

  if json {
    return print_json(&TimetableView { profile, grid });
  }
  print!("{}", render::profile_text(&profile));
  println!("{}", selection.period_label());
  if html {
    print!("{}", grid.to_html());
  } else {
    print!("{}", render::grid_text(&grid));
  }
  Ok(())
}

pub async fn coverage(
  store: &SqliteStore,
  config: &AppConfig,
  filters: &Filters,
  output: Option<&Path>,
  json: bool,
) -> anyhow::Result<()> {
  let Some(snap) = snapshot(store, config).await? else {
    return Ok(());
  };
  let selection = resolve_selection(&snap, filters)?;
  let filtered = selection.apply(&snap.offerings);
  let matrix = CoverageMatrix::build(&filtered, snap.mapping.as_ref(), &snap.policy);

  if let Some(path) = output {
    let bytes = timetable_xlsx::coverage_workbook(&matrix)?;
    std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    println!("coverage written to {}", path.display());
    return Ok(());
  }
  if json {
    return print_json(&matrix);
  }
  print!("{}", render::coverage_text(&matrix));
  Ok(())
}

pub async fn export_grids(
  store: &SqliteStore,
  config: &AppConfig,
  filters: &Filters,
  output: &Path,
) -> anyhow::Result<()> {
  let Some(snap) = snapshot(store, config).await? else {
    return Ok(());
  };
  let selection = resolve_selection(&snap, filters)?;

  // Blocks follow every filter; grids show the instructor's whole period.
  let in_period = Selection::new(selection.year.clone(), selection.month.clone())
    .apply(&snap.offerings);
  let selected = selection.apply(&snap.offerings);

  let formatter = CellTextFormatter::new(&snap.policy, RenderMode::Spreadsheet);
  let label = selection.period_label();
  let layouts = combined_sheets(
    &selected,
    &in_period,
    snap.mapping.as_ref(),
    &snap.policy,
    &formatter,
    &label,
  );

  if layouts.is_empty() {
    println!("nothing selected for {label}");
    return Ok(());
  }
  let bytes = timetable_xlsx::grid_workbook(&layouts)?;
  std::fs::write(output, bytes).with_context(|| format!("failed to write {}", output.display()))?;
  println!("{} sheet(s) written to {}", layouts.len(), output.display());
  Ok(())
}

pub async fn export_dump(
  store: &SqliteStore,
  config: &AppConfig,
  filters: &Filters,
  instructor: Option<String>,
  output: &Path,
) -> anyhow::Result<()> {
  let Some(snap) = snapshot(store, config).await? else {
    return Ok(());
  };
  let selection = resolve_selection(&snap, filters)?.instructor(instructor);
  let filtered = selection.apply(&snap.offerings);

  let bytes = timetable_xlsx::dump_workbook(&filtered)?;
  std::fs::write(output, bytes).with_context(|| format!("failed to write {}", output.display()))?;
  println!("{} offering(s) written to {}", filtered.len(), output.display());
  Ok(())
}

#[cfg(test)]
mod tests {
  use timetable_core::{
    offering::{KeyColumn, Offering, TimeSlot, Weekday},
    reference::AreaPolicy,
    store::StoredOfferings,
  };

  use super::*;

  fn o(year: &str, month: &str, instructor: &str) -> Offering {
    Offering {
      year: year.into(),
      month: month.into(),
      instructor: instructor.into(),
      subject: "물리학".into(),
      weekday: Weekday::Mon,
      time_slot: TimeSlot::Morning,
      venue: "대치".into(),
      course_type: String::new(),
      start_date: None,
    }
  }

  fn snapshot_of(rows: Vec<Offering>) -> Snapshot {
    Snapshot::build(
      StoredOfferings {
        rows,
        columns: KeyColumn::all().iter().map(|k| k.name().to_owned()).collect(),
      },
      None,
      None,
      AreaPolicy::default(),
    )
  }

  #[test]
  fn month_arg_accepts_numbers_and_labels() {
    assert_eq!(month_arg("3"), "3월");
    assert_eq!(month_arg(" 11월 "), "11월");
  }

  #[test]
  fn selection_defaults_to_newest_period() {
    let snap = snapshot_of(vec![
      o("2023", "12월", "김"),
      o("2024", "2월", "김"),
      o("2024", "10월", "이"),
    ]);
    let sel = resolve_selection(&snap, &Filters::default()).unwrap();
    assert_eq!(sel.year, "2024");
    assert_eq!(sel.month, "10월");

    let explicit = resolve_selection(
      &snap,
      &Filters {
        year: Some("2023".into()),
        month: Some("12".into()),
        area: Some("기타".into()),
        ..Filters::default()
      },
    )
    .unwrap();
    assert_eq!(explicit.period_label(), "2023 / 12월");
    assert_eq!(explicit.apply(&snap.offerings).len(), 1);
  }

  #[test]
  fn invalid_month_is_rejected() {
    let snap = snapshot_of(vec![o("2024", "3월", "김")]);
    let filters = Filters {
      month: Some("봄".into()),
      ..Filters::default()
    };
    assert!(resolve_selection(&snap, &filters).is_err());
  }
}
