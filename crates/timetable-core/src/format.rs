//! Cell text for the day/time grid.
//!
//! One entry is `venue`, then `subject` (unless the area suppresses it), then
//! `(course type)`. Screen output is HTML with `<br>` breaks and a bold
//! venue; spreadsheet output keeps real newlines and carries no markup.

use serde::{Deserialize, Serialize};

use crate::{enrich::EnrichedOffering, normalize::normalize, reference::AreaPolicy};

/// Where the text ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
  Screen,
  Spreadsheet,
}

impl RenderMode {
  /// Break between the fields of one entry.
  pub fn line_break(self) -> &'static str {
    match self {
      Self::Screen => "<br>",
      Self::Spreadsheet => "\n",
    }
  }

  /// Separator between entries sharing one cell.
  pub fn entry_separator(self) -> &'static str {
    match self {
      Self::Screen => "<br><br>",
      Self::Spreadsheet => "\n\n",
    }
  }
}

/// Renders offerings into cell text under an [`AreaPolicy`].
#[derive(Debug, Clone, Copy)]
pub struct CellTextFormatter<'a> {
  policy: &'a AreaPolicy,
  mode:   RenderMode,
}

impl<'a> CellTextFormatter<'a> {
  pub fn new(policy: &'a AreaPolicy, mode: RenderMode) -> Self {
    Self { policy, mode }
  }

  pub fn mode(&self) -> RenderMode { self.mode }

  /// Text for one offering, or `None` when it has neither venue nor subject,
  /// or when nothing is left to show once the area hides the subject.
  pub fn format(
    &self,
    venue: &str,
    subject: &str,
    course_type: &str,
    area: &str,
  ) -> Option<String> {
    let venue = normalize(venue);
    let subject = normalize(subject);
    let course_type = normalize(course_type);

    if venue.is_empty() && subject.is_empty() {
      return None;
    }

    let mut parts: Vec<String> = Vec::with_capacity(3);
    if !venue.is_empty() {
      parts.push(match self.mode {
        RenderMode::Screen => format!("<b>{}</b>", self.field(&venue)),
        RenderMode::Spreadsheet => venue,
      });
    }
    if !subject.is_empty() && !self.policy.suppresses_subject(area) {
      parts.push(self.field(&subject));
    }
    if !course_type.is_empty() {
      parts.push(format!("({})", self.field(&course_type)));
    }

    if parts.is_empty() {
      return None;
    }
    Some(parts.join(self.mode.line_break()))
  }

  /// [`Self::format`] for an enriched offering.
  pub fn format_offering(&self, e: &EnrichedOffering) -> Option<String> {
    self.format(
      &e.offering.venue,
      &e.offering.subject,
      &e.offering.course_type,
      &e.area,
    )
  }

  /// All entries of one cell, skipped entries dropped, joined by the mode's
  /// entry separator. Empty input gives `""`.
  pub fn format_cell<'o>(
    &self,
    offerings: impl IntoIterator<Item = &'o EnrichedOffering>,
  ) -> String {
    offerings
      .into_iter()
      .filter_map(|e| self.format_offering(e))
      .collect::<Vec<_>>()
      .join(self.mode.entry_separator())
  }

  fn field(&self, text: &str) -> String {
    match self.mode {
      RenderMode::Screen => escape_html(text).replace('\n', "<br>"),
      RenderMode::Spreadsheet => text.to_owned(),
    }
  }
}

pub(crate) fn escape_html(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      _ => out.push(c),
    }
  }
  out
}
