//! Report table, summary counts and CSV export.

use crate::types::ResolutionResult;
use serde::{Deserialize, Serialize};

/// Header row of the CSV export.
pub const CSV_HEADER: [&str; 4] = ["DOI", "Resolved URL", "Resolves", "HTTP Status Code"];

/// All results of one run, in completion order.
///
/// Owned by the engine while the run is in progress and handed back by value
/// when it ends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportTable {
    entries: Vec<ResolutionResult>,
}

/// Resolved / unresolved counts, derived from a [`ReportTable`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryCounts {
    pub resolved: usize,
    pub unresolved: usize,
}

impl SummaryCounts {
    pub fn total(&self) -> usize {
        self.resolved + self.unresolved
    }
}

impl ReportTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, result: ResolutionResult) {
        self.entries.push(result);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&ResolutionResult> {
        self.entries.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResolutionResult> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[ResolutionResult] {
        &self.entries
    }

    /// Entries that did not resolve, in table order.
    pub fn failures(&self) -> impl Iterator<Item = &ResolutionResult> {
        self.entries.iter().filter(|r| !r.resolved)
    }

    /// Count entries by their `resolved` flag.
    pub fn summarize(&self) -> SummaryCounts {
        summarize(self)
    }

    /// Render the table as CSV bytes.
    pub fn to_csv(&self) -> Vec<u8> {
        to_csv(self)
    }
}

impl FromIterator<ResolutionResult> for ReportTable {
    fn from_iter<I: IntoIterator<Item = ResolutionResult>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ReportTable {
    type Item = ResolutionResult;
    type IntoIter = std::vec::IntoIter<ResolutionResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a ReportTable {
    type Item = &'a ResolutionResult;
    type IntoIter = std::slice::Iter<'a, ResolutionResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Count entries grouped by `resolved`.
pub fn summarize(table: &ReportTable) -> SummaryCounts {
    let resolved = table.iter().filter(|r| r.resolved).count();
    SummaryCounts {
        resolved,
        unresolved: table.len() - resolved,
    }
}

/// Serialize a table to CSV.
///
/// Columns: DOI, final URL, `Yes`/`No`, status code or `Timeout/Error`. Rows
/// keep table order and end with CRLF. Fields are quoted only when they
/// contain a comma, quote or line break.
pub fn to_csv(table: &ReportTable) -> Vec<u8> {
    let mut out = String::with_capacity(64 * (table.len() + 1));
    write_row(&mut out, CSV_HEADER.iter().copied());

    for result in table {
        let status = result.status.to_string();
        write_row(
            &mut out,
            [
                result.doi.as_str(),
                result.resolved_url.as_str(),
                if result.resolved { "Yes" } else { "No" },
                status.as_str(),
            ]
            .into_iter(),
        );
    }

    out.into_bytes()
}

fn write_row<'a, I: Iterator<Item = &'a str>>(out: &mut String, fields: I) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_field(out, field);
    }
    out.push_str("\r\n");
}

fn write_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\r', '\n']) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}
