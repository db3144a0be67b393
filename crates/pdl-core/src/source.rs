//! Spreadsheet work-item source.
//!
//! Columns 0 to 4 of the first worksheet are customer id, business type,
//! storage path, application number and phone number. Row 0 is a header.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use calamine::{Data, Reader, open_workbook_auto};

use crate::types::WorkItem;
use crate::{Error, ErrorKind, Result};

/// Tracing target for the spreadsheet source.
pub const TRACING_TARGET: &str = "pdl_core::source";

/// Object-storage URL prefix stripped from storage paths by default.
pub const DEFAULT_STORAGE_URL_PREFIX: &str = "https://qt-fpdl-app.s3.ap-south-1.amazonaws.com/";

/// Reads [`WorkItem`]s from a workbook on disk.
#[derive(Debug, Clone)]
pub struct SpreadsheetSource {
    path: PathBuf,
    url_prefix: String,
}

impl SpreadsheetSource {
    /// Creates a source for the workbook at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            url_prefix: DEFAULT_STORAGE_URL_PREFIX.to_owned(),
        }
    }

    /// Sets the URL prefix stripped from storage paths.
    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into();
        self
    }

    /// Workbook path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads, normalizes and deduplicates every data row.
    pub async fn load(&self) -> Result<Vec<WorkItem>> {
        let path = self.path.clone();
        let rows = tokio::task::spawn_blocking(move || read_rows(&path))
            .await
            .map_err(|e| Error::from_source(ErrorKind::InternalError, e))??;

        let total = rows.len().saturating_sub(1);
        let items = dedup_customers(parse_rows(rows.into_iter().skip(1), &self.url_prefix));

        tracing::info!(
            target: TRACING_TARGET,
            path = %self.path.display(),
            rows = total,
            items = items.len(),
            "Loaded work items"
        );

        Ok(items)
    }
}

/// Reads the first worksheet as rows of text cells.
pub fn read_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| Error::from(e).with_context(path.display().to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::invalid_input("Workbook has no worksheets"))??;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

/// Maps data rows to work items, dropping rows with an empty storage path.
///
/// The header row must already be removed.
pub fn parse_rows<I>(rows: I, url_prefix: &str) -> Vec<WorkItem>
where
    I: IntoIterator<Item = Vec<String>>,
{
    rows.into_iter()
        .filter_map(|row| {
            let cell = |index: usize| row.get(index).map(|c| c.trim()).unwrap_or_default();

            let storage_key = normalize_key(cell(2), url_prefix);
            if storage_key.is_empty() {
                return None;
            }

            Some(WorkItem::new(cell(0), cell(1), storage_key, cell(3), cell(4)))
        })
        .collect()
}

/// Strips the object-storage URL prefix and any leading `/`.
pub fn normalize_key(path: &str, url_prefix: &str) -> String {
    let path = path.trim();
    let path = if url_prefix.is_empty() {
        path
    } else {
        path.strip_prefix(url_prefix).unwrap_or(path)
    };

    path.trim_start_matches('/').to_owned()
}

/// Keeps the first row of every customer id.
pub fn dedup_customers(items: Vec<WorkItem>) -> Vec<WorkItem> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| {
            let first = seen.insert(item.customer_id.clone());
            if !first {
                tracing::warn!(
                    target: TRACING_TARGET,
                    customer_id = %item.customer_id,
                    "Duplicate customer row ignored"
                );
            }
            first
        })
        .collect()
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        // Phone numbers and ids arrive as floats.
        Data::Float(f) if f.fract() == 0.0 => format!("{f:.0}"),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}
