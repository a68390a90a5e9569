use crate::models::{BookRecord, BookRow};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// How many entries the diagnostics show.
pub const PREVIEW_ROWS: usize = 5;

#[derive(Debug, PartialEq)]
pub enum PersistOutcome {
    Written { rows: usize, path: PathBuf },
    /// Nothing was collected; no file was touched.
    Skipped,
}

// ── Writer ────────────────────────────────────────────────────────────────────

pub struct DatasetWriter;

impl DatasetWriter {
    /// Write `records` as `Title,Price,Rating`, replacing whatever is at `path`.
    pub fn persist(records: &[BookRecord], path: &Path) -> Result<PersistOutcome> {
        if records.is_empty() {
            warn!("No data was available to save to CSV.");
            warn!("First {} entries of the complete dataset:", PREVIEW_ROWS);
            for line in preview(records, PREVIEW_ROWS) {
                warn!("  {}", line);
            }
            return Ok(PersistOutcome::Skipped);
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Could not create dir {:?}", parent))?;
        }

        let rows = to_rows(records);
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to open {:?} for writing", path))?;
        for row in &rows {
            writer
                .serialize(row)
                .with_context(|| format!("Failed to write row {:?}", row.title))?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to flush {:?}", path))?;

        info!("First {} rows of the dataset:", PREVIEW_ROWS);
        for line in preview(records, PREVIEW_ROWS) {
            info!("  {}", line);
        }
        info!("Saved {} rows to {:?}", rows.len(), path);

        Ok(PersistOutcome::Written {
            rows: rows.len(),
            path: path.to_path_buf(),
        })
    }
}

/// Tabular form of the dataset, order preserved.
pub fn to_rows(records: &[BookRecord]) -> Vec<BookRow> {
    records.iter().map(BookRow::from).collect()
}

/// "Book 1: title=... price=... rating=..." for at most `n` records.
pub fn preview(records: &[BookRecord], n: usize) -> Vec<String> {
    records
        .iter()
        .take(n)
        .enumerate()
        .map(|(i, r)| format!("Book {}: {}", i + 1, r))
        .collect()
}
