//! Merging a run's records into the persisted output file.
//!
//! Both targets read whatever prior state they can recover, drop every new record
//! whose key is already stored, and write only when something new remains.

pub mod row_file;
pub mod workbook;

use anyhow::{Context, Result};
use clap::ValueEnum;
use std::fmt;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::records::RecordSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Pick by file extension: `.xlsx` is a workbook, anything else a CSV file
    Auto,
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn resolve(self, path: &Path) -> ExportFormat {
        match self {
            ExportFormat::Auto => {
                let is_xlsx = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));
                if is_xlsx {
                    ExportFormat::Xlsx
                } else {
                    ExportFormat::Csv
                }
            }
            concrete => concrete,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub found_added: usize,
    pub not_found_added: usize,
    pub duplicates_skipped: usize,
}

impl ExportSummary {
    pub fn added(&self) -> usize {
        self.found_added + self.not_found_added
    }

    pub fn wrote_anything(&self) -> bool {
        self.added() > 0
    }
}

impl fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "added {} found / {} not-found record(s), {} duplicate(s) skipped",
            self.found_added, self.not_found_added, self.duplicates_skipped
        )
    }
}

/// Merges `records` into the file at `path` using the given (or inferred) format.
pub fn export(records: &RecordSet, path: &Path, format: ExportFormat) -> Result<ExportSummary> {
    match format.resolve(path) {
        ExportFormat::Xlsx => workbook::export_workbook(records, path),
        _ => row_file::export_rows(&records.found, path),
    }
}

/// Replaces `path` with `bytes` via a temp file in the same directory, so a failed
/// write never leaves a half-written artifact behind.
pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {:?}", dir))?;
    tmp.write_all(bytes)
        .with_context(|| format!("Failed to write temporary file for {:?}", path))?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_format_follows_extension() {
        assert_eq!(ExportFormat::Auto.resolve(Path::new("out.xlsx")), ExportFormat::Xlsx);
        assert_eq!(ExportFormat::Auto.resolve(Path::new("out.XLSX")), ExportFormat::Xlsx);
        assert_eq!(ExportFormat::Auto.resolve(Path::new("out.csv")), ExportFormat::Csv);
        assert_eq!(ExportFormat::Auto.resolve(Path::new("out")), ExportFormat::Csv);
    }

    #[test]
    fn test_explicit_format_wins_over_extension() {
        assert_eq!(ExportFormat::Xlsx.resolve(Path::new("out.csv")), ExportFormat::Xlsx);
        assert_eq!(ExportFormat::Csv.resolve(Path::new("out.xlsx")), ExportFormat::Csv);
    }

    #[test]
    fn test_summary_display() {
        let summary = ExportSummary {
            found_added: 2,
            not_found_added: 1,
            duplicates_skipped: 4,
        };
        assert_eq!(
            summary.to_string(),
            "added 2 found / 1 not-found record(s), 4 duplicate(s) skipped"
        );
        assert_eq!(summary.added(), 3);
    }
}
