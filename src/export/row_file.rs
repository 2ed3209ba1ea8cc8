//! Flat CSV output holding found records only.
//!
//! Files written by older versions may lack a header row. Those are detected by a
//! first-line heuristic; their emails are still salvaged positionally for
//! deduplication, but the file is rewritten with a header and only the new rows.
//! Headerless prior rows are not carried over.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

use super::{write_atomically, ExportSummary};
use crate::records::{ContactRecord, FOUND_HEADERS};

/// Column of the email address in files that have no header row.
const LEGACY_EMAIL_COLUMN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFileState {
    Missing,
    Headerless,
    WithHeaders,
}

/// What could be recovered from the file already on disk.
#[derive(Debug)]
pub struct ExistingRows {
    pub state: RowFileState,
    pub emails: HashSet<String>,
    ends_with_newline: bool,
}

impl ExistingRows {
    fn missing() -> Self {
        Self {
            state: RowFileState::Missing,
            emails: HashSet::new(),
            ends_with_newline: true,
        }
    }
}

/// True when the first line looks like our header row: its first column is exactly
/// `Domain`, or it carries the leading header columns.
pub fn has_header_row(first_line: &str) -> bool {
    let first_line = first_line.trim_start_matches('\u{feff}');
    let first_column = first_line.split(',').next().unwrap_or_default().trim();
    first_column == FOUND_HEADERS[0] || first_line.contains(&FOUND_HEADERS[..3].join(","))
}

pub fn read_existing(path: &Path) -> ExistingRows {
    if !path.exists() {
        return ExistingRows::missing();
    }

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(
                action = "read",
                component = "row_export",
                file_path = ?path,
                error = %e,
                "Existing output unreadable, starting fresh"
            );
            return ExistingRows::missing();
        }
    };

    let text = String::from_utf8_lossy(&bytes);
    let with_headers = has_header_row(text.lines().next().unwrap_or_default());

    let mut reader = ReaderBuilder::new()
        .has_headers(with_headers)
        .flexible(true)
        .from_reader(bytes.as_slice());

    let email_column = if with_headers {
        reader
            .headers()
            .ok()
            .and_then(find_email_column)
            .unwrap_or(LEGACY_EMAIL_COLUMN)
    } else {
        LEGACY_EMAIL_COLUMN
    };

    let mut emails = HashSet::new();
    for (index, row) in reader.records().enumerate() {
        match row {
            Ok(row) => {
                let email = row.get(email_column).unwrap_or_default().trim().to_lowercase();
                if !email.is_empty() {
                    emails.insert(email);
                }
            }
            Err(e) => {
                warn!(
                    action = "parse",
                    component = "row_export",
                    row = index + 1,
                    error = %e,
                    "Skipping malformed row"
                );
            }
        }
    }

    ExistingRows {
        state: if with_headers {
            RowFileState::WithHeaders
        } else {
            RowFileState::Headerless
        },
        emails,
        ends_with_newline: bytes.is_empty() || bytes.ends_with(b"\n"),
    }
}

fn find_email_column(headers: &StringRecord) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case(FOUND_HEADERS[2]))
}

/// Records whose lowercased email is non-empty and not yet in `existing`, in input
/// order. Duplicates within `records` are dropped too.
pub fn select_new<'a>(
    records: &'a [ContactRecord],
    existing: &HashSet<String>,
) -> Vec<&'a ContactRecord> {
    let mut seen = existing.clone();
    records
        .iter()
        .filter(|record| {
            let key = record.email_key();
            !key.is_empty() && seen.insert(key)
        })
        .collect()
}

/// Merges found records into the CSV file at `path`.
pub fn export_rows(records: &[ContactRecord], path: &Path) -> Result<ExportSummary> {
    let existing = read_existing(path);
    let new_records = select_new(records, &existing.emails);

    let summary = ExportSummary {
        found_added: new_records.len(),
        not_found_added: 0,
        duplicates_skipped: records.len() - new_records.len(),
    };

    if new_records.is_empty() {
        info!(
            action = "skip",
            component = "row_export",
            file_path = ?path,
            total = records.len(),
            "No new emails to add"
        );
        return Ok(summary);
    }

    match existing.state {
        RowFileState::Missing | RowFileState::Headerless => {
            if existing.state == RowFileState::Headerless {
                warn!(
                    action = "rewrite",
                    component = "row_export",
                    file_path = ?path,
                    "Existing file has no header row, rewriting with header"
                );
            }
            rewrite(path, &new_records)?;
        }
        RowFileState::WithHeaders => append(path, &new_records, existing.ends_with_newline)?,
    }

    info!(
        action = "complete",
        component = "row_export",
        file_path = ?path,
        added = summary.found_added,
        skipped = summary.duplicates_skipped,
        "Row export finished"
    );
    Ok(summary)
}

fn rewrite(path: &Path, records: &[&ContactRecord]) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(FOUND_HEADERS)?;
    for record in records {
        writer.write_record(record.to_row())?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV buffer: {}", e.error()))?;
    write_atomically(path, &bytes)
}

fn append(path: &Path, records: &[&ContactRecord], ends_with_newline: bool) -> Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {:?} for appending", path))?;
    if !ends_with_newline {
        file.write_all(b"\n")?;
    }

    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
    for record in records {
        writer.write_record(record.to_row())?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to append to {:?}", path))?;
    Ok(())
}
