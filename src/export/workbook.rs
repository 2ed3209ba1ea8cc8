//! Two-sheet XLSX output: found contacts and domains without results.
//!
//! The prior workbook is read in full with calamine, merged in memory and written
//! back once with rust_xlsxwriter. Sheets other than the two result sheets are
//! copied over cell by cell, and date cells keep a date format. A workbook that
//! cannot be opened or whose sheets cannot be read is ignored entirely and
//! replaced by a fresh one.

use anyhow::Result;
use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatPattern, Workbook, Worksheet};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

use super::{write_atomically, ExportSummary};
use crate::records::{
    ContactRecord, NoResultRecord, RecordSet, FOUND_HEADERS, NOT_FOUND_HEADERS,
};

pub const FOUND_SHEET: &str = "Found";
pub const NOT_FOUND_SHEET: &str = "Not Found";

const FOUND_WIDTHS: [f64; 10] = [22.0, 28.0, 35.0, 15.0, 15.0, 35.0, 18.0, 12.0, 22.0, 20.0];
const NOT_FOUND_WIDTHS: [f64; 5] = [25.0, 28.0, 22.0, 45.0, 20.0];
const HEADER_FILL: u32 = 0x1F4E78;
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";
const DURATION_FORMAT: &str = "[h]:mm:ss";

/// A single cell value carried over from a prior workbook.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Bool(bool),
    /// Excel serial date, written back with a date format.
    DateTime(f64),
    Duration(f64),
    Empty,
}

impl Cell {
    fn key(&self) -> String {
        match self {
            Cell::Text(text) => text.trim().to_lowercase(),
            Cell::Number(n) | Cell::DateTime(n) | Cell::Duration(n) => n.to_string(),
            Cell::Bool(b) => b.to_string(),
            Cell::Empty => String::new(),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(text) if text.is_empty() => Cell::Empty,
            Data::String(text) => Cell::Text(text.clone()),
            Data::Float(n) => Cell::Number(*n),
            Data::Int(n) => Cell::Number(*n as f64),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) if dt.is_duration() => Cell::Duration(dt.as_f64()),
            Data::DateTime(dt) => Cell::DateTime(dt.as_f64()),
            other => Cell::Text(other.to_string()),
        }
    }
}

type Rows = Vec<Vec<Cell>>;

/// A sheet the export does not own, copied cell by cell at its original positions.
#[derive(Debug, Clone, PartialEq)]
pub struct OtherSheet {
    pub name: String,
    pub cells: Vec<(u32, u16, Cell)>,
}

/// Data rows (header excluded) recovered per sheet; `None` when the sheet is absent.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PriorWorkbook {
    pub found: Option<Rows>,
    pub not_found: Option<Rows>,
    pub others: Vec<OtherSheet>,
    /// Sheet names in workbook order.
    pub sheet_order: Vec<String>,
}

impl PriorWorkbook {
    fn column_keys(rows: &Option<Rows>, column: usize) -> HashSet<String> {
        rows.iter()
            .flatten()
            .filter_map(|row| row.get(column).map(Cell::key))
            .filter(|key| !key.is_empty())
            .collect()
    }

    pub fn found_emails(&self) -> HashSet<String> {
        Self::column_keys(&self.found, 2)
    }

    pub fn found_domains(&self) -> HashSet<String> {
        Self::column_keys(&self.found, 0)
    }

    pub fn not_found_domains(&self) -> HashSet<String> {
        Self::column_keys(&self.not_found, 0)
    }
}

/// Reads the workbook at `path`. Missing, unopenable and unreadable files all come
/// back as `None`.
pub fn read_prior(path: &Path) -> Option<PriorWorkbook> {
    if !path.exists() {
        return None;
    }

    let mut workbook: Xlsx<_> = match open_workbook(path) {
        Ok(workbook) => workbook,
        Err(e) => {
            warn!(
                action = "read",
                component = "workbook_export",
                file_path = ?path,
                error = %e,
                "Existing workbook unreadable, creating a new one"
            );
            return None;
        }
    };

    let sheet_names = workbook.sheet_names();
    let mut prior = PriorWorkbook {
        sheet_order: sheet_names.clone(),
        ..PriorWorkbook::default()
    };
    for name in &sheet_names {
        let range = match workbook.worksheet_range(name) {
            Ok(range) => range,
            Err(e) => {
                warn!(
                    action = "read",
                    component = "workbook_export",
                    file_path = ?path,
                    sheet = name.as_str(),
                    error = %e,
                    "Sheet unreadable, creating a new workbook"
                );
                return None;
            }
        };

        let slot = match name.as_str() {
            FOUND_SHEET => &mut prior.found,
            NOT_FOUND_SHEET => &mut prior.not_found,
            _ => {
                let (start_row, start_col) = range.start().unwrap_or_default();
                let cells = range
                    .cells()
                    .map(|(row, col, data)| {
                        let row = start_row + row as u32;
                        let col = (start_col + col as u32) as u16;
                        (row, col, Cell::from(data))
                    })
                    .filter(|(_, _, cell)| *cell != Cell::Empty)
                    .collect();
                prior.others.push(OtherSheet {
                    name: name.clone(),
                    cells,
                });
                continue;
            }
        };
        let rows = range
            .rows()
            .skip(1)
            .map(|row| row.iter().map(Cell::from).collect::<Vec<_>>())
            .filter(|row| row.iter().any(|cell| *cell != Cell::Empty))
            .collect();
        *slot = Some(rows);
    }

    Some(prior)
}

/// New records to append, after removing everything already stored.
#[derive(Debug, Default)]
pub struct WorkbookDelta<'a> {
    pub found: Vec<&'a ContactRecord>,
    pub not_found: Vec<&'a NoResultRecord>,
}

impl WorkbookDelta<'_> {
    pub fn is_empty(&self) -> bool {
        self.found.is_empty() && self.not_found.is_empty()
    }
}

/// Found records are keyed by email. Not-found records are keyed by domain and are
/// also dropped when that domain has a found record, old or new.
pub fn select_new<'a>(records: &'a RecordSet, prior: &PriorWorkbook) -> WorkbookDelta<'a> {
    let mut emails = prior.found_emails();
    let mut found_domains = prior.found_domains();
    let mut not_found_domains = prior.not_found_domains();

    let found: Vec<&ContactRecord> = records
        .found
        .iter()
        .filter(|record| {
            let key = record.email_key();
            !key.is_empty() && emails.insert(key)
        })
        .collect();
    found_domains.extend(records.found.iter().map(ContactRecord::domain_key));

    let not_found = records
        .not_found
        .iter()
        .filter(|record| {
            let key = record.domain_key();
            !found_domains.contains(&key) && not_found_domains.insert(key)
        })
        .collect();

    WorkbookDelta { found, not_found }
}

/// Merges `records` into the workbook at `path`.
pub fn export_workbook(records: &RecordSet, path: &Path) -> Result<ExportSummary> {
    let prior = read_prior(path);
    let is_new = prior.is_none();
    let prior = prior.unwrap_or_default();
    let delta = select_new(records, &prior);

    let summary = ExportSummary {
        found_added: delta.found.len(),
        not_found_added: delta.not_found.len(),
        duplicates_skipped: records.total() - delta.found.len() - delta.not_found.len(),
    };

    if delta.is_empty() {
        info!(
            action = "skip",
            component = "workbook_export",
            file_path = ?path,
            total = records.total(),
            "No new records to add"
        );
        return Ok(summary);
    }

    let mut workbook = Workbook::new();
    let header = header_format();
    let date = Format::new().set_num_format(DATETIME_FORMAT);
    let duration = Format::new().set_num_format(DURATION_FORMAT);

    let mut order = prior.sheet_order.clone();
    for name in [FOUND_SHEET, NOT_FOUND_SHEET] {
        if !order.iter().any(|sheet| sheet == name) {
            order.push(name.to_string());
        }
    }

    for name in &order {
        match name.as_str() {
            FOUND_SHEET => {
                let sheet =
                    new_sheet(&mut workbook, FOUND_SHEET, &FOUND_HEADERS, &FOUND_WIDTHS, &header)?;
                let prior_rows = prior.found.as_deref().unwrap_or_default();
                let mut row = write_prior_rows(sheet, prior_rows, &date, &duration)?;
                for record in &delta.found {
                    write_found(sheet, row, record)?;
                    row += 1;
                }
            }
            NOT_FOUND_SHEET => {
                let sheet = new_sheet(
                    &mut workbook,
                    NOT_FOUND_SHEET,
                    &NOT_FOUND_HEADERS,
                    &NOT_FOUND_WIDTHS,
                    &header,
                )?;
                let prior_rows = prior.not_found.as_deref().unwrap_or_default();
                let mut row = write_prior_rows(sheet, prior_rows, &date, &duration)?;
                for record in &delta.not_found {
                    write_text_row(sheet, row, &record.to_row())?;
                    row += 1;
                }
            }
            _ => {
                let Some(other) = prior.others.iter().find(|other| other.name == *name) else {
                    continue;
                };
                let sheet = workbook.add_worksheet();
                sheet.set_name(&other.name)?;
                for (row, col, cell) in &other.cells {
                    write_cell(sheet, *row, *col, cell, &date, &duration)?;
                }
            }
        }
    }

    let bytes = workbook.save_to_buffer()?;
    write_atomically(path, &bytes)?;

    info!(
        action = "complete",
        component = "workbook_export",
        file_path = ?path,
        created = is_new,
        found_added = summary.found_added,
        not_found_added = summary.not_found_added,
        skipped = summary.duplicates_skipped,
        "Workbook export finished"
    );
    Ok(summary)
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_pattern(FormatPattern::Solid)
        .set_align(FormatAlign::Center)
}

fn new_sheet<'a>(
    workbook: &'a mut Workbook,
    name: &str,
    headers: &[&str],
    widths: &[f64],
    format: &Format,
) -> Result<&'a mut Worksheet> {
    let sheet = workbook.add_worksheet();
    sheet.set_name(name)?;
    for (col, (title, width)) in headers.iter().zip(widths).enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *title, format)?;
        sheet.set_column_width(col, *width)?;
    }
    sheet.set_freeze_panes(1, 0)?;
    Ok(sheet)
}

/// Writes prior data rows starting below the header; returns the next free row.
fn write_prior_rows(
    sheet: &mut Worksheet,
    rows: &[Vec<Cell>],
    date: &Format,
    duration: &Format,
) -> Result<u32> {
    let mut row = 1;
    for cells in rows {
        for (col, cell) in cells.iter().enumerate() {
            write_cell(sheet, row, col as u16, cell, date, duration)?;
        }
        row += 1;
    }
    Ok(row)
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    date: &Format,
    duration: &Format,
) -> Result<()> {
    match cell {
        Cell::Text(text) => {
            sheet.write_string(row, col, text)?;
        }
        Cell::Number(n) => {
            sheet.write_number(row, col, *n)?;
        }
        Cell::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        Cell::DateTime(serial) => {
            sheet.write_number_with_format(row, col, *serial, date)?;
        }
        Cell::Duration(serial) => {
            sheet.write_number_with_format(row, col, *serial, duration)?;
        }
        Cell::Empty => {}
    }
    Ok(())
}

fn write_found(sheet: &mut Worksheet, row: u32, record: &ContactRecord) -> Result<()> {
    write_text_row(sheet, row, &record.to_row())?;
    // Confidence stays numeric.
    if let Some(confidence) = record.confidence {
        sheet.write_number(row, 7, f64::from(confidence))?;
    }
    Ok(())
}

fn write_text_row(sheet: &mut Worksheet, row: u32, cells: &[String]) -> Result<()> {
    for (col, value) in cells.iter().enumerate() {
        if !value.is_empty() {
            sheet.write_string(row, col as u16, value)?;
        }
    }
    Ok(())
}
