use std::sync::OnceLock;

use chrono::{NaiveDateTime, NaiveTime};
use regex::Regex;
use thiserror::Error;

use crate::tabular::{is_blank_row, write_rows, WriteError};

/// Zero-based row holding the real header in typical bank exports (row 5).
pub const DEFAULT_HEADER_ROW_INDEX: usize = 4;

const DATE_COLUMN: &str = "date";

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_date_range,
    r"(?i)^\s*(?:\d{1,4}[/.-]\d{1,2}[/.-]\d{1,4}|[a-z]{3,9}\.?\s+\d{1,2},?\s+\d{4})\s*[-\x{2013}\x{2014}]\s*(?:\d{1,4}[/.-]\d{1,2}[/.-]\d{1,4}|[a-z]{3,9}\.?\s+\d{1,2},?\s+\d{4})\s*$");
re!(re_summary_label,
    r"(?i)^\s*(?:total\s*inflows|total\s*outflows|net\s*total)");

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("No data found at row {}", .index + 1)]
    NoHeaderRow { index: usize },
    #[error("Header row is empty")]
    EmptyHeader,
    #[error("Failed to write CSV: {0}")]
    Write(#[from] WriteError),
}

/// A scalar cell as handed over by a spreadsheet reader.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SheetValue {
    #[default]
    Blank,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl SheetValue {
    /// Text form of the cell, trimmed.
    pub fn to_text(&self) -> String {
        match self {
            SheetValue::Blank => String::new(),
            SheetValue::Text(s) => s.trim().to_string(),
            SheetValue::Number(n) => format_number(*n),
            SheetValue::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
            SheetValue::DateTime(dt) => {
                if dt.time() == NaiveTime::MIN {
                    dt.format("%m/%d/%Y").to_string()
                } else {
                    dt.format("%m/%d/%Y %H:%M:%S").to_string()
                }
            }
        }
    }
}

impl From<&str> for SheetValue {
    fn from(s: &str) -> Self {
        SheetValue::Text(s.to_string())
    }
}

impl From<String> for SheetValue {
    fn from(s: String) -> Self {
        SheetValue::Text(s)
    }
}

impl From<f64> for SheetValue {
    fn from(n: f64) -> Self {
        SheetValue::Number(n)
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub header_row_index: usize,
    /// Drop rows whose Date cell holds a `start - end` range.
    pub detect_date_ranges: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            header_row_index: DEFAULT_HEADER_ROW_INDEX,
            detect_date_ranges: true,
        }
    }
}

/// Header and data rows cut down to the header's column span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl NormalizedSheet {
    pub fn to_csv(&self) -> Result<String, WriteError> {
        write_rows(self.headers.as_slice(), &self.rows)
    }

    fn date_column(&self) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(DATE_COLUMN))
    }
}

/// Locates the header, trims columns, drops blank and summary rows, and
/// fills omitted dates from the row above.
pub fn normalize(
    grid: &[Vec<SheetValue>],
    options: &NormalizeOptions,
) -> Result<NormalizedSheet, NormalizeError> {
    let index = options.header_row_index;
    let header_row = grid.get(index).ok_or(NormalizeError::NoHeaderRow { index })?;

    let header_cells: Vec<String> = header_row.iter().map(SheetValue::to_text).collect();
    let first = header_cells
        .iter()
        .position(|c| !c.is_empty())
        .ok_or(NormalizeError::EmptyHeader)?;
    let last = header_cells
        .iter()
        .rposition(|c| !c.is_empty())
        .unwrap_or(first);

    let mut sheet = NormalizedSheet {
        headers: header_cells[first..=last].to_vec(),
        rows: Vec::new(),
    };
    let date_col = sheet.date_column();

    let mut blank = 0usize;
    let mut summary = 0usize;
    for row in &grid[index + 1..] {
        let cells: Vec<String> = (first..=last)
            .map(|i| row.get(i).map(SheetValue::to_text).unwrap_or_default())
            .collect();

        if is_blank_row(&cells) {
            blank += 1;
            continue;
        }
        let range_col = date_col.filter(|_| options.detect_date_ranges);
        if is_summary_row(&cells, range_col) {
            summary += 1;
            continue;
        }
        sheet.rows.push(cells);
    }

    if let Some(col) = date_col {
        carry_dates_forward(&mut sheet.rows, col);
    }

    tracing::debug!(
        header_row = index,
        columns = sheet.headers.len(),
        rows = sheet.rows.len(),
        blank,
        summary,
        "normalized spreadsheet"
    );
    Ok(sheet)
}

/// [`normalize`], then serialize to delimited text.
pub fn normalize_spreadsheet(
    grid: &[Vec<SheetValue>],
    options: &NormalizeOptions,
) -> Result<String, NormalizeError> {
    Ok(normalize(grid, options)?.to_csv()?)
}

/// A total line rather than a transaction: a date range in the Date column,
/// or a leading `Total Inflows` / `Total Outflows` / `Net Total` label.
pub fn is_summary_row(cells: &[String], date_col: Option<usize>) -> bool {
    if let Some(value) = date_col.and_then(|col| cells.get(col)) {
        if re_date_range().is_match(value) {
            return true;
        }
    }
    cells
        .iter()
        .find(|c| !c.is_empty())
        .is_some_and(|label| re_summary_label().is_match(label))
}

fn carry_dates_forward(rows: &mut [Vec<String>], col: usize) {
    let mut last_date: Option<String> = None;
    for row in rows {
        match row.get_mut(col) {
            Some(cell) if cell.is_empty() => {
                if let Some(date) = &last_date {
                    cell.clone_from(date);
                }
            }
            Some(cell) => last_date = Some(cell.clone()),
            None => {}
        }
    }
}
