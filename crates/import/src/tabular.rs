//! Comma-separated text with double-quote enclosure.
//!
//! Reading is hand-rolled because the grammar is deliberately lenient about
//! where quoting starts, yet strict about where it ends. Writing goes through
//! the `csv` crate, whose minimal quoting is exactly what the reader accepts.

use std::string::FromUtf8Error;

use thiserror::Error;

const BOM: char = '\u{feff}';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("CSV is empty")]
    EmptyInput,
    #[error("CSV contains an unmatched quote")]
    UnterminatedQuote,
    #[error("Row {row} has more values than headers")]
    RowTooWide { row: usize },
}

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Output is not UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}

/// Splits `text` into rows of raw (untrimmed) cells.
///
/// Outside quoting, `,` ends a cell and `\n`, `\r\n` or a lone `\r` ends a
/// row. A `"` outside quoting opens a quoted run wherever it appears; inside,
/// `""` is a literal quote and a lone `"` closes the run. Blank rows are kept.
pub fn tokenize(text: &str) -> Result<Vec<Vec<String>>, ParseError> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    cell.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                cell.push(c);
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut cell)),
            '\n' | '\r' => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(std::mem::take(&mut cell));
                rows.push(std::mem::take(&mut row));
            }
            _ => cell.push(c),
        }
    }

    if in_quotes {
        return Err(ParseError::UnterminatedQuote);
    }
    if !cell.is_empty() || !row.is_empty() {
        row.push(cell);
        rows.push(row);
    }

    Ok(rows)
}

pub fn is_blank_row<S: AsRef<str>>(row: &[S]) -> bool {
    row.iter().all(|cell| cell.as_ref().trim().is_empty())
}

/// Strips a leading BOM, tokenizes, and drops blank rows.
/// Fails with [`ParseError::EmptyInput`] when nothing is left.
pub fn read_rows(text: &str) -> Result<Vec<Vec<String>>, ParseError> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let rows: Vec<Vec<String>> = tokenize(text)?
        .into_iter()
        .filter(|row| !is_blank_row(row))
        .collect();

    if rows.is_empty() {
        return Err(ParseError::EmptyInput);
    }
    tracing::debug!(rows = rows.len(), "tokenized delimited text");
    Ok(rows)
}

/// Serializes a header and rows into text [`read_rows`] reads back unchanged.
///
/// Values containing a comma, a quote or a line break are quoted with inner
/// quotes doubled; everything else is written bare.
pub fn write_rows<H, R, S>(header: &[H], rows: R) -> Result<String, WriteError>
where
    H: AsRef<str>,
    R: IntoIterator,
    R::Item: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer.write_record(header.iter().map(|h| h.as_ref().as_bytes()))?;
    for row in rows {
        let cells: Vec<S> = row.into_iter().collect();
        writer.write_record(cells.iter().map(|c| c.as_ref().as_bytes()))?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}
