use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;

use crate::tabular::{read_rows, write_rows, ParseError, WriteError};

/// Field names of a parsed table, with name lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    names: Vec<String>,
    index: HashMap<String, usize>,
    folded: HashMap<String, Vec<usize>>,
}

impl Header {
    /// Trims each name and replaces blanks with `column_<position>`. A
    /// placeholder that would repeat a name already in the row gets a
    /// `_<n>` suffix.
    pub fn from_row<S: AsRef<str>>(row: &[S]) -> Self {
        let trimmed: Vec<&str> = row.iter().map(|cell| cell.as_ref().trim()).collect();
        let mut taken: HashSet<String> = trimmed
            .iter()
            .filter(|name| !name.is_empty())
            .map(|name| name.to_string())
            .collect();

        let names: Vec<String> = trimmed
            .iter()
            .enumerate()
            .map(|(i, name)| {
                if !name.is_empty() {
                    return name.to_string();
                }
                let base = format!("column_{}", i + 1);
                let mut candidate = base.clone();
                let mut n = 2;
                while taken.contains(&candidate) {
                    candidate = format!("{base}_{n}");
                    n += 1;
                }
                taken.insert(candidate.clone());
                candidate
            })
            .collect();

        let mut index = HashMap::new();
        let mut folded: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, name) in names.iter().enumerate() {
            // Repeated names resolve to the last column, as a keyed row would.
            index.insert(name.clone(), i);
            folded.entry(name.to_lowercase()).or_default().push(i);
        }

        Header {
            names,
            index,
            folded,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Every column whose name matches `name` ignoring case, left to right.
    pub fn positions_ignore_case(&self, name: &str) -> &[usize] {
        self.folded
            .get(&name.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// One data row, keyed by its table's header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    header: Arc<Header>,
    values: Vec<String>,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.header
            .position(name)
            .map(|i| self.values[i].as_str())
    }

    /// First non-empty value among columns named `name` in any case, or `""`.
    pub fn get_ignore_case(&self, name: &str) -> &str {
        self.header
            .positions_ignore_case(name)
            .iter()
            .map(|&i| self.values[i].as_str())
            .find(|v| !v.is_empty())
            .unwrap_or("")
    }

    /// Values in header order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// `(name, value)` pairs in header order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.header
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }
}

/// Header plus records, as produced by [`parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTable {
    header: Arc<Header>,
    records: Vec<Record>,
}

impl ParsedTable {
    /// Keys raw rows by the first row. Rows must already be free of blanks.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Result<Self, ParseError> {
        let mut rows = rows.into_iter();
        let header = rows.next().ok_or(ParseError::EmptyInput)?;
        let header = Arc::new(Header::from_row(&header));

        let records = rows
            .enumerate()
            .map(|(i, row)| {
                let populated = row
                    .iter()
                    .rposition(|cell| !cell.trim().is_empty())
                    .map_or(0, |last| last + 1);
                if populated > header.len() {
                    return Err(ParseError::RowTooWide { row: i + 1 });
                }

                let values = (0..header.len())
                    .map(|col| row.get(col).map(|c| c.trim().to_string()).unwrap_or_default())
                    .collect();
                Ok(Record {
                    header: Arc::clone(&header),
                    values,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            columns = header.len(),
            records = records.len(),
            "built records"
        );
        Ok(ParsedTable { header, records })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Serializes back to delimited text that [`parse`] reads unchanged.
    pub fn to_csv(&self) -> Result<String, WriteError> {
        write_rows(self.header.names(), self.records.iter().map(|r| r.values.iter()))
    }

    /// Owned snapshot for display or export.
    pub fn raw_view(&self) -> RawView {
        RawView {
            headers: self.header.names().to_vec(),
            rows: self.records.iter().map(|r| r.values.clone()).collect(),
        }
    }
}

/// Headers and every row, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawView {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Parses delimited text into a header and keyed records.
pub fn parse(text: &str) -> Result<ParsedTable, ParseError> {
    ParsedTable::from_rows(read_rows(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── parse ─────────────────────────────────────────────────────────────────

    #[test]
    fn parse_trims_headers_and_values() {
        let table = parse("Category,Amount\n Food , 12.34 \n").unwrap();
        assert_eq!(table.header().names(), &["Category", "Amount"]);
        assert_eq!(table.records()[0].get("Category"), Some("Food"));
        assert_eq!(table.records()[0].get("Amount"), Some("12.34"));
    }

    #[test]
    fn parse_replaces_blank_headers_by_position() {
        let table = parse("Category,,Amount,\nFood,test,12,\n").unwrap();
        assert_eq!(
            table.header().names(),
            &["Category", "column_2", "Amount", "column_4"]
        );
        assert_eq!(table.records()[0].get("column_2"), Some("test"));
    }

    #[test]
    fn parse_placeholder_does_not_shadow_literal_name() {
        let table = parse("column_2,,x\na,b,c\n").unwrap();
        assert_eq!(table.header().names(), &["column_2", "column_2_2", "x"]);
        assert_eq!(table.records()[0].get("column_2"), Some("a"));
        assert_eq!(table.records()[0].get("column_2_2"), Some("b"));
    }

    #[test]
    fn parse_bom_quotes_and_newlines() {
        let table =
            parse("\u{feff}Category,Description\nFood,\"line 1\nline 2, with \"\"quote\"\"\"").unwrap();
        let record = &table.records()[0];
        assert_eq!(record.get("Category"), Some("Food"));
        assert_eq!(
            record.get("Description"),
            Some("line 1\nline 2, with \"quote\"")
        );
    }

    #[test]
    fn parse_missing_trailing_cells_are_empty() {
        let table = parse("a,b,c\n1\n").unwrap();
        assert_eq!(table.records()[0].values(), &["1", "", ""]);
    }

    #[test]
    fn parse_row_too_wide_reports_data_row() {
        let err = parse("Category,Amount\nFood,10\n\nGas,5,extra\n").unwrap_err();
        assert_eq!(err, ParseError::RowTooWide { row: 2 });
        assert_eq!(err.to_string(), "Row 2 has more values than headers");
    }

    #[test]
    fn parse_trailing_empty_cells_are_not_populated() {
        let table = parse("Category,Amount\nFood,10,,\n").unwrap();
        assert_eq!(table.records()[0].values(), &["Food", "10"]);
    }

    #[test]
    fn parse_empty_inputs() {
        assert_eq!(parse(""), Err(ParseError::EmptyInput));
        assert_eq!(parse("\n,\n  \n"), Err(ParseError::EmptyInput));
    }

    #[test]
    fn parse_header_only_has_no_records() {
        let table = parse("Category,Amount\n").unwrap();
        assert!(table.is_empty());
    }

    // ── lookup ────────────────────────────────────────────────────────────────

    #[test]
    fn get_ignore_case_falls_through_empty_columns() {
        let table = parse("Category,category,AMOUNT\n,Food,5\n").unwrap();
        let record = &table.records()[0];
        assert_eq!(record.get_ignore_case("category"), "Food");
        assert_eq!(record.get_ignore_case("Amount"), "5");
        assert_eq!(record.get_ignore_case("Memo"), "");
    }

    #[test]
    fn fields_pairs_names_with_values() {
        let table = parse("a,b\n1,2\n").unwrap();
        let fields: Vec<_> = table.records()[0].fields().collect();
        assert_eq!(fields, vec![("a", "1"), ("b", "2")]);
    }

    // ── round trip ────────────────────────────────────────────────────────────

    #[test]
    fn to_csv_round_trips() {
        let text = "Category,,Memo\nAuto:Gas,\"1,000\",\"He said \"\"go\"\"\"\n\nTax,5,\"two\nlines\"\nGift,,\n";
        let table = parse(text).unwrap();
        let reparsed = parse(&table.to_csv().unwrap()).unwrap();
        assert_eq!(reparsed.header().names(), table.header().names());
        assert_eq!(reparsed.raw_view(), table.raw_view());
    }
}
