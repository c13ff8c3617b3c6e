pub mod extract;
pub mod sheet;
pub mod table;
pub mod tabular;

pub use extract::{extract_transaction, extract_transactions};
pub use sheet::{
    normalize, normalize_spreadsheet, NormalizeError, NormalizeOptions, NormalizedSheet,
    SheetValue, DEFAULT_HEADER_ROW_INDEX,
};
pub use table::{parse, Header, ParsedTable, RawView, Record};
pub use tabular::{ParseError, WriteError};

pub mod import {
    use crate::*;
    use sankeyfin_core::Transaction;

    pub fn import_csv(text: &str) -> Result<ParsedTable, ParseError> {
        crate::table::parse(text)
    }

    pub fn convert_sheet(
        grid: &[Vec<SheetValue>],
        options: &NormalizeOptions,
    ) -> Result<String, NormalizeError> {
        crate::sheet::normalize_spreadsheet(grid, options)
    }

    pub fn import_transactions(table: &ParsedTable) -> Vec<Transaction> {
        crate::extract::extract_transactions(table.records())
    }
}
