use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use sankeyfin_import::SheetValue;
use thiserror::Error;

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

#[derive(Error, Debug)]
pub enum WorkbookError {
    #[error("Spreadsheet error: {0}")]
    Calamine(#[from] calamine::Error),
    #[error("Workbook has no sheets")]
    NoSheets,
    #[error("Sheet not found: {0}")]
    MissingSheet(String),
}

/// True when the path's extension names a spreadsheet format.
pub fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SPREADSHEET_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Reads one worksheet (the first when `sheet` is `None`) into a grid
/// addressed from cell A1.
pub fn read_grid(path: &Path, sheet: Option<&str>) -> Result<Vec<Vec<SheetValue>>, WorkbookError> {
    let mut workbook = open_workbook_auto(path)?;
    let name = match sheet {
        Some(name) => {
            if !workbook.sheet_names().iter().any(|s| s == name) {
                return Err(WorkbookError::MissingSheet(name.to_string()));
            }
            name.to_string()
        }
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or(WorkbookError::NoSheets)?,
    };

    let range = workbook.worksheet_range(&name)?;
    let grid = range_to_grid(&range);
    tracing::debug!(sheet = %name, rows = grid.len(), "read worksheet");
    Ok(grid)
}

/// calamine trims leading empty rows and columns from a range; pad them back
/// so that row and column indexes match the sheet.
fn range_to_grid(range: &Range<Data>) -> Vec<Vec<SheetValue>> {
    let (row_offset, col_offset) = range.start().unwrap_or((0, 0));
    let mut grid: Vec<Vec<SheetValue>> = vec![Vec::new(); row_offset as usize];
    for row in range.rows() {
        let mut cells = vec![SheetValue::Blank; col_offset as usize];
        cells.extend(row.iter().map(to_sheet_value));
        grid.push(cells);
    }
    grid
}

fn to_sheet_value(cell: &Data) -> SheetValue {
    match cell {
        Data::Empty | Data::Error(_) => SheetValue::Blank,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => SheetValue::Text(s.clone()),
        Data::Float(f) => SheetValue::Number(*f),
        Data::Int(i) => SheetValue::Number(*i as f64),
        Data::Bool(b) => SheetValue::Bool(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(SheetValue::DateTime)
            .unwrap_or(SheetValue::Number(dt.as_f64())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spreadsheet_extensions() {
        assert!(is_spreadsheet(Path::new("export.xlsx")));
        assert!(is_spreadsheet(Path::new("EXPORT.XLSX")));
        assert!(is_spreadsheet(Path::new("budget.ods")));
        assert!(!is_spreadsheet(Path::new("export.csv")));
        assert!(!is_spreadsheet(Path::new("export")));
    }

    #[test]
    fn range_offset_is_padded() {
        let mut range: Range<Data> = Range::new((2, 1), (3, 2));
        range.set_value((2, 1), Data::String("Category".to_string()));
        range.set_value((2, 2), Data::String("Amount".to_string()));
        range.set_value((3, 1), Data::String("Tax".to_string()));
        range.set_value((3, 2), Data::Float(5.0));

        let grid = range_to_grid(&range);
        assert_eq!(grid.len(), 4);
        assert!(grid[0].is_empty());
        assert_eq!(grid[2][0], SheetValue::Blank);
        assert_eq!(grid[2][1], SheetValue::from("Category"));
        assert_eq!(grid[3][2], SheetValue::Number(5.0));
    }

    #[test]
    fn cell_conversion() {
        assert_eq!(to_sheet_value(&Data::Int(7)), SheetValue::Number(7.0));
        assert_eq!(to_sheet_value(&Data::Bool(false)), SheetValue::Bool(false));
        assert_eq!(to_sheet_value(&Data::Empty), SheetValue::Blank);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_grid(Path::new("/nonexistent/sheet.xlsx"), None).is_err());
    }
}
