//! Spreadsheet input (xlsx, xls, ods) via calamine.

use std::path::Path;

use calamine::{Reader, open_workbook_auto};
use ligbench_shared::{LigbenchError, Result};
use tracing::{debug, warn};

use crate::{Table, read_csv};

const SHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Whether `path` has a spreadsheet extension (case-insensitive).
pub fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| SHEET_EXTENSIONS.contains(&ext.as_str()))
}

/// Load one worksheet as a [`Table`]: the named sheet, or the first one.
///
/// The first used row is the header. Cells are kept as their displayed
/// text, so empty cells become empty strings and whole numbers lose
/// their fraction (`7.0` reads as `7`).
pub fn read_sheet(path: &Path, sheet: Option<&str>) -> Result<Table> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| LigbenchError::sheet(path, e.to_string()))?;

    let names = workbook.sheet_names();
    let name = match sheet {
        Some(wanted) => names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| {
                LigbenchError::sheet(
                    path,
                    format!("no sheet named '{wanted}' (found: {})", names.join(", ")),
                )
            })?,
        None => names
            .first()
            .cloned()
            .ok_or_else(|| LigbenchError::sheet(path, "workbook has no sheets"))?,
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| LigbenchError::sheet(path, e.to_string()))?;

    let mut rows = range
        .rows()
        .map(|cells| cells.iter().map(|c| c.to_string()).collect::<Vec<String>>());

    let headers = rows
        .next()
        .filter(|h| h.iter().any(|c| !c.is_empty()))
        .ok_or_else(|| LigbenchError::sheet(path, format!("sheet '{name}' has no columns")))?;

    let mut table = Table::new(headers);
    for row in rows {
        table.push_row(row)?;
    }

    debug!(path = %path.display(), sheet = %name, rows = table.len(), "read sheet");
    Ok(table)
}

/// Read a tabular file, picking the reader from the extension:
/// spreadsheets go through [`read_sheet`], anything else is CSV.
pub fn read_table(path: &Path, sheet: Option<&str>) -> Result<Table> {
    if is_spreadsheet(path) {
        return read_sheet(path, sheet);
    }
    if let Some(sheet) = sheet {
        warn!(path = %path.display(), sheet, "sheet name ignored for CSV input");
    }
    read_csv(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_path(name: &str) -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures/sheets")
            .join(name)
    }

    #[test]
    fn recognizes_spreadsheet_extensions() {
        assert!(is_spreadsheet(Path::new("ids/entries.xlsx")));
        assert!(is_spreadsheet(Path::new("ids/ENTRIES.XLS")));
        assert!(is_spreadsheet(Path::new("ids/entries.ods")));
        assert!(!is_spreadsheet(Path::new("ids/entries.csv")));
        assert!(!is_spreadsheet(Path::new("ids/entries")));
    }

    #[test]
    fn reads_first_sheet_by_default() {
        let table = read_sheet(&fixture_path("entries.xlsx"), None).unwrap();
        assert_eq!(table.headers(), ["entryName", "note"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[0], ["1abc_A_ATP", "first"]);
        assert_eq!(table.rows()[1], ["2xyz", ""]);
        assert_eq!(table.rows()[2], ["1abc_B_ADP", "7"]);
    }

    #[test]
    fn reads_named_sheet() {
        let table = read_sheet(&fixture_path("entries.xlsx"), Some("other")).unwrap();
        assert_eq!(table.headers(), ["pdb"]);
        assert_eq!(table.column(0).collect::<Vec<_>>(), ["9zzz"]);
    }

    #[test]
    fn unknown_sheet_lists_available_names() {
        let err = read_sheet(&fixture_path("entries.xlsx"), Some("missing")).unwrap_err();
        assert!(matches!(err, LigbenchError::Sheet { .. }));
        assert!(err.to_string().contains("entries, other"), "{err}");
    }

    #[test]
    fn unreadable_workbook_is_sheet_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, "not a zip archive").unwrap();

        let err = read_sheet(&path, None).unwrap_err();
        assert!(matches!(err, LigbenchError::Sheet { .. }));
    }

    #[test]
    fn read_table_dispatches_on_extension() {
        let sheet = read_table(&fixture_path("entries.xlsx"), None).unwrap();
        assert_eq!(sheet.headers(), ["entryName", "note"]);

        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("entries.csv");
        std::fs::write(&csv, "entryName\n5abc_A\n").unwrap();
        let table = read_table(&csv, Some("ignored")).unwrap();
        assert_eq!(table.column(0).collect::<Vec<_>>(), ["5abc_A"]);
    }
}
