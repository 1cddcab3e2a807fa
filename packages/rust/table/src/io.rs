//! CSV persistence for [`Table`].

use std::fs::File;
use std::path::Path;

use ligbench_shared::{LigbenchError, Result};
use tracing::debug;

use crate::Table;

/// Load a CSV file with a header row.
///
/// Short records are padded with empty cells; a record wider than the
/// header is an error.
pub fn read_csv(path: &Path) -> Result<Table> {
    let file = File::open(path).map_err(|e| LigbenchError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| LigbenchError::csv(path, e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(LigbenchError::csv(path, "no columns to parse from file"));
    }

    let width = headers.len();
    let mut table = Table::new(headers);
    for record in reader.records() {
        let record = record.map_err(|e| LigbenchError::csv(path, e.to_string()))?;
        if record.len() > width {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            return Err(LigbenchError::csv(
                path,
                format!("line {line}: expected {width} fields, saw {}", record.len()),
            ));
        }
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(width, String::new());
        table.push_row(row)?;
    }

    debug!(path = %path.display(), rows = table.len(), "read csv");
    Ok(table)
}

/// Write a table as CSV, creating parent directories as needed.
pub fn write_csv(table: &Table, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| LigbenchError::io(parent, e))?;
    }

    let mut writer =
        csv::Writer::from_path(path).map_err(|e| LigbenchError::csv(path, e.to_string()))?;

    writer
        .write_record(table.headers())
        .map_err(|e| LigbenchError::csv(path, e.to_string()))?;
    for row in table.rows() {
        writer
            .write_record(row)
            .map_err(|e| LigbenchError::csv(path, e.to_string()))?;
    }
    writer.flush().map_err(|e| LigbenchError::io(path, e))?;

    debug!(path = %path.display(), rows = table.len(), "wrote csv");
    Ok(())
}

/// Row-concatenate tables in order. Columns are the union of all inputs in
/// order of first appearance; cells a table lacks are left missing.
pub fn concat(tables: impl IntoIterator<Item = Table>) -> Table {
    let tables: Vec<Table> = tables.into_iter().collect();

    let mut headers: Vec<String> = Vec::new();
    for table in &tables {
        for h in table.headers() {
            if !headers.contains(h) {
                headers.push(h.clone());
            }
        }
    }

    let mut out = Table::new(headers);
    for table in &tables {
        out.append_aligned(table);
    }
    out
}

/// Read and concatenate several CSV files. No paths yield an empty table.
pub fn concat_csvs<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> Result<Table> {
    let tables = paths
        .into_iter()
        .map(|p| read_csv(p.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    Ok(concat(tables))
}
