//! Entry ID lists read from a table column (CSV or spreadsheet).

use std::collections::HashSet;

use ligbench_shared::Result;
use ligbench_table::{Table, is_missing};

/// `1abc_A_ligand` -> `1abc`: the text before the first `_`, trimmed.
pub fn entry_id(entry: &str) -> &str {
    entry.split('_').next().unwrap_or_default().trim()
}

/// Unique entry IDs from `column`, in first-seen order, truncated to
/// `limit` when given. Missing cells are skipped.
pub fn read_entry_ids(table: &Table, column: &str, limit: Option<usize>) -> Result<Vec<String>> {
    let idx = table.require(column)?;

    let mut seen = HashSet::new();
    let mut ids: Vec<String> = table
        .column(idx)
        .filter(|cell| !is_missing(cell))
        .map(entry_id)
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(id.to_string()))
        .map(str::to_string)
        .collect();

    if let Some(limit) = limit {
        ids.truncate(limit);
    }
    Ok(ids)
}
