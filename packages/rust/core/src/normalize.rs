//! Stage 3: coerce a combined spreadsheet into the master schema.

use std::path::Path;

use ligbench_ids::{normalize_pdb_id, parse_source_and_dataset};
use ligbench_shared::{ColumnsConfig, Result, columns};
use ligbench_table::{Table, is_missing, read_csv, write_csv};
use tracing::{info, instrument};

/// Input column names. Output names are always the canonical
/// `Source, dataset, PDB_ID, RMSD`.
#[derive(Debug, Clone)]
pub struct SchemaColumns {
    pub pdb_col: String,
    pub source_col: String,
    pub dataset_col: String,
    pub rmsd_col: String,
}

impl Default for SchemaColumns {
    fn default() -> Self {
        Self::from(&ColumnsConfig::default())
    }
}

impl From<&ColumnsConfig> for SchemaColumns {
    fn from(config: &ColumnsConfig) -> Self {
        Self {
            pdb_col: config.pdb.clone(),
            source_col: config.source.clone(),
            dataset_col: config.dataset.clone(),
            rmsd_col: config.rmsd.clone(),
        }
    }
}

/// Normalize IDs and provenance into the four-column master schema.
///
/// `PDB_ID` goes through [`normalize_pdb_id`]; `Source` is re-derived with
/// [`parse_source_and_dataset`]. The dataset cell is filled from the
/// inferred label only where it is blank, so explicit values always win.
pub fn normalize_master_schema(table: &Table, cols: &SchemaColumns) -> Result<Table> {
    let pdb_idx = table.require(&cols.pdb_col)?;
    let source_idx = table.require(&cols.source_col)?;
    let rmsd_idx = table.require(&cols.rmsd_col)?;
    let dataset_idx = table.column_index(&cols.dataset_col);

    let mut out = Table::new(columns::MASTER_SCHEMA);
    for row in table.rows() {
        let raw_source = &row[source_idx];
        let parsed = parse_source_and_dataset(if is_missing(raw_source) {
            ""
        } else {
            raw_source
        });

        let dataset = match dataset_idx.map(|i| row[i].as_str()) {
            Some(existing) if !is_missing(existing) => existing.to_string(),
            _ => parsed.dataset,
        };

        let pdb = &row[pdb_idx];
        let pdb_id = if is_missing(pdb) {
            String::new()
        } else {
            normalize_pdb_id(Some(pdb)).unwrap_or_default()
        };

        let rmsd = &row[rmsd_idx];
        let rmsd = if is_missing(rmsd) {
            String::new()
        } else {
            rmsd.clone()
        };

        out.push_row(vec![parsed.source, dataset, pdb_id, rmsd])?;
    }
    Ok(out)
}

/// File-level [`normalize_master_schema`]. Returns the number of rows written.
#[instrument(skip_all, fields(input = %in_csv.display()))]
pub fn run_normalize(in_csv: &Path, out_csv: &Path, cols: &SchemaColumns) -> Result<usize> {
    let table = read_csv(in_csv)?;
    let out = normalize_master_schema(&table, cols).map_err(|e| e.with_origin(in_csv))?;
    write_csv(&out, out_csv)?;

    info!(rows = out.len(), out = %out_csv.display(), "normalized master schema");
    Ok(out.len())
}
