//! Stage 2: folder-wide filtering and combination of per-run CSVs.

use std::path::{Path, PathBuf};

use ligbench_shared::{LigbenchError, Result, columns};
use ligbench_table::{Table, concat, read_csv, write_csv};
use tracing::{info, instrument, warn};

use crate::files::glob_files;

/// Default file pattern for folder operations.
pub const DEFAULT_PATTERN: &str = "*.csv";

/// Outcome of [`filter_folder`].
#[derive(Debug, Default)]
pub struct FilterReport {
    /// Filtered files written.
    pub written: Vec<PathBuf>,
    /// Inputs without the RMSD column.
    pub skipped: Vec<PathBuf>,
}

/// `runs/af3_main.csv` -> `runs/af3_main_filtered.csv`.
pub fn filtered_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_filtered.{}", ext.to_string_lossy()),
        None => format!("{stem}_filtered"),
    };
    path.with_file_name(name)
}

/// Reduce every matching CSV to its first column plus `rmsd_col`, written
/// beside the input with a `_filtered` suffix. Files without `rmsd_col`
/// are skipped with a warning.
#[instrument(skip_all, fields(folder = %folder.display(), pattern = %pattern))]
pub fn filter_folder(folder: &Path, pattern: &str, rmsd_col: &str) -> Result<FilterReport> {
    let mut report = FilterReport::default();

    for path in glob_files(folder, pattern)? {
        let table = read_csv(&path)?;

        if !table.has_column(rmsd_col) {
            warn!(file = %path.display(), column = rmsd_col, "no RMSD column, skipping");
            report.skipped.push(path);
            continue;
        }

        let leftmost = table.headers()[0].clone();
        let out = table.select(&[leftmost.as_str(), rmsd_col])?;
        let out_path = filtered_path(&path);
        write_csv(&out, &out_path)?;

        info!(file = %out_path.display(), rows = out.len(), "wrote filtered csv");
        report.written.push(out_path);
    }

    Ok(report)
}

/// Concatenate every matching CSV, tagging each row with a leading
/// `Source` column holding its file's stem. Files are taken in path order.
#[instrument(skip_all, fields(folder = %folder.display(), pattern = %pattern))]
pub fn combine_folder(folder: &Path, pattern: &str) -> Result<Table> {
    let paths = glob_files(folder, pattern)?;
    if paths.is_empty() {
        return Err(LigbenchError::config(format!(
            "no CSVs matched {pattern} in {}",
            folder.display()
        )));
    }

    let mut tables = Vec::with_capacity(paths.len());
    for path in &paths {
        let mut table = read_csv(path)?;
        if table.has_column(columns::SOURCE) {
            return Err(LigbenchError::validation(format!(
                "{} already has a {} column",
                path.display(),
                columns::SOURCE
            )));
        }

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let values = vec![name; table.len()];
        table.insert_column(0, columns::SOURCE, values)?;
        tables.push(table);
    }

    let combined = concat(tables);
    info!(files = paths.len(), rows = combined.len(), "combined csvs");
    Ok(combined)
}

/// File-level [`combine_folder`]. Returns the number of rows written.
pub fn run_combine(folder: &Path, pattern: &str, out_csv: &Path) -> Result<usize> {
    let combined = combine_folder(folder, pattern)?;
    write_csv(&combined, out_csv)?;
    info!(out = %out_csv.display(), "wrote combined csv");
    Ok(combined.len())
}
