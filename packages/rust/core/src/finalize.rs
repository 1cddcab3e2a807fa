//! Stage 5: final renames, run exclusion and missing-value cleanup.

use std::path::Path;

use ligbench_shared::{Result, columns};
use ligbench_table::{Table, is_missing, read_csv, write_csv};
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Default)]
pub struct FinalizeOptions {
    /// Apply the final column names to whichever source columns exist.
    pub rename_to_final: bool,
    /// Drop every row of one `(Source, dataset)` run, case-insensitively.
    pub exclude: Option<(String, String)>,
    /// Drop rows with any missing cell.
    pub dropna: bool,
}

/// Apply the finalize steps in order: rename, exclude, dropna.
///
/// Exclusion requires both `Source` and `dataset` columns.
pub fn finalize(table: &Table, opts: &FinalizeOptions) -> Result<Table> {
    let mut out = table.clone();

    if opts.rename_to_final {
        for (from, to) in columns::FINAL_RENAMES {
            if out.rename_column(from, to) {
                debug!(from, to, "renamed column");
            }
        }
    }

    if let Some((source, dataset)) = &opts.exclude {
        let s = out.require(columns::SOURCE)?;
        let d = out.require(columns::DATASET)?;
        let source = source.to_lowercase();
        let dataset = dataset.to_lowercase();
        out.retain_rows(|row| {
            !(row[s].to_lowercase() == source && row[d].to_lowercase() == dataset)
        });
    }

    if opts.dropna {
        out.retain_rows(|row| !row.iter().any(|cell| is_missing(cell)));
    }

    Ok(out)
}

/// File-level [`finalize`]. Returns the number of rows written.
#[instrument(skip_all, fields(input = %in_csv.display()))]
pub fn run_finalize(in_csv: &Path, out_csv: &Path, opts: &FinalizeOptions) -> Result<usize> {
    let table = read_csv(in_csv)?;
    let out = finalize(&table, opts).map_err(|e| e.with_origin(in_csv))?;
    write_csv(&out, out_csv)?;

    info!(
        rows_in = table.len(),
        rows_out = out.len(),
        out = %out_csv.display(),
        "finalized master"
    );
    Ok(out.len())
}

#[cfg(test)]
mod tests {
    use ligbench_shared::LigbenchError;

    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn master() -> Table {
        Table::from_rows(
            ["Source", "dataset", "PDB_ID", "RMSD", "model_rmsd", "model_tm_score"],
            vec![
                row(&["boltz", "main", "1ABC", "1.0", "0.5", "0.9"]),
                row(&["boltz", "allo", "2XYZ", "2.0", "", "0.8"]),
                row(&["AF3", "Main", "3DEF", "NaN", "0.4", "0.7"]),
                row(&["af3", "allo", "4GHI", "0.3", "0.2", "0.95"]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn default_options_change_nothing() {
        assert_eq!(finalize(&master(), &FinalizeOptions::default()).unwrap(), master());
    }

    #[test]
    fn renames_only_existing_columns() {
        let opts = FinalizeOptions {
            rename_to_final: true,
            ..Default::default()
        };
        let out = finalize(&master(), &opts).unwrap();
        assert_eq!(
            out.headers(),
            ["Source", "dataset", "PDB_ID", "ligand_rmsd", "rmsd", "tm_score"]
        );
        assert_eq!(out.rows(), master().rows());
    }

    #[test]
    fn excludes_one_run_case_insensitively() {
        let opts = FinalizeOptions {
            exclude: Some(("af3".into(), "MAIN".into())),
            ..Default::default()
        };
        let out = finalize(&master(), &opts).unwrap();
        assert_eq!(out.len(), 3);
        assert!(out.column(2).all(|id| id != "3DEF"));
    }

    #[test]
    fn dropna_removes_rows_with_missing_cells() {
        let opts = FinalizeOptions {
            dropna: true,
            ..Default::default()
        };
        let once = finalize(&master(), &opts).unwrap();
        assert_eq!(once.column(2).collect::<Vec<_>>(), ["1ABC", "4GHI"]);

        let twice = finalize(&once, &opts).unwrap();
        assert_eq!(twice, once);
    }

    #[test]
    fn all_steps_together() {
        let opts = FinalizeOptions {
            rename_to_final: true,
            exclude: Some(("boltz".into(), "main".into())),
            dropna: true,
        };
        let out = finalize(&master(), &opts).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.rows()[0], ["af3", "allo", "4GHI", "0.3", "0.2", "0.95"]);
        assert!(out.has_column("ligand_rmsd"));
    }

    #[test]
    fn exclude_without_dataset_column_fails() {
        let t = Table::from_rows(
            ["Source", "PDB_ID", "RMSD"],
            vec![row(&["af3", "1ABC", "1.0"])],
        )
        .unwrap();
        let opts = FinalizeOptions {
            exclude: Some(("af3".into(), "main".into())),
            ..Default::default()
        };

        let err = finalize(&t, &opts).unwrap_err();
        assert!(matches!(err, LigbenchError::MissingColumn { ref column, .. } if column == "dataset"));
    }

    #[test]
    fn run_finalize_names_the_file_on_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("master.csv");
        std::fs::write(&input, "dataset,PDB_ID\nmain,1ABC\n").unwrap();

        let opts = FinalizeOptions {
            exclude: Some(("af3".into(), "main".into())),
            ..Default::default()
        };
        let err = run_finalize(&input, &dir.path().join("out.csv"), &opts).unwrap_err();
        assert!(err.to_string().contains("'Source'"));
        assert!(err.to_string().contains("master.csv"));
    }

    #[test]
    fn run_finalize_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("master.csv");
        let output = dir.path().join("final").join("master_final.csv");
        write_csv(&master(), &input).unwrap();

        let opts = FinalizeOptions {
            dropna: true,
            ..Default::default()
        };
        assert_eq!(run_finalize(&input, &output, &opts).unwrap(), 2);
        assert_eq!(read_csv(&output).unwrap().len(), 2);
    }
}
