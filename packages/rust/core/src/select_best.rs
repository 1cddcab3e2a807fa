//! Stage 1: reduce a raw tool run to its best row per target.

use std::path::Path;

use ligbench_ids::extract_prefix;
use ligbench_shared::{Result, columns};
use ligbench_table::{
    Keep, Table, best_row_per_group, coerce_numeric, format_number, is_missing, read_csv,
    write_csv,
};
use tracing::{info, instrument};

/// Helper column holding the seed group while selecting.
const GROUP_CODE: &str = "group_code";

/// Characters of a `Complex_Seed` value that identify its complex.
const GROUP_CODE_LEN: usize = 5;

/// Column names for [`af3_best`].
#[derive(Debug, Clone)]
pub struct Af3BestOptions {
    pub seed_col: String,
    pub rmsd_col: String,
}

impl Default for Af3BestOptions {
    fn default() -> Self {
        Self {
            seed_col: "Complex_Seed".into(),
            rmsd_col: columns::RMSD.into(),
        }
    }
}

/// Default identifier column in row-wise-max runs.
pub const DEFAULT_PROTENIX_ID_COL: &str = "Protein ID";

/// Keep the lowest-RMSD row for each complex across its seeds.
///
/// The complex is the first five characters of the seed column,
/// upper-cased. This is a fixed-width prefix, not the normalizer's seed
/// rule. The helper column is removed from the result.
pub fn af3_best(table: &Table, opts: &Af3BestOptions) -> Result<Table> {
    let seed_idx = table.require(&opts.seed_col)?;
    table.require(&opts.rmsd_col)?;

    let codes = table
        .column(seed_idx)
        .map(|seed| {
            if is_missing(seed) {
                return String::new();
            }
            extract_prefix(Some(seed), GROUP_CODE_LEN)
                .map(|p| p.to_uppercase())
                .unwrap_or_default()
        })
        .collect();

    let mut work = table.clone();
    work.set_column(GROUP_CODE, codes)?;

    let mut best = best_row_per_group(&work, GROUP_CODE, &opts.rmsd_col, Keep::Min)?;
    best.drop_column(GROUP_CODE);
    Ok(best)
}

/// Collapse every non-identifier column into a row-wise maximum stored as
/// `RMSD`. Higher is better for this tool's output, despite the name.
pub fn protenix_max(table: &Table, id_col: &str) -> Result<Table> {
    let id_idx = table.require(id_col)?;

    let mut out = Table::new([id_col, columns::RMSD]);
    for row in table.rows() {
        let max = row
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != id_idx)
            .filter_map(|(_, cell)| coerce_numeric(cell))
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))));

        out.push_row(vec![row[id_idx].clone(), format_number(max)])?;
    }
    Ok(out)
}

/// File-level [`af3_best`]. Returns the number of rows written.
#[instrument(skip_all, fields(input = %in_csv.display()))]
pub fn run_af3_best(in_csv: &Path, out_csv: &Path, opts: &Af3BestOptions) -> Result<usize> {
    let table = read_csv(in_csv)?;
    let best = af3_best(&table, opts).map_err(|e| e.with_origin(in_csv))?;
    write_csv(&best, out_csv)?;

    info!(
        rows_in = table.len(),
        rows_out = best.len(),
        out = %out_csv.display(),
        "selected best seed per complex"
    );
    Ok(best.len())
}

/// File-level [`protenix_max`]. Returns the number of rows written.
#[instrument(skip_all, fields(input = %in_csv.display()))]
pub fn run_protenix_max(in_csv: &Path, out_csv: &Path, id_col: &str) -> Result<usize> {
    let table = read_csv(in_csv)?;
    let out = protenix_max(&table, id_col).map_err(|e| e.with_origin(in_csv))?;
    write_csv(&out, out_csv)?;

    info!(rows = out.len(), out = %out_csv.display(), "computed row-wise max");
    Ok(out.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeds() -> Table {
        Table::from_rows(
            ["Complex_Seed", "RMSD"],
            vec![
                vec!["1abc_seed1".into(), "2.1".into()],
                vec!["1abc_seed2".into(), "1.5".into()],
                vec!["2xyz_seed1".into(), "3.0".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn af3_best_keeps_min_per_complex() {
        let best = af3_best(&seeds(), &Af3BestOptions::default()).unwrap();

        assert_eq!(best.headers(), ["Complex_Seed", "RMSD"]);
        assert_eq!(best.len(), 2);
        assert_eq!(best.rows()[0], ["1abc_seed2", "1.5"]);
        assert_eq!(best.rows()[1], ["2xyz_seed1", "3.0"]);
    }

    #[test]
    fn af3_best_groups_case_insensitively_by_prefix() {
        let t = Table::from_rows(
            ["Complex_Seed", "RMSD", "note"],
            vec![
                vec!["1ABC_seed1".into(), "0.9".into(), "upper".into()],
                vec!["1abc_seed2".into(), "1.1".into(), "lower".into()],
                vec!["".into(), "0.1".into(), "no seed".into()],
            ],
        )
        .unwrap();

        let best = af3_best(&t, &Af3BestOptions::default()).unwrap();
        assert_eq!(best.len(), 1);
        assert_eq!(best.rows()[0][2], "upper");
        assert!(!best.has_column(GROUP_CODE));
    }

    #[test]
    fn af3_best_custom_columns() {
        let t = Table::from_rows(
            ["name", "lig_rmsd"],
            vec![
                vec!["5abcd_s1".into(), "4".into()],
                vec!["5abcd_s2".into(), "x".into()],
            ],
        )
        .unwrap();
        let opts = Af3BestOptions {
            seed_col: "name".into(),
            rmsd_col: "lig_rmsd".into(),
        };
        let best = af3_best(&t, &opts).unwrap();
        assert_eq!(best.rows(), [vec!["5abcd_s1", "4.0"]]);
    }

    #[test]
    fn af3_best_missing_column() {
        let t = Table::new(["seed", "RMSD"]);
        assert!(af3_best(&t, &Af3BestOptions::default()).is_err());
    }

    #[test]
    fn protenix_max_takes_row_maximum() {
        let t = Table::from_rows(
            ["Protein ID", "sample_0", "sample_1", "sample_2"],
            vec![
                vec!["1abc".into(), "0.2".into(), "0.8".into(), "bad".into()],
                vec!["2xyz".into(), "".into(), "".into(), "".into()],
                vec!["3def".into(), "-1".into(), "5".into(), "2".into()],
            ],
        )
        .unwrap();

        let out = protenix_max(&t, DEFAULT_PROTENIX_ID_COL).unwrap();
        assert_eq!(out.headers(), ["Protein ID", "RMSD"]);
        assert_eq!(out.rows()[0], ["1abc", "0.8"]);
        assert_eq!(out.rows()[1], ["2xyz", ""]);
        assert_eq!(out.rows()[2], ["3def", "5.0"]);
    }

    #[test]
    fn run_af3_best_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("af3.csv");
        write_csv(&seeds(), &input).unwrap();

        let out = dir.path().join("out").join("af3_best.csv");
        let rows = run_af3_best(&input, &out, &Af3BestOptions::default()).unwrap();
        assert_eq!(rows, 2);
        assert_eq!(read_csv(&out).unwrap().len(), 2);
    }

    #[test]
    fn run_protenix_max_names_the_file_on_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("protenix.csv");
        std::fs::write(&input, "id,a\nx,1\n").unwrap();

        let err = run_protenix_max(&input, &dir.path().join("o.csv"), "Protein ID").unwrap_err();
        assert!(err.to_string().contains("protenix.csv"));
    }
}
