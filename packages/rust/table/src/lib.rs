//! In-memory CSV tables and the row operations the aggregation stages share.
//!
//! A [`Table`] keeps every cell as text: CSV is the interchange format
//! between stages, so values are only coerced to numbers where a stage
//! compares them (see [`coerce_numeric`]). Missing values are empty cells
//! or one of the usual NA tokens ([`is_missing`]).

mod group;
mod io;
mod numeric;
mod sheet;

pub use group::{Keep, best_row_per_group};
pub use io::{concat, concat_csvs, read_csv, write_csv};
pub use numeric::{coerce_numeric, format_number, is_missing};
pub use sheet::{is_spreadsheet, read_sheet, read_table};

use ligbench_shared::{LigbenchError, Result};

/// Column names plus rows of string cells, every row as wide as the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// An empty table with the given columns.
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table from headers and rows, rejecting ragged rows.
    pub fn from_rows<I, S>(headers: I, rows: Vec<Vec<String>>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(headers);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Index of a column the caller cannot do without.
    pub fn require(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| LigbenchError::missing_column(name))
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        &self.rows[row][col]
    }

    pub fn set_cell(&mut self, row: usize, col: usize, value: impl Into<String>) {
        self.rows[row][col] = value.into();
    }

    /// All cells of one column, top to bottom.
    pub fn column(&self, col: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(move |row| row[col].as_str())
    }

    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.headers.len() {
            return Err(LigbenchError::validation(format!(
                "row {} has {} fields, expected {}",
                self.rows.len() + 1,
                row.len(),
                self.headers.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Append an all-missing column unless it already exists. Returns its index.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    /// Insert a column at `at`, one value per row.
    pub fn insert_column(&mut self, at: usize, name: &str, values: Vec<String>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(LigbenchError::validation(format!(
                "column '{name}' has {} values for {} rows",
                values.len(),
                self.rows.len()
            )));
        }
        let at = at.min(self.headers.len());
        self.headers.insert(at, name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.insert(at, value);
        }
        Ok(())
    }

    /// Overwrite a column's values, appending the column if it is new.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        match self.column_index(name) {
            Some(idx) => {
                if values.len() != self.rows.len() {
                    return Err(LigbenchError::validation(format!(
                        "column '{name}' has {} values for {} rows",
                        values.len(),
                        self.rows.len()
                    )));
                }
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
                Ok(())
            }
            None => self.insert_column(self.headers.len(), name, values),
        }
    }

    /// Remove a column if present. Returns whether anything was removed.
    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        self.headers.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
        true
    }

    /// Rename a column if present. Returns whether it existed.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_index(from) {
            Some(idx) => {
                self.headers[idx] = to.to_string();
                true
            }
            None => false,
        }
    }

    /// A new table holding only `names`, in that order.
    pub fn select(&self, names: &[&str]) -> Result<Table> {
        let indices = names
            .iter()
            .map(|name| self.require(name))
            .collect::<Result<Vec<_>>>()?;

        Ok(Table {
            headers: names.iter().map(|n| n.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        })
    }

    /// Keep only rows for which `keep` returns true.
    pub fn retain_rows(&mut self, mut keep: impl FnMut(&[String]) -> bool) {
        self.rows.retain(|row| keep(row));
    }

    /// Append rows from `other`, aligned by column name. Columns `self`
    /// lacks are dropped; columns `other` lacks are left missing.
    pub fn append_aligned(&mut self, other: &Table) {
        let mapping: Vec<Option<usize>> = self
            .headers
            .iter()
            .map(|h| other.column_index(h))
            .collect();

        for row in &other.rows {
            self.rows.push(
                mapping
                    .iter()
                    .map(|src| src.map(|i| row[i].clone()).unwrap_or_default())
                    .collect(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            ["Source", "PDB_ID", "RMSD"],
            vec![
                vec!["boltz".into(), "1abc".into(), "1.2".into()],
                vec!["af3".into(), "2xyz".into(), "".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn rejects_ragged_rows() {
        let mut t = Table::new(["a", "b"]);
        let err = t.push_row(vec!["1".into()]).unwrap_err();
        assert!(err.to_string().contains("row 1 has 1 fields, expected 2"));
    }

    #[test]
    fn require_reports_missing_column() {
        let t = sample();
        assert_eq!(t.require("RMSD").unwrap(), 2);
        let err = t.require("dataset").unwrap_err();
        assert!(matches!(err, LigbenchError::MissingColumn { .. }));
    }

    #[test]
    fn ensure_column_appends_once() {
        let mut t = sample();
        assert_eq!(t.ensure_column("model_rmsd"), 3);
        assert_eq!(t.ensure_column("model_rmsd"), 3);
        assert_eq!(t.cell(0, 3), "");
        assert_eq!(t.headers().len(), 4);
    }

    #[test]
    fn insert_and_drop_column() {
        let mut t = sample();
        t.insert_column(0, "dataset", vec!["main".into(), "allo".into()])
            .unwrap();
        assert_eq!(t.headers()[0], "dataset");
        assert_eq!(t.cell(1, 0), "allo");

        assert!(t.drop_column("dataset"));
        assert!(!t.drop_column("dataset"));
        assert_eq!(t, sample());
    }

    #[test]
    fn set_column_replaces_or_appends() {
        let mut t = sample();
        t.set_column("RMSD", vec!["9".into(), "8".into()]).unwrap();
        assert_eq!(t.column(2).collect::<Vec<_>>(), ["9", "8"]);

        t.set_column("extra", vec!["x".into(), "y".into()]).unwrap();
        assert_eq!(t.headers().last().map(String::as_str), Some("extra"));

        assert!(t.set_column("RMSD", vec!["1".into()]).is_err());
    }

    #[test]
    fn select_reorders() {
        let t = sample().select(&["RMSD", "Source"]).unwrap();
        assert_eq!(t.headers(), ["RMSD", "Source"]);
        assert_eq!(t.rows()[0], ["1.2", "boltz"]);
        assert!(sample().select(&["nope"]).is_err());
    }

    #[test]
    fn append_aligned_fills_and_drops() {
        let mut master = Table::new(["Source", "PDB_ID", "RMSD", "model_rmsd"]);
        let batch = Table::from_rows(
            ["PDB_ID", "model_rmsd", "Source", "unrelated"],
            vec![vec!["1ABC".into(), "0.7".into(), "boltz".into(), "z".into()]],
        )
        .unwrap();

        master.append_aligned(&batch);
        assert_eq!(master.rows()[0], ["boltz", "1ABC", "", "0.7"]);
    }
}
