//! Best-row-per-group selection.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::str::FromStr;

use ligbench_shared::{LigbenchError, Result};

use crate::{Table, coerce_numeric, format_number, is_missing};

/// Which end of the score range wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Keep {
    #[default]
    Min,
    Max,
}

impl Keep {
    /// Whether `candidate` should replace the current best. Any real value
    /// beats a missing one; ties keep the earlier row.
    fn prefers(self, candidate: Option<f64>, current: Option<f64>) -> bool {
        match (candidate, current) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(c), Some(cur)) => match self {
                Keep::Min => c < cur,
                Keep::Max => c > cur,
            },
        }
    }
}

impl fmt::Display for Keep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Keep::Min => "min",
            Keep::Max => "max",
        })
    }
}

impl FromStr for Keep {
    type Err = LigbenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "min" => Ok(Keep::Min),
            "max" => Ok(Keep::Max),
            _ => Err(LigbenchError::config("keep must be 'min' or 'max'")),
        }
    }
}

/// Return one row per distinct `group_col` value, chosen by the min or max
/// of `score_col` after numeric coercion.
///
/// Grouping uses the raw cell text, so callers normalize keys first when
/// tools spell them differently. Rows with a missing group value are
/// dropped. Groups come out in ascending key order and the score column of
/// the result holds the coerced value. The input table is not modified.
pub fn best_row_per_group(
    table: &Table,
    group_col: &str,
    score_col: &str,
    keep: Keep,
) -> Result<Table> {
    if table.is_empty() {
        return Ok(table.clone());
    }

    let group_idx = table.require(group_col)?;
    let score_idx = table.require(score_col)?;

    let mut best: BTreeMap<&str, (usize, Option<f64>)> = BTreeMap::new();
    for (i, row) in table.rows().iter().enumerate() {
        let key = row[group_idx].as_str();
        if is_missing(key) {
            continue;
        }
        let score = coerce_numeric(&row[score_idx]);

        match best.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert((i, score));
            }
            Entry::Occupied(mut slot) => {
                if keep.prefers(score, slot.get().1) {
                    slot.insert((i, score));
                }
            }
        }
    }

    let mut out = Table::new(table.headers().iter().cloned());
    for (i, score) in best.into_values() {
        let mut row = table.rows()[i].clone();
        row[score_idx] = format_number(score);
        out.push_row(row)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[(&str, &str, &str)]) -> Table {
        Table::from_rows(
            ["group", "score", "tag"],
            rows.iter()
                .map(|(g, s, t)| vec![g.to_string(), s.to_string(), t.to_string()])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn keep_parses_min_and_max_only() {
        assert_eq!("min".parse::<Keep>().unwrap(), Keep::Min);
        assert_eq!("max".parse::<Keep>().unwrap(), Keep::Max);
        let err = "median".parse::<Keep>().unwrap_err();
        assert_eq!(err.to_string(), "config error: keep must be 'min' or 'max'");
    }

    #[test]
    fn picks_min_per_group() {
        let t = table(&[
            ("a", "2.0", "a1"),
            ("b", "5", "b1"),
            ("a", "1.0", "a2"),
            ("b", "4.5", "b2"),
        ]);
        let best = best_row_per_group(&t, "group", "score", Keep::Min).unwrap();
        assert_eq!(best.len(), 2);
        assert_eq!(best.rows()[0], ["a", "1.0", "a2"]);
        assert_eq!(best.rows()[1], ["b", "4.5", "b2"]);
    }

    #[test]
    fn picks_max_per_group() {
        let t = table(&[("a", "2.0", "a1"), ("a", "3", "a2"), ("a", "1", "a3")]);
        let best = best_row_per_group(&t, "group", "score", Keep::Max).unwrap();
        assert_eq!(best.rows(), [vec!["a", "3.0", "a2"]]);
    }

    #[test]
    fn missing_scores_lose_to_real_values() {
        let t = table(&[("a", "n/a", "a1"), ("a", "oops", "a2"), ("a", "9", "a3")]);
        for keep in [Keep::Min, Keep::Max] {
            let best = best_row_per_group(&t, "group", "score", keep).unwrap();
            assert_eq!(best.rows()[0][2], "a3");
        }
    }

    #[test]
    fn all_missing_group_keeps_first_row() {
        let t = table(&[("a", "", "a1"), ("a", "x", "a2")]);
        let best = best_row_per_group(&t, "group", "score", Keep::Min).unwrap();
        assert_eq!(best.rows(), [vec!["a", "", "a1"]]);
    }

    #[test]
    fn ties_keep_first_occurrence() {
        let t = table(&[("a", "1", "first"), ("a", "1.0", "second")]);
        let best = best_row_per_group(&t, "group", "score", Keep::Min).unwrap();
        assert_eq!(best.rows()[0][2], "first");
    }

    #[test]
    fn groups_on_raw_values_and_skips_missing_keys() {
        let t = table(&[("1ABC", "1", "x"), ("1abc", "2", "y"), ("", "0", "z")]);
        let best = best_row_per_group(&t, "group", "score", Keep::Min).unwrap();
        assert_eq!(best.len(), 2);
    }

    #[test]
    fn does_not_touch_input() {
        let t = table(&[("a", "2", "a1"), ("a", "1", "a2")]);
        let before = t.clone();
        best_row_per_group(&t, "group", "score", Keep::Min).unwrap();
        assert_eq!(t, before);
    }

    #[test]
    fn empty_input_returns_empty() {
        let t = Table::new(["group", "score"]);
        let best = best_row_per_group(&t, "group", "score", Keep::Min).unwrap();
        assert!(best.is_empty());
    }

    #[test]
    fn missing_columns_error() {
        let t = table(&[("a", "1", "x")]);
        assert!(best_row_per_group(&t, "nope", "score", Keep::Min).is_err());
        assert!(best_row_per_group(&t, "group", "nope", Keep::Min).is_err());
    }
}
