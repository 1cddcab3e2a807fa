//! Identifier normalization for joining results across prediction tools.
//!
//! Every tool names its outputs differently (`1abc_seed3`, `1ABC_A`,
//! `boltz_main_run.csv`, ...). The functions here turn those raw strings into
//! stable join keys and classify provenance labels. None of them fail:
//! unrecognized input maps to `None` or an empty label.

mod mode;

pub use mode::{IdMode, IdRule};

/// Marker that flags a seed-suffixed complex identifier.
const SEED_MARKER: &str = "seed";

/// Characters kept from a seed-suffixed identifier.
const SEED_PREFIX_LEN: usize = 5;

/// `None`, blank, or the literal `nan` (any case) carry no identifier.
fn is_null(raw: Option<&str>) -> Option<&str> {
    let s = raw?;
    if s.trim().is_empty() || s.eq_ignore_ascii_case("nan") {
        return None;
    }
    Some(s)
}

fn first_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

/// Normalize a PDB/complex identifier to a stable, lower-case join key.
///
/// Identifiers containing `seed` (any case) keep only their first five
/// characters; everything else has its underscores stripped. The two rules
/// must stay separate: truncating a plain ID or stripping a seed ID breaks
/// joins against existing tables.
pub fn normalize_pdb_id(raw: Option<&str>) -> Option<String> {
    let s = is_null(raw)?;
    if s.to_lowercase().contains(SEED_MARKER) {
        return Some(first_chars(s, SEED_PREFIX_LEN).to_lowercase());
    }
    Some(s.replace('_', "").to_lowercase())
}

/// Upper-case join key with underscores removed.
pub fn normalize_join_key_upper(raw: Option<&str>) -> Option<String> {
    let s = is_null(raw)?;
    Some(s.replace('_', "").to_uppercase())
}

/// First `n` characters of `raw`, case untouched.
pub fn extract_prefix(raw: Option<&str>, n: usize) -> Option<String> {
    let s = is_null(raw)?;
    Some(first_chars(s, n))
}

/// Tool and run campaign inferred from a provenance label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDataset {
    pub source: String,
    pub dataset: String,
}

/// Known tool prefixes, checked in order.
const SOURCE_PREFIXES: [(&str, &str); 4] = [
    ("boltz", "boltz"),
    ("af3", "af3"),
    ("protenix", "protenix"),
    // both `chai` and `chai1` appear in run names
    ("chai", "chai"),
];

/// Map a file name or `Source` cell to `(source, dataset)`.
///
/// The source comes from a known prefix (unknown tools pass through
/// lower-cased). The dataset is inferred independently from `main` or
/// `allo` appearing anywhere in the label.
pub fn parse_source_and_dataset(source_cell: &str) -> SourceDataset {
    let lower = source_cell.to_lowercase();

    let source = SOURCE_PREFIXES
        .iter()
        .find(|(prefix, _)| lower.starts_with(prefix))
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or_else(|| lower.clone());

    // "allosteric" contains "allo"
    let dataset = if lower.contains("main") {
        "main"
    } else if lower.contains("allo") {
        "allo"
    } else {
        ""
    };

    SourceDataset {
        source,
        dataset: dataset.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_pdb_id_null_inputs() {
        assert_eq!(normalize_pdb_id(None), None);
        assert_eq!(normalize_pdb_id(Some("")), None);
        assert_eq!(normalize_pdb_id(Some("   ")), None);
        assert_eq!(normalize_pdb_id(Some("NaN")), None);
        assert_eq!(normalize_pdb_id(Some("nan")), None);
    }

    #[test]
    fn normalize_pdb_id_seed_takes_first_five() {
        assert_eq!(normalize_pdb_id(Some("1ABC_seed1")).as_deref(), Some("1abc_"));
        assert_eq!(normalize_pdb_id(Some("7XYZA_SEED_42")).as_deref(), Some("7xyza"));
        // the marker may appear anywhere
        assert_eq!(normalize_pdb_id(Some("ab_cdSeEd")).as_deref(), Some("ab_cd"));
    }

    #[test]
    fn normalize_pdb_id_plain_strips_underscores() {
        assert_eq!(normalize_pdb_id(Some("1ABC_A")).as_deref(), Some("1abca"));
        assert_eq!(normalize_pdb_id(Some("6_H_L_X")).as_deref(), Some("6hlx"));
        assert_eq!(normalize_pdb_id(Some("2XYZ")).as_deref(), Some("2xyz"));
    }

    #[test]
    fn normalize_pdb_id_short_seed_string() {
        assert_eq!(normalize_pdb_id(Some("seed")).as_deref(), Some("seed"));
    }

    #[test]
    fn join_key_upper_strips_and_uppercases() {
        assert_eq!(normalize_join_key_upper(Some("1abc_b")).as_deref(), Some("1ABCB"));
        assert_eq!(normalize_join_key_upper(Some("nan")), None);
    }

    #[test]
    fn extract_prefix_keeps_case() {
        assert_eq!(extract_prefix(Some("1abc_seed1"), 5).as_deref(), Some("1abc_"));
        assert_eq!(extract_prefix(Some("AbCdEf"), 3).as_deref(), Some("AbC"));
        assert_eq!(extract_prefix(Some("ab"), 5).as_deref(), Some("ab"));
        assert_eq!(extract_prefix(Some("NAN"), 5), None);
        assert_eq!(extract_prefix(None, 5), None);
    }

    fn pair(source: &str, dataset: &str) -> SourceDataset {
        SourceDataset {
            source: source.into(),
            dataset: dataset.into(),
        }
    }

    #[test]
    fn parse_source_and_dataset_known_tools() {
        assert_eq!(parse_source_and_dataset("BOLTZ_main_run"), pair("boltz", "main"));
        assert_eq!(parse_source_and_dataset("af3_allosteric_v2"), pair("af3", "allo"));
        assert_eq!(parse_source_and_dataset("Protenix_allo"), pair("protenix", "allo"));
        assert_eq!(parse_source_and_dataset("chai1_main"), pair("chai", "main"));
        assert_eq!(parse_source_and_dataset("chai"), pair("chai", ""));
    }

    #[test]
    fn parse_source_and_dataset_unknown_tool_passes_through() {
        assert_eq!(parse_source_and_dataset("unknown_tool"), pair("unknown_tool", ""));
        assert_eq!(parse_source_and_dataset("DynamicBind"), pair("dynamicbind", ""));
    }

    #[test]
    fn parse_source_and_dataset_main_wins_over_allo() {
        assert_eq!(
            parse_source_and_dataset("diffdock_allo_main"),
            pair("diffdock_allo_main", "main")
        );
    }

    #[test]
    fn parse_source_prefix_must_lead() {
        // "af3" in the middle does not classify the tool
        assert_eq!(parse_source_and_dataset("run_af3_main"), pair("run_af3_main", "main"));
    }
}
