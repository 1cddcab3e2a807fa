//! Missing-value detection and numeric coercion for text cells.

/// Cell contents a dataframe reader treats as missing.
const NA_TOKENS: [&str; 14] = [
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>", "#N/A",
    "#NA", "-1.#IND",
];

/// Whether a cell holds no value.
pub fn is_missing(cell: &str) -> bool {
    let t = cell.trim();
    t.is_empty() || NA_TOKENS.contains(&t)
}

/// Parse a cell as a float. Missing or non-numeric text yields `None`
/// rather than an error.
pub fn coerce_numeric(cell: &str) -> Option<f64> {
    if is_missing(cell) {
        return None;
    }
    cell.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Render a coerced value for CSV output. Integral values keep a
/// trailing `.0` so a float column reads back as float.
pub fn format_number(value: Option<f64>) -> String {
    match value {
        None => String::new(),
        Some(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 => format!("{v:.1}"),
        Some(v) => format!("{v}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tokens() {
        for cell in ["", "  ", "NA", "nan", "NaN", "None", "<NA>", " null "] {
            assert!(is_missing(cell), "{cell:?} should be missing");
        }
        for cell in ["0", "1abc", "n", "main"] {
            assert!(!is_missing(cell), "{cell:?} should be present");
        }
    }

    #[test]
    fn coerce_numeric_parses_or_drops() {
        assert_eq!(coerce_numeric("1.5"), Some(1.5));
        assert_eq!(coerce_numeric(" 2 "), Some(2.0));
        assert_eq!(coerce_numeric("1e-2"), Some(0.01));
        assert_eq!(coerce_numeric("abc"), None);
        assert_eq!(coerce_numeric(""), None);
        assert_eq!(coerce_numeric("NaN"), None);
    }

    #[test]
    fn format_number_shapes() {
        assert_eq!(format_number(Some(1.5)), "1.5");
        assert_eq!(format_number(Some(3.0)), "3.0");
        assert_eq!(format_number(Some(-0.25)), "-0.25");
        assert_eq!(format_number(None), "");
    }
}
