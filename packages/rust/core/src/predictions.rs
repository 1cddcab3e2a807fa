//! Prediction-output checks and collection, run before scoring.
//!
//! [`validate_predictions`] reports per-target model counts for a tree laid
//! out as `<root>/<TARGET>/*.cif`. [`collect_top_models`] builds such a tree
//! from a tool's free-form output directory.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use ligbench_shared::{LigbenchError, Result};
use ligbench_table::{Table, write_csv};
use regex::Regex;
use tracing::{debug, info, instrument, warn};

use crate::files::glob_files;

/// Structure file extensions, compared case-insensitively.
pub const MODEL_EXTENSIONS: [&str; 3] = ["cif", "mmcif", "pdb"];

/// Models smaller than this are reported as suspicious.
pub const DEFAULT_MIN_BYTES: u64 = 5000;

/// Models kept per target when collecting.
pub const DEFAULT_MAX_PER_TARGET: usize = 5;

/// Tiny file names listed in a warning message before truncating.
const TINY_LISTED: usize = 5;

static TOKEN_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("valid regex"));

static RANK_HINT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:rank|sample|pred)[_-]?(\d+)").expect("valid regex"));

fn is_model_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| MODEL_EXTENSIONS.contains(&ext.as_str()))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    Ok,
    Warn,
    Fail,
}

impl TargetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetStatus::Ok => "OK",
            TargetStatus::Warn => "WARN",
            TargetStatus::Fail => "FAIL",
        }
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the validation report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReport {
    pub target: String,
    pub n_models: usize,
    pub status: TargetStatus,
    pub message: String,
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| LigbenchError::io(dir, e))?;
    let mut paths = entries
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| LigbenchError::io(dir, e))?;
    paths.sort();
    Ok(paths)
}

fn check_target(dir: &Path, min_bytes: u64) -> Result<TargetReport> {
    let target = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let models: Vec<PathBuf> = read_dir_sorted(dir)?
        .into_iter()
        .filter(|p| p.is_file() && is_model_file(p))
        .collect();

    if models.is_empty() {
        return Ok(TargetReport {
            target,
            n_models: 0,
            status: TargetStatus::Fail,
            message: "no model files found".into(),
        });
    }

    let mut tiny = Vec::new();
    for path in &models {
        let size = std::fs::metadata(path)
            .map_err(|e| LigbenchError::io(path, e))?
            .len();
        if size < min_bytes {
            tiny.push(path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default());
        }
    }

    let (status, message) = if tiny.is_empty() {
        (TargetStatus::Ok, String::new())
    } else {
        let listed = tiny[..tiny.len().min(TINY_LISTED)].join(", ");
        let more = if tiny.len() > TINY_LISTED { "..." } else { "" };
        (TargetStatus::Warn, format!("tiny files: {listed}{more}"))
    };

    Ok(TargetReport {
        target,
        n_models: models.len(),
        status,
        message,
    })
}

/// Check every immediate sub-directory of `root`, in name order.
#[instrument(skip_all, fields(root = %root.display(), min_bytes = min_bytes))]
pub fn validate_predictions(root: &Path, min_bytes: u64) -> Result<Vec<TargetReport>> {
    let mut reports = Vec::new();
    for dir in read_dir_sorted(root)?.into_iter().filter(|p| p.is_dir()) {
        let report = check_target(&dir, min_bytes)?;
        if report.status != TargetStatus::Ok {
            warn!(target_id = %report.target, status = %report.status, message = %report.message, "prediction check");
        }
        reports.push(report);
    }

    let failed = reports.iter().filter(|r| r.status == TargetStatus::Fail).count();
    info!(targets = reports.len(), failed, "validated predictions");
    Ok(reports)
}

/// Report rows as a `PDB, n_models, status, message` table.
pub fn reports_to_table(reports: &[TargetReport]) -> Result<Table> {
    let rows = reports
        .iter()
        .map(|r| {
            vec![
                r.target.clone(),
                r.n_models.to_string(),
                r.status.to_string(),
                r.message.clone(),
            ]
        })
        .collect();
    Table::from_rows(["PDB", "n_models", "status", "message"], rows)
}

/// [`validate_predictions`] written to a report CSV.
pub fn run_validate(root: &Path, out_csv: &Path, min_bytes: u64) -> Result<Vec<TargetReport>> {
    let reports = validate_predictions(root, min_bytes)?;
    write_csv(&reports_to_table(&reports)?, out_csv)?;
    info!(out = %out_csv.display(), "wrote validation report");
    Ok(reports)
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub max_per_target: usize,
    pub overwrite: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            max_per_target: DEFAULT_MAX_PER_TARGET,
            overwrite: false,
        }
    }
}

#[derive(Debug)]
struct Candidate {
    path: PathBuf,
    rank: Option<u64>,
}

/// Guess the 4-character target ID for a model file.
///
/// Takes the first 4-character alphanumeric token of the upper-cased
/// `<stem>_<parent dir>`, falling back to the stem's first four characters
/// padded with `X`.
pub fn infer_target_id(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_uppercase())
        .unwrap_or_default();
    let parent = path
        .parent()
        .and_then(Path::file_name)
        .map(|s| s.to_string_lossy().to_uppercase())
        .unwrap_or_default();

    let joined = format!("{stem}_{parent}");
    if let Some(token) = TOKEN_SPLIT_RE
        .split(&joined)
        .find(|t| t.chars().count() == 4)
    {
        return token.to_string();
    }

    let mut id: String = stem.chars().take(4).collect();
    while id.chars().count() < 4 {
        id.push('X');
    }
    id
}

/// Numeric rank from names like `rank_1`, `sample-3` or `pred2`.
pub fn rank_hint(path: &Path) -> Option<u64> {
    let name = path.file_name()?.to_string_lossy().to_lowercase();
    RANK_HINT_RE
        .captures(&name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Copy up to `max_per_target` models per inferred target from `root`
/// into `<out_dir>/<ID>/model_000.<ext>`, ranked files first in rank
/// order, then by path. Existing files are kept unless `overwrite`.
/// Returns the number of files written.
#[instrument(skip_all, fields(root = %root.display(), out = %out_dir.display()))]
pub fn collect_top_models(root: &Path, out_dir: &Path, opts: &CollectOptions) -> Result<usize> {
    let mut by_target: BTreeMap<String, Vec<Candidate>> = BTreeMap::new();
    for path in glob_files(root, "**/*")? {
        if !is_model_file(&path) {
            continue;
        }
        let rank = rank_hint(&path);
        by_target
            .entry(infer_target_id(&path))
            .or_default()
            .push(Candidate { path, rank });
    }

    std::fs::create_dir_all(out_dir).map_err(|e| LigbenchError::io(out_dir, e))?;

    let mut written = 0;
    for (target, mut candidates) in by_target {
        candidates.sort_by(|a, b| {
            (a.rank.is_none(), a.rank, a.path.to_string_lossy()).cmp(&(
                b.rank.is_none(),
                b.rank,
                b.path.to_string_lossy(),
            ))
        });

        let target_dir = out_dir.join(&target);
        std::fs::create_dir_all(&target_dir).map_err(|e| LigbenchError::io(&target_dir, e))?;

        for (i, cand) in candidates.iter().take(opts.max_per_target).enumerate() {
            let ext = cand
                .path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            let dst = target_dir.join(format!("model_{i:03}.{ext}"));
            if dst.exists() && !opts.overwrite {
                debug!(dst = %dst.display(), "exists, skipping");
                continue;
            }
            std::fs::copy(&cand.path, &dst).map_err(|e| LigbenchError::io(&dst, e))?;
            written += 1;
        }
    }

    info!(written, "collected top models");
    Ok(written)
}
