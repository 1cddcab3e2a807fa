//! Stage 4: incremental updates to the master results table.
//!
//! Two operations with deliberately different write semantics:
//! - [`upsert_model_metrics`] replaces whole rows for the keys it touches;
//! - [`update_ligand_rmsd`] rewrites one column of rows that already exist.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use ligbench_ids::IdRule;
use ligbench_shared::{Result, columns};
use ligbench_table::{Keep, Table, best_row_per_group, is_missing, read_csv, write_csv};
use tracing::{info, instrument};

/// Which run batch an update belongs to. Compared case-insensitively.
#[derive(Debug, Clone)]
pub struct RunLabel {
    pub source: String,
    pub dataset: String,
}

impl RunLabel {
    fn matches(&self, source: &str, dataset: &str) -> bool {
        source.to_lowercase() == self.source.to_lowercase()
            && dataset.to_lowercase() == self.dataset.to_lowercase()
    }
}

/// How to key a run table against the master.
#[derive(Debug, Clone)]
pub struct RunKey {
    /// Column holding the raw identifier.
    pub id_col: String,
    pub rule: IdRule,
}

#[derive(Debug, Clone)]
pub struct UpsertOptions {
    pub label: RunLabel,
    pub key: RunKey,
    pub rmsd_col: String,
    pub tm_col: Option<String>,
    pub plddt_col: Option<String>,
    pub keep: Keep,
}

#[derive(Debug, Clone)]
pub struct LigandUpdateOptions {
    pub label: RunLabel,
    pub key: RunKey,
    pub rmsd_col: String,
    /// Master column to overwrite.
    pub target_col: String,
    pub keep: Keep,
}

/// Default master column rewritten by [`update_ligand_rmsd`].
pub const DEFAULT_TARGET_COL: &str = columns::RMSD;

/// Result of [`upsert_model_metrics`].
#[derive(Debug)]
pub struct UpsertOutcome {
    pub table: Table,
    /// Master rows removed because the batch supplies their key.
    pub replaced: usize,
    /// Rows appended from the batch.
    pub appended: usize,
}

/// Result of [`update_ligand_rmsd`].
#[derive(Debug)]
pub struct LigandUpdateOutcome {
    pub table: Table,
    /// Master rows whose target column was rewritten.
    pub updated: usize,
}

/// Derive `PDB_ID` for every run row, then keep the best row per key.
fn best_by_key(run: &Table, key: &RunKey, score_col: &str, keep: Keep) -> Result<Table> {
    let id_idx = run.require(&key.id_col)?;
    let chain_idx = key
        .rule
        .chain_column()
        .map(|c| run.require(c))
        .transpose()?;
    run.require(score_col)?;

    let keys = run
        .rows()
        .iter()
        .map(|row| {
            let id = &row[id_idx];
            if is_missing(id) {
                return String::new();
            }
            let chain = chain_idx
                .map(|i| row[i].as_str())
                .filter(|c| !is_missing(c));
            key.rule.key(id, chain).unwrap_or_default()
        })
        .collect();

    let mut keyed = run.clone();
    keyed.set_column(columns::PDB_ID, keys)?;
    best_row_per_group(&keyed, columns::PDB_ID, score_col, keep)
}

/// Column indices of the master table's composite key.
struct MasterKey {
    source: usize,
    dataset: usize,
    pdb_id: usize,
}

impl MasterKey {
    fn locate(master: &Table) -> Result<Self> {
        Ok(Self {
            source: master.require(columns::SOURCE)?,
            dataset: master.require(columns::DATASET)?,
            pdb_id: master.require(columns::PDB_ID)?,
        })
    }
}

/// Replace master rows for this batch's keys with fresh model metrics.
///
/// The batch holds `Source, dataset, PDB_ID, model_rmsd` plus
/// `model_tm_score`/`model_plddt` when those columns were named and exist
/// in the run. Master rows with the same `(Source, dataset)` and an
/// upper-cased `PDB_ID` in the batch are dropped entirely before the batch
/// is appended, so metrics the batch does not carry are lost for those
/// keys. The output keeps the master's column order.
pub fn upsert_model_metrics(
    master: &Table,
    run: &Table,
    opts: &UpsertOptions,
) -> Result<UpsertOutcome> {
    let best = best_by_key(run, &opts.key, &opts.rmsd_col, opts.keep)?;
    let pdb_idx = best.require(columns::PDB_ID)?;
    let rmsd_idx = best.require(&opts.rmsd_col)?;

    let optional = [
        (opts.tm_col.as_deref(), columns::MODEL_TM_SCORE),
        (opts.plddt_col.as_deref(), columns::MODEL_PLDDT),
    ];
    let extra: Vec<(usize, &str)> = optional
        .iter()
        .filter_map(|(src, dst)| src.and_then(|c| best.column_index(c)).map(|i| (i, *dst)))
        .collect();

    let mut batch_headers = vec![
        columns::SOURCE,
        columns::DATASET,
        columns::PDB_ID,
        columns::MODEL_RMSD,
    ];
    batch_headers.extend(extra.iter().map(|(_, dst)| *dst));

    let mut batch = Table::new(batch_headers);
    for row in best.rows() {
        let mut out = vec![
            opts.label.source.clone(),
            opts.label.dataset.clone(),
            row[pdb_idx].clone(),
            row[rmsd_idx].clone(),
        ];
        out.extend(extra.iter().map(|(i, _)| row[*i].clone()));
        batch.push_row(out)?;
    }

    let mut table = master.clone();
    let key = MasterKey::locate(&table)?;
    for col in columns::MASTER_METRICS {
        table.ensure_column(col);
    }

    let incoming: HashSet<String> = batch.column(2).map(str::to_uppercase).collect();
    let before = table.len();
    table.retain_rows(|row| {
        !(opts.label.matches(&row[key.source], &row[key.dataset])
            && incoming.contains(&row[key.pdb_id].to_uppercase()))
    });
    let replaced = before - table.len();

    table.append_aligned(&batch);

    Ok(UpsertOutcome {
        table,
        replaced,
        appended: batch.len(),
    })
}

/// Overwrite one column of matching master rows with the best ligand RMSD
/// per key. Only rows whose `(Source, dataset)` matches and whose
/// upper-cased `PDB_ID` appears in the ligand table change; the row count
/// and every other column stay as they were.
pub fn update_ligand_rmsd(
    master: &Table,
    ligand: &Table,
    opts: &LigandUpdateOptions,
) -> Result<LigandUpdateOutcome> {
    let best = best_by_key(ligand, &opts.key, &opts.rmsd_col, opts.keep)?;
    let pdb_idx = best.require(columns::PDB_ID)?;
    let rmsd_idx = best.require(&opts.rmsd_col)?;

    let updates: HashMap<String, &str> = best
        .rows()
        .iter()
        .map(|row| (row[pdb_idx].to_uppercase(), row[rmsd_idx].as_str()))
        .collect();

    let mut table = master.clone();
    let key = MasterKey::locate(&table)?;
    let target = table.ensure_column(&opts.target_col);

    let mut updated = 0;
    for i in 0..table.len() {
        if !opts
            .label
            .matches(table.cell(i, key.source), table.cell(i, key.dataset))
        {
            continue;
        }
        let pdb = table.cell(i, key.pdb_id).to_uppercase();
        if let Some(value) = updates.get(&pdb) {
            table.set_cell(i, target, *value);
            updated += 1;
        }
    }

    Ok(LigandUpdateOutcome { table, updated })
}

/// File-level [`upsert_model_metrics`].
#[instrument(skip_all, fields(source = %opts.label.source, dataset = %opts.label.dataset))]
pub fn run_upsert_model_metrics(
    master_csv: &Path,
    run_csv: &Path,
    out_csv: &Path,
    opts: &UpsertOptions,
) -> Result<UpsertOutcome> {
    let master = read_csv(master_csv)?;
    let run = read_csv(run_csv)?;

    let outcome = upsert_model_metrics(&master, &run, opts).map_err(|e| {
        let origin = if master.has_column(columns::PDB_ID) {
            run_csv
        } else {
            master_csv
        };
        e.with_origin(origin)
    })?;
    write_csv(&outcome.table, out_csv)?;

    info!(
        replaced = outcome.replaced,
        appended = outcome.appended,
        rows = outcome.table.len(),
        out = %out_csv.display(),
        "upserted model metrics"
    );
    Ok(outcome)
}

/// File-level [`update_ligand_rmsd`].
#[instrument(skip_all, fields(source = %opts.label.source, dataset = %opts.label.dataset))]
pub fn run_update_ligand_rmsd(
    master_csv: &Path,
    ligand_csv: &Path,
    out_csv: &Path,
    opts: &LigandUpdateOptions,
) -> Result<LigandUpdateOutcome> {
    let master = read_csv(master_csv)?;
    let ligand = read_csv(ligand_csv)?;

    let outcome = update_ligand_rmsd(&master, &ligand, opts).map_err(|e| {
        let origin = if master.has_column(columns::PDB_ID) {
            ligand_csv
        } else {
            master_csv
        };
        e.with_origin(origin)
    })?;
    write_csv(&outcome.table, out_csv)?;

    info!(
        updated = outcome.updated,
        target = %opts.target_col,
        out = %out_csv.display(),
        "updated ligand RMSD"
    );
    Ok(outcome)
}
