//! Column names that form the CSV contract between pipeline stages.

pub const SOURCE: &str = "Source";
pub const DATASET: &str = "dataset";
pub const PDB_ID: &str = "PDB_ID";
pub const RMSD: &str = "RMSD";

pub const MODEL_RMSD: &str = "model_rmsd";
pub const MODEL_TM_SCORE: &str = "model_tm_score";
pub const MODEL_PLDDT: &str = "model_plddt";
pub const LIGAND_RMSD: &str = "ligand_rmsd";

/// Metric columns a master table must carry before an upsert appends rows.
pub const MASTER_METRICS: [&str; 5] = [MODEL_RMSD, MODEL_TM_SCORE, MODEL_PLDDT, RMSD, LIGAND_RMSD];

/// Canonical column order written by schema normalization.
pub const MASTER_SCHEMA: [&str; 4] = [SOURCE, DATASET, PDB_ID, RMSD];

/// Intermediate-to-final renames applied by finalize.
pub const FINAL_RENAMES: [(&str, &str); 4] = [
    (RMSD, LIGAND_RMSD),
    (MODEL_RMSD, "rmsd"),
    (MODEL_TM_SCORE, "tm_score"),
    (MODEL_PLDDT, "plddt"),
];
