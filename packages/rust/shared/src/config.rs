//! Application configuration for ligbench.
//!
//! User config lives at `~/.ligbench/ligbench.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::columns;
use crate::error::{LigbenchError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "ligbench.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".ligbench";

// ---------------------------------------------------------------------------
// Config structs (matching ligbench.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Column names expected in combined spreadsheets.
    #[serde(default)]
    pub columns: ColumnsConfig,

    /// Structure archive settings.
    #[serde(default)]
    pub download: DownloadConfig,

    /// Prediction output checks.
    #[serde(default)]
    pub predictions: PredictionsConfig,
}

/// `[columns]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnsConfig {
    #[serde(default = "default_pdb_col")]
    pub pdb: String,

    #[serde(default = "default_source_col")]
    pub source: String,

    #[serde(default = "default_dataset_col")]
    pub dataset: String,

    #[serde(default = "default_rmsd_col")]
    pub rmsd: String,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            pdb: default_pdb_col(),
            source: default_source_col(),
            dataset: default_dataset_col(),
            rmsd: default_rmsd_col(),
        }
    }
}

fn default_pdb_col() -> String {
    columns::PDB_ID.into()
}
fn default_source_col() -> String {
    columns::SOURCE.into()
}
fn default_dataset_col() -> String {
    columns::DATASET.into()
}
fn default_rmsd_col() -> String {
    columns::RMSD.into()
}

/// `[download]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Base URL for coordinate files (`<base>/download/<id>.<fmt>`).
    #[serde(default = "default_files_base_url")]
    pub files_base_url: String,

    /// Base URL for the chem-comp REST API.
    #[serde(default = "default_data_base_url")]
    pub data_base_url: String,

    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Pause between successful downloads, in milliseconds.
    #[serde(default)]
    pub sleep_ms: u64,

    /// Column holding entry names in ID list spreadsheets.
    #[serde(default = "default_entry_column")]
    pub entry_column: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            files_base_url: default_files_base_url(),
            data_base_url: default_data_base_url(),
            timeout_secs: default_timeout_secs(),
            sleep_ms: 0,
            entry_column: default_entry_column(),
        }
    }
}

fn default_files_base_url() -> String {
    "https://files.rcsb.org".into()
}
fn default_data_base_url() -> String {
    "https://data.rcsb.org".into()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_entry_column() -> String {
    "entryName".into()
}

/// `[predictions]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionsConfig {
    /// Model files smaller than this are flagged as suspicious.
    #[serde(default = "default_min_bytes")]
    pub min_bytes: u64,

    /// How many ranked models to collect per target.
    #[serde(default = "default_max_per_target")]
    pub max_per_target: usize,
}

impl Default for PredictionsConfig {
    fn default() -> Self {
        Self {
            min_bytes: default_min_bytes(),
            max_per_target: default_max_per_target(),
        }
    }
}

fn default_min_bytes() -> u64 {
    5000
}
fn default_max_per_target() -> usize {
    5
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.ligbench/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| LigbenchError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.ligbench/ligbench.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LigbenchError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| LigbenchError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| LigbenchError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| LigbenchError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| LigbenchError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("files_base_url"));
        assert!(toml_str.contains("entryName"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.predictions.min_bytes, 5000);
        assert_eq!(parsed.columns.pdb, "PDB_ID");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[columns]
rmsd = "ligand_rmsd_raw"

[download]
timeout_secs = 5
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.columns.rmsd, "ligand_rmsd_raw");
        assert_eq!(config.columns.source, "Source");
        assert_eq!(config.download.timeout_secs, 5);
        assert_eq!(config.download.files_base_url, "https://files.rcsb.org");
        assert_eq!(config.predictions.max_per_target, 5);
    }

    #[test]
    fn load_config_from_reports_parse_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ligbench.toml");
        std::fs::write(&path, "[download\ntimeout_secs = ").expect("write");

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }
}
