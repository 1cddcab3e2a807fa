//! Thin client for the RCSB PDB archive.
//!
//! Downloads coordinate files one entry at a time and looks up ligand
//! SMILES from the chem-comp REST API. Per-entry failures are reported in
//! [`DownloadResult`] values rather than as errors, so a batch always runs
//! to the end and the caller decides how to summarize it.

mod chemcomp;
mod entries;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ligbench_shared::{DownloadConfig, LigbenchError, Result};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, instrument, warn};
use url::Url;

pub use entries::{entry_id, read_entry_ids};

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 3;

/// User-Agent string for archive requests.
const USER_AGENT: &str = concat!("ligbench/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// StructureFormat
// ---------------------------------------------------------------------------

/// Coordinate file format served by the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureFormat {
    Pdb,
    Cif,
}

impl StructureFormat {
    pub fn extension(self) -> &'static str {
        match self {
            StructureFormat::Pdb => "pdb",
            StructureFormat::Cif => "cif",
        }
    }
}

impl fmt::Display for StructureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for StructureFormat {
    type Err = LigbenchError;

    /// Accepts `pdb`/`cif` in any case, with or without a leading dot.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "pdb" => Ok(StructureFormat::Pdb),
            "cif" => Ok(StructureFormat::Cif),
            other => Err(LigbenchError::config(format!(
                "format must be 'pdb' or 'cif', got '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of one structure download.
#[derive(Debug, Clone)]
pub struct DownloadResult {
    /// Trimmed, lower-cased entry ID.
    pub pdb_id: String,
    pub format: StructureFormat,
    pub url: String,
    pub path: PathBuf,
    pub ok: bool,
    /// HTTP status, if a request was made and answered.
    pub status_code: Option<u16>,
    pub error: Option<String>,
}

impl DownloadResult {
    /// True when the file was fetched rather than already on disk.
    pub fn fetched(&self) -> bool {
        self.ok && self.status_code.is_some()
    }
}

/// Aggregate of a [`RcsbClient::download_all`] run.
#[derive(Debug, Default)]
pub struct DownloadSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<DownloadResult>,
}

impl DownloadSummary {
    pub fn total(&self) -> usize {
        self.results.len()
    }
}

/// Progress callbacks for batch downloads.
pub trait DownloadProgress: Send + Sync {
    /// Called once before the first request.
    fn start(&self, total: usize);
    /// Called after each entry, successful or not.
    fn item(&self, result: &DownloadResult);
    /// Called when the batch completes.
    fn done(&self, summary: &DownloadSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl DownloadProgress for SilentProgress {
    fn start(&self, _total: usize) {}
    fn item(&self, _result: &DownloadResult) {}
    fn done(&self, _summary: &DownloadSummary) {}
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client bound to the configured archive endpoints.
#[derive(Debug, Clone)]
pub struct RcsbClient {
    client: Client,
    files_base: Url,
    data_base: Url,
    sleep: Duration,
}

fn parse_base(raw: &str, key: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| LigbenchError::config(format!("invalid {key} '{raw}': {e}")))
}

fn join_base(base: &Url, path: &str) -> String {
    format!("{}/{path}", base.as_str().trim_end_matches('/'))
}

impl RcsbClient {
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LigbenchError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            files_base: parse_base(&config.files_base_url, "files_base_url")?,
            data_base: parse_base(&config.data_base_url, "data_base_url")?,
            sleep: Duration::from_millis(config.sleep_ms),
        })
    }

    /// `<files_base>/download/<id>.<fmt>` for an already-cleaned ID.
    pub fn structure_url(&self, pdb_id: &str, format: StructureFormat) -> String {
        join_base(&self.files_base, &format!("download/{pdb_id}.{format}"))
    }

    /// Download one entry to `<out_dir>/<id>.<fmt>`.
    ///
    /// An existing target is reported as ok without a request unless
    /// `overwrite` is set.
    #[instrument(skip_all, fields(pdb_id = %pdb_id, format = %format))]
    pub async fn download_structure(
        &self,
        pdb_id: &str,
        format: StructureFormat,
        out_dir: &Path,
        overwrite: bool,
    ) -> DownloadResult {
        let id = pdb_id.trim().to_lowercase();
        let url = self.structure_url(&id, format);
        let path = out_dir.join(format!("{id}.{format}"));

        let mut result = DownloadResult {
            pdb_id: id,
            format,
            url,
            path,
            ok: false,
            status_code: None,
            error: None,
        };

        if result.path.exists() && !overwrite {
            debug!(path = %result.path.display(), "already downloaded");
            result.ok = true;
            return result;
        }

        if let Err(e) = tokio::fs::create_dir_all(out_dir).await {
            result.error = Some(format!("{}: {e}", out_dir.display()));
            return result;
        }

        let response = match self.client.get(&result.url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(url = %result.url, error = %e, "request failed");
                result.error = Some(e.to_string());
                return result;
            }
        };

        let status = response.status();
        result.status_code = Some(status.as_u16());
        if status != StatusCode::OK {
            warn!(url = %result.url, status = status.as_u16(), "download failed");
            result.error = Some(format!("HTTP {}", status.as_u16()));
            return result;
        }

        let body = match response.bytes().await {
            Ok(b) => b,
            Err(e) => {
                result.error = Some(format!("failed to read body: {e}"));
                return result;
            }
        };

        match tokio::fs::write(&result.path, &body).await {
            Ok(()) => result.ok = true,
            Err(e) => result.error = Some(format!("{}: {e}", result.path.display())),
        }
        result
    }

    /// Download every ID in order, pausing `sleep_ms` after each fetch.
    #[instrument(skip_all, fields(count = ids.len(), format = %format))]
    pub async fn download_all(
        &self,
        ids: &[String],
        format: StructureFormat,
        out_dir: &Path,
        overwrite: bool,
        progress: &dyn DownloadProgress,
    ) -> DownloadSummary {
        progress.start(ids.len());

        let mut summary = DownloadSummary::default();
        for id in ids {
            let result = self.download_structure(id, format, out_dir, overwrite).await;
            progress.item(&result);

            if result.ok {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
            let pause = result.fetched() && !self.sleep.is_zero();
            summary.results.push(result);

            if pause {
                tokio::time::sleep(self.sleep).await;
            }
        }

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "downloads complete"
        );
        progress.done(&summary);
        summary
    }

    /// First SMILES descriptor for a chem-comp ID, or `None` on any failure.
    pub async fn fetch_chemcomp_smiles(&self, comp_id: &str) -> Option<String> {
        let id = comp_id.trim().to_lowercase();
        let url = join_base(&self.data_base, &format!("rest/v1/core/chemcomp/{id}"));
        chemcomp::fetch_smiles(&self.client, &url).await
    }
}
