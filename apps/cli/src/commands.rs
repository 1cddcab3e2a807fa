//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use ligbench_core::finalize::{FinalizeOptions, run_finalize};
use ligbench_core::folder::{DEFAULT_PATTERN, filter_folder, run_combine};
use ligbench_core::master::{
    DEFAULT_TARGET_COL, LigandUpdateOptions, RunKey, RunLabel, UpsertOptions,
    run_update_ligand_rmsd, run_upsert_model_metrics,
};
use ligbench_core::normalize::{SchemaColumns, run_normalize};
use ligbench_core::predictions::{CollectOptions, TargetStatus, collect_top_models, run_validate};
use ligbench_core::select_best::{
    Af3BestOptions, DEFAULT_PROTENIX_ID_COL, run_af3_best, run_protenix_max,
};
use ligbench_ids::{IdMode, IdRule};
use ligbench_rcsb::{RcsbClient, StructureFormat, read_entry_ids};
use ligbench_shared::{AppConfig, init_config, load_config, load_config_from};
use ligbench_table::{Keep, read_table};
use tracing::info;

use crate::progress::CliProgress;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ligbench: aggregate protein-ligand prediction benchmarks.
#[derive(Parser)]
#[command(
    name = "ligbench",
    version,
    about = "Aggregate structure-prediction benchmark results into a master table.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.ligbench/ligbench.toml.
    #[arg(long, global = true, env = "LIGBENCH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Stage 1: keep the best row per target from a raw tool run.
    SelectBest {
        #[command(subcommand)]
        action: SelectBestAction,
    },

    /// Stage 2: filter or combine every CSV in a folder.
    Folder {
        #[command(subcommand)]
        action: FolderAction,
    },

    /// Stage 3: coerce a combined sheet into Source, dataset, PDB_ID, RMSD.
    Normalize {
        #[arg(long)]
        in_csv: PathBuf,

        #[arg(long)]
        out_csv: PathBuf,

        /// Overrides [columns].pdb.
        #[arg(long)]
        pdb_col: Option<String>,

        /// Overrides [columns].source.
        #[arg(long)]
        source_col: Option<String>,

        /// Overrides [columns].dataset.
        #[arg(long)]
        dataset_col: Option<String>,

        /// Overrides [columns].rmsd.
        #[arg(long)]
        rmsd_col: Option<String>,
    },

    /// Stage 4: merge a run into the master table.
    Master {
        #[command(subcommand)]
        action: MasterAction,
    },

    /// Stage 5: final renames, run exclusion, and missing-value cleanup.
    Finalize {
        #[arg(long)]
        in_csv: PathBuf,

        #[arg(long)]
        out_csv: PathBuf,

        /// Drop rows with any missing value.
        #[arg(long)]
        dropna: bool,

        /// Source of the run to drop (needs --exclude-dataset).
        #[arg(long, requires = "exclude_dataset")]
        exclude_source: Option<String>,

        /// Dataset of the run to drop (needs --exclude-source).
        #[arg(long, requires = "exclude_source")]
        exclude_dataset: Option<String>,

        /// Rename RMSD/model_* columns to their final names.
        #[arg(long)]
        rename_to_final: bool,
    },

    /// Check or gather raw prediction files.
    Predictions {
        #[command(subcommand)]
        action: PredictionsAction,
    },

    /// Download structures for the entries listed in a CSV or spreadsheet column.
    Download {
        /// CSV or spreadsheet (.xlsx, .xls, .ods) holding the entry list.
        #[arg(long, alias = "ids-csv")]
        ids: PathBuf,

        /// Worksheet to read from a spreadsheet; defaults to the first.
        #[arg(long)]
        sheet: Option<String>,

        /// Column with entry names; the ID is the text before the first '_'.
        /// Overrides [download].entry_column.
        #[arg(long)]
        column: Option<String>,

        /// pdb or cif.
        #[arg(long)]
        format: StructureFormat,

        #[arg(long)]
        out_dir: PathBuf,

        /// Re-download files that already exist.
        #[arg(long)]
        overwrite: bool,

        /// Pause between downloads. Overrides [download].sleep_ms.
        #[arg(long)]
        sleep_ms: Option<u64>,

        /// Only download the first N IDs.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Look up ligand SMILES by chem-comp ID.
    Chemcomp {
        /// One or more chem-comp IDs (e.g. ATP).
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum SelectBestAction {
    /// Lowest-RMSD seed per complex (first five characters of the seed column).
    Af3Best {
        #[arg(long)]
        in_csv: PathBuf,

        #[arg(long)]
        out_csv: PathBuf,

        #[arg(long, default_value = "Complex_Seed")]
        seed_col: String,

        #[arg(long, default_value = "RMSD")]
        rmsd_col: String,
    },

    /// Row-wise maximum of every non-ID column, stored as RMSD.
    ProtenixMax {
        #[arg(long)]
        in_csv: PathBuf,

        #[arg(long)]
        out_csv: PathBuf,

        #[arg(long, default_value = DEFAULT_PROTENIX_ID_COL)]
        id_col: String,
    },
}

#[derive(Subcommand)]
pub(crate) enum FolderAction {
    /// Write <stem>_filtered.csv with the first column plus RMSD.
    Filter {
        #[arg(long)]
        folder: PathBuf,

        #[arg(long, default_value = DEFAULT_PATTERN)]
        pattern: String,

        #[arg(long, default_value = "RMSD")]
        rmsd_col: String,
    },

    /// Concatenate matching CSVs with a leading Source column.
    Combine {
        #[arg(long)]
        folder: PathBuf,

        #[arg(long, default_value = DEFAULT_PATTERN)]
        pattern: String,

        #[arg(long)]
        out_csv: PathBuf,
    },
}

/// Options shared by both master updates.
#[derive(Args)]
pub(crate) struct RunArgs {
    #[arg(long)]
    master_csv: PathBuf,

    #[arg(long)]
    out_csv: PathBuf,

    /// Source tag of the run (matched case-insensitively).
    #[arg(long)]
    source: String,

    /// Dataset label of the run (matched case-insensitively).
    #[arg(long)]
    dataset: String,

    /// Column holding the run's raw identifier.
    #[arg(long)]
    id_col: String,

    /// How to turn the identifier into a PDB_ID key.
    #[arg(long)]
    id_mode: IdMode,

    /// Chain column, required by pdb_plus_chain.
    #[arg(long)]
    chain_col: Option<String>,

    /// Score column used to pick the best row per key.
    #[arg(long)]
    rmsd_col: String,

    /// Which end of the score wins: min or max.
    #[arg(long, default_value = "min")]
    keep: Keep,
}

impl RunArgs {
    fn label(&self) -> RunLabel {
        RunLabel {
            source: self.source.clone(),
            dataset: self.dataset.clone(),
        }
    }

    fn key(&self) -> Result<RunKey> {
        Ok(RunKey {
            id_col: self.id_col.clone(),
            rule: IdRule::new(self.id_mode, self.chain_col.as_deref())?,
        })
    }
}

#[derive(Subcommand)]
pub(crate) enum MasterAction {
    /// Replace whole master rows with fresh model metrics.
    UpsertModelMetrics {
        #[command(flatten)]
        run: RunArgs,

        #[arg(long)]
        run_csv: PathBuf,

        #[arg(long)]
        tm_col: Option<String>,

        #[arg(long)]
        plddt_col: Option<String>,
    },

    /// Overwrite one column of existing master rows with ligand RMSD.
    UpdateLigandRmsd {
        #[command(flatten)]
        run: RunArgs,

        #[arg(long)]
        ligand_csv: PathBuf,

        #[arg(long, default_value = DEFAULT_TARGET_COL)]
        target_col: String,
    },
}

#[derive(Subcommand)]
pub(crate) enum PredictionsAction {
    /// Count model files per target directory and flag empty or tiny ones.
    Validate {
        #[arg(long)]
        pred_root: PathBuf,

        #[arg(long)]
        out_csv: PathBuf,

        /// Overrides [predictions].min_bytes.
        #[arg(long)]
        min_bytes: Option<u64>,
    },

    /// Copy the top-ranked models per target into <out-dir>/<ID>/.
    Collect {
        #[arg(long)]
        root: PathBuf,

        #[arg(long)]
        out_dir: PathBuf,

        /// Overrides [predictions].max_per_target.
        #[arg(long)]
        max_per_target: Option<usize>,

        #[arg(long)]
        overwrite: bool,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "ligbench=info",
        1 => "ligbench=debug",
        _ => "ligbench=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    })
}

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Command::SelectBest { action } => cmd_select_best(action),
        Command::Folder { action } => cmd_folder(action),
        Command::Normalize {
            in_csv,
            out_csv,
            pdb_col,
            source_col,
            dataset_col,
            rmsd_col,
        } => {
            let config = resolve_config(config_path)?;
            let defaults = SchemaColumns::from(&config.columns);
            let cols = SchemaColumns {
                pdb_col: pdb_col.unwrap_or(defaults.pdb_col),
                source_col: source_col.unwrap_or(defaults.source_col),
                dataset_col: dataset_col.unwrap_or(defaults.dataset_col),
                rmsd_col: rmsd_col.unwrap_or(defaults.rmsd_col),
            };
            let rows = run_normalize(&in_csv, &out_csv, &cols)?;
            println!("Wrote {rows} rows -> {}", out_csv.display());
            Ok(())
        }
        Command::Master { action } => cmd_master(action),
        Command::Finalize {
            in_csv,
            out_csv,
            dropna,
            exclude_source,
            exclude_dataset,
            rename_to_final,
        } => {
            let opts = FinalizeOptions {
                rename_to_final,
                exclude: exclude_source.zip(exclude_dataset),
                dropna,
            };
            let rows = run_finalize(&in_csv, &out_csv, &opts)?;
            println!("Wrote {rows} rows -> {}", out_csv.display());
            Ok(())
        }
        Command::Predictions { action } => {
            cmd_predictions(action, &resolve_config(config_path)?)
        }
        Command::Download {
            ids,
            sheet,
            column,
            format,
            out_dir,
            overwrite,
            sleep_ms,
            limit,
        } => {
            let mut config = resolve_config(config_path)?;
            if let Some(ms) = sleep_ms {
                config.download.sleep_ms = ms;
            }
            let column = column.unwrap_or_else(|| config.download.entry_column.clone());
            let source = EntrySource {
                path: &ids,
                sheet: sheet.as_deref(),
                column: &column,
            };
            cmd_download(&config, &source, format, &out_dir, overwrite, limit).await
        }
        Command::Chemcomp { ids } => cmd_chemcomp(&resolve_config(config_path)?, &ids).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_select_best(action: SelectBestAction) -> Result<()> {
    let (rows, out_csv) = match action {
        SelectBestAction::Af3Best {
            in_csv,
            out_csv,
            seed_col,
            rmsd_col,
        } => {
            let opts = Af3BestOptions { seed_col, rmsd_col };
            (run_af3_best(&in_csv, &out_csv, &opts)?, out_csv)
        }
        SelectBestAction::ProtenixMax {
            in_csv,
            out_csv,
            id_col,
        } => (run_protenix_max(&in_csv, &out_csv, &id_col)?, out_csv),
    };
    println!("Wrote {rows} rows -> {}", out_csv.display());
    Ok(())
}

fn cmd_folder(action: FolderAction) -> Result<()> {
    match action {
        FolderAction::Filter {
            folder,
            pattern,
            rmsd_col,
        } => {
            let report = filter_folder(&folder, &pattern, &rmsd_col)?;
            for path in &report.written {
                println!("OK   {}", path.display());
            }
            for path in &report.skipped {
                println!("SKIP {} (no {rmsd_col} column)", path.display());
            }
            println!(
                "Done. Written={} Skipped={}",
                report.written.len(),
                report.skipped.len()
            );
        }
        FolderAction::Combine {
            folder,
            pattern,
            out_csv,
        } => {
            let rows = run_combine(&folder, &pattern, &out_csv)?;
            println!("Wrote {rows} rows -> {}", out_csv.display());
        }
    }
    Ok(())
}

fn cmd_master(action: MasterAction) -> Result<()> {
    match action {
        MasterAction::UpsertModelMetrics {
            run,
            run_csv,
            tm_col,
            plddt_col,
        } => {
            let opts = UpsertOptions {
                label: run.label(),
                key: run.key()?,
                rmsd_col: run.rmsd_col.clone(),
                tm_col,
                plddt_col,
                keep: run.keep,
            };
            let outcome = run_upsert_model_metrics(&run.master_csv, &run_csv, &run.out_csv, &opts)?;
            println!(
                "Wrote {} rows -> {} (replaced {}, appended {})",
                outcome.table.len(),
                run.out_csv.display(),
                outcome.replaced,
                outcome.appended
            );
        }
        MasterAction::UpdateLigandRmsd {
            run,
            ligand_csv,
            target_col,
        } => {
            let opts = LigandUpdateOptions {
                label: run.label(),
                key: run.key()?,
                rmsd_col: run.rmsd_col.clone(),
                target_col,
                keep: run.keep,
            };
            let outcome = run_update_ligand_rmsd(&run.master_csv, &ligand_csv, &run.out_csv, &opts)?;
            println!(
                "Wrote {} rows -> {} (updated {})",
                outcome.table.len(),
                run.out_csv.display(),
                outcome.updated
            );
        }
    }
    Ok(())
}

fn cmd_predictions(action: PredictionsAction, config: &AppConfig) -> Result<()> {
    match action {
        PredictionsAction::Validate {
            pred_root,
            out_csv,
            min_bytes,
        } => {
            let min_bytes = min_bytes.unwrap_or(config.predictions.min_bytes);
            let reports = run_validate(&pred_root, &out_csv, min_bytes)?;
            let count = |s: TargetStatus| reports.iter().filter(|r| r.status == s).count();
            println!(
                "Wrote {} rows -> {} (OK={} WARN={} FAIL={})",
                reports.len(),
                out_csv.display(),
                count(TargetStatus::Ok),
                count(TargetStatus::Warn),
                count(TargetStatus::Fail)
            );
        }
        PredictionsAction::Collect {
            root,
            out_dir,
            max_per_target,
            overwrite,
        } => {
            let opts = CollectOptions {
                max_per_target: max_per_target.unwrap_or(config.predictions.max_per_target),
                overwrite,
            };
            let written = collect_top_models(&root, &out_dir, &opts)?;
            println!("Done. Wrote {written} files into {}", out_dir.display());
        }
    }
    Ok(())
}

/// Where `download` reads its entry list from.
struct EntrySource<'a> {
    path: &'a Path,
    sheet: Option<&'a str>,
    column: &'a str,
}

async fn cmd_download(
    config: &AppConfig,
    source: &EntrySource<'_>,
    format: StructureFormat,
    out_dir: &Path,
    overwrite: bool,
    limit: Option<usize>,
) -> Result<()> {
    let table = read_table(source.path, source.sheet)?;
    let ids = read_entry_ids(&table, source.column, limit)
        .map_err(|e| e.with_origin(source.path))?;
    info!(count = ids.len(), %format, out_dir = %out_dir.display(), "downloading structures");

    let client = RcsbClient::new(&config.download)?;
    let progress = CliProgress::new();
    let summary = client
        .download_all(&ids, format, out_dir, overwrite, &progress)
        .await;

    println!(
        "Done. Success={} Failed={} Total={}",
        summary.succeeded,
        summary.failed,
        summary.total()
    );

    if summary.failed > 0 {
        return Err(eyre!(
            "{} of {} downloads failed",
            summary.failed,
            summary.total()
        ));
    }
    Ok(())
}

async fn cmd_chemcomp(config: &AppConfig, ids: &[String]) -> Result<()> {
    let client = RcsbClient::new(&config.download)?;
    for id in ids {
        match client.fetch_chemcomp_smiles(id).await {
            Some(smiles) => println!("{}\t{smiles}", id.trim().to_uppercase()),
            None => println!("{}\t(not found)", id.trim().to_uppercase()),
        }
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
