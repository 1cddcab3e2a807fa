//! Shared error model, configuration, and column vocabulary for ligbench.
//!
//! This crate is the foundation depended on by all other ligbench crates.
//! It provides:
//! - [`LigbenchError`]: the unified error type
//! - Configuration ([`AppConfig`], config loading)
//! - Well-known master-table column names ([`columns`])

pub mod columns;
pub mod config;
pub mod error;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ColumnsConfig, DownloadConfig, PredictionsConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{LigbenchError, Result};
