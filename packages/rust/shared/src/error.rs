//! Error types for ligbench.
//!
//! Library crates use [`LigbenchError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all ligbench operations.
#[derive(Debug, thiserror::Error)]
pub enum LigbenchError {
    /// Configuration loading or validation error (unknown mode, bad flag combination).
    #[error("config error: {message}")]
    Config { message: String },

    /// A column required by a stage is absent from its input table.
    #[error("missing required column '{column}'{}", fmt_origin(.origin))]
    MissingColumn {
        column: String,
        origin: Option<PathBuf>,
    },

    /// CSV reading or writing error.
    #[error("csv error at {path:?}: {message}")]
    Csv { path: PathBuf, message: String },

    /// Spreadsheet (xlsx/xls/ods) reading error.
    #[error("spreadsheet error at {path:?}: {message}")]
    Sheet { path: PathBuf, message: String },

    /// Network/HTTP error talking to a structure archive.
    #[error("network error: {0}")]
    Network(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (ragged rows, malformed pattern, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

fn fmt_origin(origin: &Option<PathBuf>) -> String {
    match origin {
        Some(path) => format!(" in {}", path.display()),
        None => String::new(),
    }
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LigbenchError>;

impl LigbenchError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// A required column is missing from an in-memory table.
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
            origin: None,
        }
    }

    /// Attach the originating file to a [`LigbenchError::MissingColumn`].
    /// Other variants pass through unchanged.
    pub fn with_origin(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Self::MissingColumn { column, .. } => Self::MissingColumn {
                column,
                origin: Some(path.into()),
            },
            other => other,
        }
    }

    /// Wrap a CSV error message with a path for context.
    pub fn csv(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Csv {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Wrap a spreadsheet error message with a path for context.
    pub fn sheet(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Sheet {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
