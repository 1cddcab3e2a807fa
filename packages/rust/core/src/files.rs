//! Glob helpers shared by the folder and prediction stages.

use std::path::{Path, PathBuf};

use ligbench_shared::{LigbenchError, Result};

/// Regular files under `dir` matching `pattern`, in lexicographic path
/// order. `dir` is matched literally; only `pattern` is a glob.
pub(crate) fn glob_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full = format!(
        "{}/{pattern}",
        glob::Pattern::escape(&dir.to_string_lossy())
    );

    let paths = glob::glob(&full)
        .map_err(|e| LigbenchError::config(format!("invalid glob pattern '{pattern}': {e}")))?;

    let mut files = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            LigbenchError::io(path, std::io::Error::from(e))
        })?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
