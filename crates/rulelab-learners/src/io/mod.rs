//! File naming and directory helpers shared by the report sinks and the model
//! cache.
use std::fs::{self, File, OpenOptions};
use std::path::Path;

use crate::error::Result;

/// Suffix identifying a fold: `fold-<k+1>` for cross-validation folds,
/// `overall` for a single split.
pub fn fold_suffix(fold: Option<usize>) -> String {
    match fold {
        Some(k) => format!("fold-{}", k + 1),
        None => "overall".to_string(),
    }
}

/// `<prefix>_<name>_<fold suffix>.<ext>`
pub fn output_file_name(prefix: &str, name: &str, fold: Option<usize>, extension: &str) -> String {
    format!("{}_{}_{}.{}", prefix, name, fold_suffix(fold), extension)
}

/// Deletes every file in `dir`, creating the directory if it does not exist.
/// Sub-directories are kept. Returns the number of deleted files.
pub fn clear_directory(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
        return Ok(0);
    }

    let mut deleted = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            fs::remove_file(&path)?;
            deleted += 1;
        }
    }

    log::debug!("Deleted {} files from directory {}", deleted, dir.display());
    Ok(deleted)
}

/// Opens `path` for appending, creating the file and its parent directories
/// as needed.
pub fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}
