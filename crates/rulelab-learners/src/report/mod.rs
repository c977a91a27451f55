//! Fan-out of trained models and predictions to independent output sinks.
//!
//! Every printer owns an ordered list of outputs and writes to each of them in
//! registration order. The first failing output aborts the fan-out.
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::io::clear_directory;

pub mod model_printer;
pub mod prediction_printer;

pub use model_printer::{ModelPrinter, ModelPrinterLogOutput, ModelPrinterOutput, ModelPrinterTxtOutput};
pub use prediction_printer::{PredictionPrinter, PredictionPrinterCsvOutput, PredictionPrinterOutput};

/// An output directory that is cleared lazily, at most once, before the first
/// file is written to it.
#[derive(Debug, Clone)]
pub struct OutputDirectory {
    path: PathBuf,
    clear_pending: bool,
}

impl OutputDirectory {
    pub fn new(path: impl Into<PathBuf>, clear_dir: bool) -> Self {
        Self {
            path: path.into(),
            clear_pending: clear_dir,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Clears the directory on the first call if clearing is enabled. Returns
    /// whether the directory was cleared.
    pub fn clear_dir_if_necessary(&mut self) -> Result<bool> {
        if !self.clear_pending {
            return Ok(false);
        }

        clear_directory(&self.path)?;
        self.clear_pending = false;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_clear_dir_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("stale.txt"), "old").unwrap();

        let mut output_dir = OutputDirectory::new(dir.path(), true);
        assert!(output_dir.clear_dir_if_necessary().unwrap());
        assert!(!dir.path().join("stale.txt").exists());

        fs::write(dir.path().join("fresh.txt"), "new").unwrap();
        assert!(!output_dir.clear_dir_if_necessary().unwrap());
        assert!(dir.path().join("fresh.txt").exists());
    }

    #[test]
    fn test_clearing_disabled() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("keep.csv"), "1").unwrap();

        let mut output_dir = OutputDirectory::new(dir.path(), false);
        assert!(!output_dir.clear_dir_if_necessary().unwrap());
        assert!(dir.path().join("keep.csv").exists());
    }
}
