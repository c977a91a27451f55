//! File-backed cache of trained models, keyed by model name and fold.
//!
//! The fold key includes the number of folds, so folds of differently
//! partitioned experiments never share an entry.
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Stores models as JSON files in a directory.
///
/// Entries are never evicted. A model is only written by an explicit call to
/// [`ModelPersistence::save_model`].
#[derive(Debug, Clone)]
pub struct ModelPersistence {
    model_dir: PathBuf,
}

impl ModelPersistence {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
        }
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// `<name>.model` for the aggregate, `<name>_fold-<k+1>-of-<n>.model` for
    /// fold `k` of `n`.
    pub fn model_path(&self, model_name: &str, fold: Option<usize>, num_folds: usize) -> PathBuf {
        let file_name = match fold {
            Some(k) => format!("{}_fold-{}-of-{}.model", model_name, k + 1, num_folds),
            None => format!("{}.model", model_name),
        };
        self.model_dir.join(file_name)
    }

    /// Loads a model, or returns `None` if it has never been saved.
    pub fn load_model<M: DeserializeOwned>(
        &self,
        model_name: &str,
        fold: Option<usize>,
        num_folds: usize,
    ) -> Result<Option<M>> {
        let path = self.model_path(model_name, fold, num_folds);

        if !path.is_file() {
            log::debug!("No cached model found at {}", path.display());
            return Ok(None);
        }

        let reader = BufReader::new(File::open(&path)?);
        let model = serde_json::from_reader(reader)?;
        log::info!("Loaded model from file {}", path.display());
        Ok(Some(model))
    }

    /// Saves a model, replacing any previous entry with the same identity.
    pub fn save_model<M: Serialize>(
        &self,
        model: &M,
        model_name: &str,
        fold: Option<usize>,
        num_folds: usize,
    ) -> Result<()> {
        fs::create_dir_all(&self.model_dir)?;
        let path = self.model_path(model_name, fold, num_folds);

        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer(&mut writer, model)?;
        writer.flush()?;

        log::info!("Saved model to file {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Head, ModelBuilder, RuleListBuilder, RuleModel};

    fn model() -> RuleModel {
        let mut builder = RuleListBuilder::new();
        builder.set_default_rule(Head::Full(vec![0.0, 2.0]));
        builder.build(0)
    }

    #[test]
    fn test_save_then_load_same_fold() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = ModelPersistence::new(dir.path());

        persistence.save_model(&model(), "m", Some(2), 4).unwrap();
        let loaded: Option<RuleModel> = persistence.load_model("m", Some(2), 4).unwrap();
        assert_eq!(loaded, Some(model()));

        let missing: Option<RuleModel> = persistence.load_model("m", Some(3), 4).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_aggregate_and_fold_entries_are_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = ModelPersistence::new(dir.path().join("models"));

        persistence.save_model(&model(), "m", None, 1).unwrap();
        assert!(persistence.model_path("m", None, 1).ends_with("m.model"));
        assert!(persistence.model_path("m", Some(0), 2).ends_with("m_fold-1-of-2.model"));

        let fold: Option<RuleModel> = persistence.load_model("m", Some(0), 2).unwrap();
        assert!(fold.is_none());
    }

    #[test]
    fn test_fold_entries_depend_on_number_of_folds() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = ModelPersistence::new(dir.path());

        persistence.save_model(&model(), "m", Some(0), 2).unwrap();
        let other: Option<RuleModel> = persistence.load_model("m", Some(0), 4).unwrap();
        assert!(other.is_none());
        let same: Option<RuleModel> = persistence.load_model("m", Some(0), 2).unwrap();
        assert!(same.is_some());
    }

    #[test]
    fn test_corrupt_entry_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = ModelPersistence::new(dir.path());
        fs::write(persistence.model_path("m", None, 1), "not json").unwrap();

        let result: Result<Option<RuleModel>> = persistence.load_model("m", None, 1);
        assert!(result.is_err());
    }
}
