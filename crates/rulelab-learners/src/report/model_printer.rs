use std::io::Write;
use std::path::PathBuf;

use crate::data_handling::MetaData;
use crate::error::Result;
use crate::io::{open_append, output_file_name};
use crate::models::{PrintOptions, RuleModel, RuleModelFormatter};
use crate::report::OutputDirectory;

pub const RULES_FILE_PREFIX: &str = "rules";

/// A sink for the textual rendering of a model.
pub trait ModelPrinterOutput {
    /// `fold` is `None` for the single split of an experiment without
    /// cross-validation.
    fn write_model(
        &mut self,
        experiment_name: &str,
        text: &str,
        total_folds: usize,
        fold: Option<usize>,
    ) -> Result<()>;
}

/// Writes models to the log at a fixed level.
#[derive(Debug, Clone)]
pub struct ModelPrinterLogOutput {
    level: log::Level,
}

impl ModelPrinterLogOutput {
    pub fn new(level: log::Level) -> Self {
        Self { level }
    }
}

impl Default for ModelPrinterLogOutput {
    fn default() -> Self {
        Self::new(log::Level::Info)
    }
}

impl ModelPrinterOutput for ModelPrinterLogOutput {
    fn write_model(
        &mut self,
        experiment_name: &str,
        text: &str,
        total_folds: usize,
        fold: Option<usize>,
    ) -> Result<()> {
        let fold_label = match fold {
            Some(k) if total_folds > 1 => format!(" (Fold {})", k + 1),
            _ => String::new(),
        };
        log::log!(
            self.level,
            "Model for experiment \"{}\"{}:\n\n{}",
            experiment_name,
            fold_label,
            text
        );
        Ok(())
    }
}

/// Appends models to `rules_<name>_<fold>.txt` files.
#[derive(Debug, Clone)]
pub struct ModelPrinterTxtOutput {
    output_dir: OutputDirectory,
}

impl ModelPrinterTxtOutput {
    pub fn new(output_dir: impl Into<PathBuf>, clear_dir: bool) -> Self {
        Self {
            output_dir: OutputDirectory::new(output_dir, clear_dir),
        }
    }

    pub fn clear_dir_if_necessary(&mut self) -> Result<bool> {
        self.output_dir.clear_dir_if_necessary()
    }
}

impl ModelPrinterOutput for ModelPrinterTxtOutput {
    fn write_model(
        &mut self,
        experiment_name: &str,
        text: &str,
        _total_folds: usize,
        fold: Option<usize>,
    ) -> Result<()> {
        self.clear_dir_if_necessary()?;

        let path = self
            .output_dir
            .path()
            .join(output_file_name(RULES_FILE_PREFIX, experiment_name, fold, "txt"));
        let mut file = open_append(&path)?;
        file.write_all(text.as_bytes())?;

        log::debug!("Wrote model to file {}", path.display());
        Ok(())
    }
}

/// Renders models as text and passes them to every registered output.
pub struct ModelPrinter {
    options: PrintOptions,
    outputs: Vec<Box<dyn ModelPrinterOutput>>,
}

impl ModelPrinter {
    pub fn new(options: PrintOptions) -> Self {
        Self {
            options,
            outputs: Vec::new(),
        }
    }

    pub fn with_output(mut self, output: Box<dyn ModelPrinterOutput>) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn add_output(&mut self, output: Box<dyn ModelPrinterOutput>) {
        self.outputs.push(output);
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn print(
        &mut self,
        experiment_name: &str,
        meta_data: &MetaData,
        model: &RuleModel,
        total_folds: usize,
        fold: Option<usize>,
    ) -> Result<()> {
        let text = RuleModelFormatter::new(meta_data, self.options).format(model);

        for output in self.outputs.iter_mut() {
            output.write_model(experiment_name, &text, total_folds, fold)?;
        }

        Ok(())
    }
}
