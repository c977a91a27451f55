use std::path::PathBuf;

use crate::error::Result;
use crate::io::{open_append, output_file_name};
use crate::models::Predictions;
use crate::report::OutputDirectory;

pub const PREDICTIONS_FILE_PREFIX: &str = "predictions";

/// A sink for the predictions recorded while a model was trained.
pub trait PredictionPrinterOutput {
    fn write_predictions(
        &mut self,
        experiment_name: &str,
        predictions: &Predictions,
        total_folds: usize,
        fold: Option<usize>,
    ) -> Result<()>;
}

/// Appends predictions to `predictions_<name>_<fold>.csv` files, one row per
/// example and one column per induction iteration.
#[derive(Debug, Clone)]
pub struct PredictionPrinterCsvOutput {
    output_dir: OutputDirectory,
}

impl PredictionPrinterCsvOutput {
    pub fn new(output_dir: impl Into<PathBuf>, clear_dir: bool) -> Self {
        Self {
            output_dir: OutputDirectory::new(output_dir, clear_dir),
        }
    }

    pub fn clear_dir_if_necessary(&mut self) -> Result<bool> {
        self.output_dir.clear_dir_if_necessary()
    }
}

fn header(num_iterations: usize) -> Vec<String> {
    std::iter::once("Ground truth".to_string())
        .chain((1..=num_iterations).map(|i| format!("Predictions Iteration {}", i)))
        .collect()
}

impl PredictionPrinterOutput for PredictionPrinterCsvOutput {
    fn write_predictions(
        &mut self,
        experiment_name: &str,
        predictions: &Predictions,
        _total_folds: usize,
        fold: Option<usize>,
    ) -> Result<()> {
        self.clear_dir_if_necessary()?;

        let path = self.output_dir.path().join(output_file_name(
            PREDICTIONS_FILE_PREFIX,
            experiment_name,
            fold,
            "csv",
        ));
        let file = open_append(&path)?;
        let is_new = file.metadata()?.len() == 0;
        let mut writer = csv::Writer::from_writer(file);

        if is_new {
            writer.write_record(header(predictions.num_iterations()))?;
        }

        for (i, ground_truth) in predictions.ground_truth().iter().enumerate() {
            let record: Vec<String> = std::iter::once(ground_truth.to_string())
                .chain(predictions.iterations().iter().map(|it| it[i].to_string()))
                .collect();
            writer.write_record(&record)?;
        }

        writer.flush()?;
        log::debug!("Wrote predictions to file {}", path.display());
        Ok(())
    }
}

/// Passes predictions to every registered output.
#[derive(Default)]
pub struct PredictionPrinter {
    outputs: Vec<Box<dyn PredictionPrinterOutput>>,
}

impl PredictionPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, output: Box<dyn PredictionPrinterOutput>) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn add_output(&mut self, output: Box<dyn PredictionPrinterOutput>) {
        self.outputs.push(output);
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn print(
        &mut self,
        experiment_name: &str,
        predictions: &Predictions,
        total_folds: usize,
        fold: Option<usize>,
    ) -> Result<()> {
        for output in self.outputs.iter_mut() {
            output.write_predictions(experiment_name, predictions, total_folds, fold)?;
        }

        Ok(())
    }
}
