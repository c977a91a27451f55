use anyhow::{Context, Result};

use rulelab_learners::experiment::{Experiment, FoldOutcome};
use rulelab_learners::models::{DefaultRuleInduction, RuleLearner, RuleModelInduction};
use rulelab_learners::persistence::ModelPersistence;
use rulelab_learners::report::{
    ModelPrinter, ModelPrinterLogOutput, ModelPrinterTxtOutput, PredictionPrinter,
    PredictionPrinterCsvOutput,
};

use crate::args::RunConfig;
use crate::load_data::load_data_set;

/// Model printer for the configured sinks, or `None` if no sink is enabled.
pub fn create_model_printer(config: &RunConfig) -> Option<ModelPrinter> {
    let mut printer = ModelPrinter::new(config.print_options);

    if config.print_rules {
        printer.add_output(Box::new(ModelPrinterLogOutput::new(log::Level::Info)));
    }

    if let (Some(output_dir), true) = (&config.output_dir, config.store_rules) {
        printer.add_output(Box::new(ModelPrinterTxtOutput::new(output_dir, true)));
    }

    if printer.is_empty() {
        None
    } else {
        Some(printer)
    }
}

/// Prediction printer for the configured sinks, or `None` if no sink is enabled.
/// The CSV sink never clears the output directory it shares with the rule files.
pub fn create_prediction_printer(config: &RunConfig) -> Option<PredictionPrinter> {
    match (&config.output_dir, config.store_predictions) {
        (Some(output_dir), true) => Some(
            PredictionPrinter::new()
                .with_output(Box::new(PredictionPrinterCsvOutput::new(output_dir, false))),
        ),
        _ => None,
    }
}

pub fn run_experiment(config: &RunConfig) -> Result<Vec<FoldOutcome>> {
    run_experiment_with_engine(config, &DefaultRuleInduction)
}

pub fn run_experiment_with_engine(
    config: &RunConfig,
    engine: &dyn RuleModelInduction,
) -> Result<Vec<FoldOutcome>> {
    let algorithm_config = config
        .params
        .build()
        .context("Invalid learner configuration")?;

    let data_set = load_data_set(
        config.dataset_file(),
        config.label_columns.as_deref(),
        &config.nominal_columns,
    )?;

    let learner = RuleLearner::new(config.params.clone());
    let mut experiment = Experiment::new(learner, &data_set, engine)
        .with_folds(config.folds)
        .with_current_fold(config.current_fold)
        .with_random_state(u64::from(algorithm_config.seed));

    if let Some(model_dir) = &config.model_dir {
        experiment = experiment.with_persistence(ModelPersistence::new(model_dir));
    }
    if let Some(model_printer) = create_model_printer(config) {
        experiment = experiment.with_model_printer(model_printer);
    }
    if let Some(prediction_printer) = create_prediction_printer(config) {
        experiment = experiment.with_prediction_printer(prediction_printer);
    }

    let outcomes = experiment
        .run()
        .with_context(|| format!("Experiment \"{}\" failed", experiment.name()))?;
    Ok(outcomes)
}
