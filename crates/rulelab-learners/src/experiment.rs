//! Cross-validation experiments.
//!
//! An [`Experiment`] fits an independent copy of a base learner on each fold,
//! reusing cached models where available, and passes the results on to the
//! configured printers. Folds are processed sequentially.
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::data_handling::{AttributeType, DataSet};
use crate::error::{LearnerError, Result};
use crate::models::{Learner, RuleModelInduction};
use crate::persistence::ModelPersistence;
use crate::report::{ModelPrinter, PredictionPrinter};

/// What happened to a single fold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldOutcome {
    /// `None` for the single split of an experiment without cross-validation.
    pub fold: Option<usize>,
    pub from_cache: bool,
    /// Wall-clock training time, `None` if the model was loaded.
    pub train_time: Option<Duration>,
}

pub struct Experiment<'a, L> {
    name: String,
    base_learner: L,
    data_set: &'a DataSet,
    engine: &'a dyn RuleModelInduction,
    num_folds: usize,
    current_fold: Option<usize>,
    random_state: u64,
    persistence: Option<ModelPersistence>,
    model_printer: Option<ModelPrinter>,
    prediction_printer: Option<PredictionPrinter>,
}

impl<'a, L> Experiment<'a, L>
where
    L: Learner + Serialize + DeserializeOwned,
{
    /// The experiment is named after the base learner.
    pub fn new(base_learner: L, data_set: &'a DataSet, engine: &'a dyn RuleModelInduction) -> Self {
        Self {
            name: base_learner.name(),
            base_learner,
            data_set,
            engine,
            num_folds: 1,
            current_fold: None,
            random_state: 1,
            persistence: None,
            model_printer: None,
            prediction_printer: None,
        }
    }

    pub fn with_folds(mut self, num_folds: usize) -> Self {
        self.num_folds = num_folds;
        self
    }

    /// Restricts the experiment to a single cross-validation fold.
    pub fn with_current_fold(mut self, current_fold: Option<usize>) -> Self {
        self.current_fold = current_fold;
        self
    }

    /// Seed used to shuffle the examples into folds.
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = random_state;
        self
    }

    pub fn with_persistence(mut self, persistence: ModelPersistence) -> Self {
        self.persistence = Some(persistence);
        self
    }

    pub fn with_model_printer(mut self, model_printer: ModelPrinter) -> Self {
        self.model_printer = Some(model_printer);
        self
    }

    pub fn with_prediction_printer(mut self, prediction_printer: PredictionPrinter) -> Self {
        self.prediction_printer = Some(prediction_printer);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_learner(&self) -> &L {
        &self.base_learner
    }

    pub fn run(&mut self) -> Result<Vec<FoldOutcome>> {
        self.base_learner.validate()?;

        if let Some(current_fold) = self.current_fold {
            if current_fold >= self.num_folds {
                return Err(LearnerError::validation(
                    "current_fold",
                    format!("{} (must be less than {})", current_fold, self.num_folds),
                ));
            }
        }

        log::info!("Starting experiment \"{}\"...", self.name);
        self.data_set.log_summary();

        let folds = self.data_set.folds(self.num_folds, self.random_state)?;
        let total_folds = folds.len();
        let cross_validation = self.num_folds > 1;
        let mut outcomes = Vec::new();

        for fold in folds {
            if self.current_fold.map_or(false, |current| current != fold.index) {
                continue;
            }

            let fold_id = if cross_validation { Some(fold.index) } else { None };
            if cross_validation {
                log::info!("Fold {} / {}:", fold.index + 1, total_folds);
            }

            let outcome = self.run_fold(&fold.train, fold_id, total_folds)?;
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    fn run_fold(
        &mut self,
        train_indices: &[usize],
        fold: Option<usize>,
        total_folds: usize,
    ) -> Result<FoldOutcome> {
        let cached: Option<L> = match &self.persistence {
            Some(persistence) => persistence.load_model(&self.name, fold, total_folds)?,
            None => None,
        };

        let (learner, from_cache, train_time) = match cached {
            Some(learner) => (learner, true, None),
            None => {
                let mut learner = self.base_learner.fresh_copy();
                if let Some(nominal) = learner.as_nominal_mut() {
                    nominal.set_nominal_attribute_indices(
                        self.data_set
                            .meta_data
                            .get_attribute_indices(AttributeType::Nominal),
                    );
                }

                let (x, y) = self.data_set.subset(train_indices);
                log::info!("Fitting model to {} training examples...", train_indices.len());
                let start = Instant::now();
                learner.fit(&x, &y, self.engine)?;
                let train_time = start.elapsed();
                log::info!("Successfully fit model in {:.3} seconds", train_time.as_secs_f64());

                if let Some(persistence) = &self.persistence {
                    persistence.save_model(&learner, &self.name, fold, total_folds)?;
                }

                (learner, false, Some(train_time))
            }
        };

        if let Some(model_printer) = self.model_printer.as_mut() {
            let model = learner.model().ok_or(LearnerError::MissingModel)?;
            model_printer.print(&self.name, &self.data_set.meta_data, model, total_folds, fold)?;
        }

        if let Some(prediction_printer) = self.prediction_printer.as_mut() {
            let predictions = learner.predictions().ok_or(LearnerError::MissingModel)?;
            prediction_printer.print(&self.name, predictions, total_folds, fold)?;
        }

        Ok(FoldOutcome {
            fold,
            from_cache,
            train_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::config::{AlgorithmConfiguration, LearnerParameters};
    use crate::data_handling::{Attribute, MetaData};
    use crate::math::{FeatureMatrix, InputMatrix, LabelMatrix, NominalFeatureMask};
    use crate::models::{Head, ModelBuilder, Predictions, RuleLearner, RuleModel};
    use ndarray::Array2;

    /// Records the number of training examples and the nominal mask of every call.
    #[derive(Default)]
    struct RecordingEngine {
        calls: RefCell<Vec<(usize, NominalFeatureMask)>>,
    }

    impl RuleModelInduction for RecordingEngine {
        fn induce_rules(
            &self,
            _config: &AlgorithmConfiguration,
            nominal_feature_mask: &NominalFeatureMask,
            _feature_matrix: &FeatureMatrix,
            label_matrix: &LabelMatrix,
            _seed: u32,
            model_builder: &mut dyn ModelBuilder,
        ) -> anyhow::Result<(RuleModel, Predictions)> {
            let n = label_matrix.num_examples();
            self.calls
                .borrow_mut()
                .push((n, nominal_feature_mask.clone()));
            model_builder.set_default_rule(Head::Full(vec![n as f64]));
            let mut predictions = Predictions::new(vec![0; n]);
            predictions.push_iteration(vec![1; n])?;
            Ok((model_builder.build(0), predictions))
        }
    }

    fn data_set() -> DataSet {
        let x = Array2::from_shape_fn((10, 2), |(r, c)| (r + c) as f32);
        let y = Array2::from_shape_fn((10, 1), |(r, _)| (r % 2) as u32);
        let meta_data = MetaData {
            attributes: vec![
                Attribute::numeric("a"),
                Attribute::nominal("b", vec!["x".into(), "y".into()]),
            ],
            labels: vec!["label".into()],
        };
        DataSet::new(InputMatrix::Dense(x), InputMatrix::Dense(y), meta_data).unwrap()
    }

    #[test]
    fn test_each_fold_fits_a_fresh_learner() {
        let data = data_set();
        let engine = RecordingEngine::default();
        let mut experiment =
            Experiment::new(RuleLearner::new(LearnerParameters::default()), &data, &engine)
                .with_folds(3);

        let outcomes = experiment.run().unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| !o.from_cache && o.train_time.is_some()));
        assert_eq!(
            outcomes.iter().map(|o| o.fold).collect::<Vec<_>>(),
            vec![Some(0), Some(1), Some(2)]
        );

        let calls = engine.calls.borrow();
        assert_eq!(calls.iter().map(|c| c.0).collect::<Vec<_>>(), vec![6, 7, 7]);
        assert!(calls
            .iter()
            .all(|c| c.1 == NominalFeatureMask::Explicit([1].into_iter().collect())));
        assert!(experiment.base_learner().model().is_none());
    }

    #[test]
    fn test_cached_models_bypass_the_engine() {
        let dir = tempfile::tempdir().unwrap();
        let data = data_set();
        let engine = RecordingEngine::default();

        for _ in 0..2 {
            Experiment::new(RuleLearner::new(LearnerParameters::default()), &data, &engine)
                .with_folds(2)
                .with_persistence(ModelPersistence::new(dir.path()))
                .run()
                .unwrap();
        }
        assert_eq!(engine.calls.borrow().len(), 2);

        let outcomes = Experiment::new(RuleLearner::new(LearnerParameters::default()), &data, &engine)
            .with_folds(2)
            .with_persistence(ModelPersistence::new(dir.path()))
            .run()
            .unwrap();
        assert!(outcomes.iter().all(|o| o.from_cache && o.train_time.is_none()));
        assert_eq!(engine.calls.borrow().len(), 2);
    }

    #[test]
    fn test_different_parameters_do_not_share_cache_entries() {
        let dir = tempfile::tempdir().unwrap();
        let data = data_set();
        let engine = RecordingEngine::default();

        for max_rules in [10, 20] {
            let params = LearnerParameters {
                max_rules,
                ..Default::default()
            };
            Experiment::new(RuleLearner::new(params), &data, &engine)
                .with_persistence(ModelPersistence::new(dir.path()))
                .run()
                .unwrap();
        }
        assert_eq!(engine.calls.borrow().len(), 2);
    }

    #[test]
    fn test_changing_number_of_folds_refits() {
        let dir = tempfile::tempdir().unwrap();
        let data = data_set();
        let engine = RecordingEngine::default();

        Experiment::new(RuleLearner::new(LearnerParameters::default()), &data, &engine)
            .with_folds(2)
            .with_persistence(ModelPersistence::new(dir.path()))
            .run()
            .unwrap();

        let outcomes = Experiment::new(RuleLearner::new(LearnerParameters::default()), &data, &engine)
            .with_folds(4)
            .with_persistence(ModelPersistence::new(dir.path()))
            .run()
            .unwrap();

        assert_eq!(outcomes.len(), 4);
        assert!(outcomes.iter().all(|o| !o.from_cache));
        let calls = engine.calls.borrow();
        assert_eq!(calls.len(), 6);
        assert_eq!(calls[2].0, 7);
    }

    #[test]
    fn test_invalid_parameters_fail_before_cache_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let data = data_set();
        let engine = RecordingEngine::default();
        let params = LearnerParameters {
            min_support: 1.0,
            ..Default::default()
        };
        let persistence = ModelPersistence::new(dir.path());
        let learner = RuleLearner::new(params.clone());
        persistence
            .save_model(&learner, &learner.name(), None, 1)
            .unwrap();

        let err = Experiment::new(RuleLearner::new(params), &data, &engine)
            .with_persistence(persistence)
            .run()
            .unwrap_err();

        assert!(matches!(err, LearnerError::Validation { parameter, .. } if parameter == "min_support"));
        assert!(engine.calls.borrow().is_empty());
    }

    #[test]
    fn test_current_fold_only() {
        let data = data_set();
        let engine = RecordingEngine::default();
        let outcomes = Experiment::new(RuleLearner::new(LearnerParameters::default()), &data, &engine)
            .with_folds(5)
            .with_current_fold(Some(3))
            .run()
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].fold, Some(3));
        assert_eq!(engine.calls.borrow().len(), 1);
    }

    #[test]
    fn test_current_fold_out_of_range() {
        let data = data_set();
        let engine = RecordingEngine::default();
        let err = Experiment::new(RuleLearner::new(LearnerParameters::default()), &data, &engine)
            .with_folds(2)
            .with_current_fold(Some(2))
            .run()
            .unwrap_err();

        assert!(matches!(err, LearnerError::Validation { parameter, .. } if parameter == "current_fold"));
        assert!(engine.calls.borrow().is_empty());
    }

    #[test]
    fn test_single_split_trains_on_everything() {
        let data = data_set();
        let engine = RecordingEngine::default();
        let outcomes = Experiment::new(RuleLearner::new(LearnerParameters::default()), &data, &engine)
            .run()
            .unwrap();

        assert_eq!(outcomes[0].fold, None);
        assert_eq!(engine.calls.borrow()[0].0, 10);
    }
}
