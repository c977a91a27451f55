use crate::config::AlgorithmConfiguration;
use crate::error::{LearnerError, Result};
use crate::math::{FeatureMatrix, LabelMatrix, NominalFeatureMask};
use crate::models::rule_model::{ModelBuilder, Predictions, RuleModel};

/// Contract of a rule induction engine.
///
/// Implementations own the search algorithm. They must not retain references
/// to the matrices, and they report failures through `anyhow` so that any
/// error type can be passed on.
pub trait RuleModelInduction {
    fn induce_rules(
        &self,
        config: &AlgorithmConfiguration,
        nominal_feature_mask: &NominalFeatureMask,
        feature_matrix: &FeatureMatrix,
        label_matrix: &LabelMatrix,
        seed: u32,
        model_builder: &mut dyn ModelBuilder,
    ) -> anyhow::Result<(RuleModel, Predictions)>;

    fn name(&self) -> &str {
        "rule-induction"
    }
}

/// Hands a validated configuration and prepared matrices to an engine.
///
/// Every call to [`InductionAdapter::induce`] invokes the engine exactly once.
pub struct InductionAdapter<'a> {
    config: &'a AlgorithmConfiguration,
    engine: &'a dyn RuleModelInduction,
}

impl<'a> InductionAdapter<'a> {
    pub fn new(config: &'a AlgorithmConfiguration, engine: &'a dyn RuleModelInduction) -> Self {
        Self { config, engine }
    }

    pub fn induce(
        &self,
        nominal_feature_mask: &NominalFeatureMask,
        feature_matrix: &FeatureMatrix,
        label_matrix: &LabelMatrix,
        model_builder: &mut dyn ModelBuilder,
    ) -> Result<(RuleModel, Predictions)> {
        if feature_matrix.num_examples() != label_matrix.num_examples() {
            return Err(LearnerError::Shape(format!(
                "feature matrix has {} examples, label matrix has {}",
                feature_matrix.num_examples(),
                label_matrix.num_examples()
            )));
        }

        log::debug!(
            "Invoking {} on {} examples, {} features and {} labels",
            self.engine.name(),
            feature_matrix.num_examples(),
            feature_matrix.num_features(),
            label_matrix.num_labels()
        );

        let (model, predictions) = self.engine.induce_rules(
            self.config,
            nominal_feature_mask,
            feature_matrix,
            label_matrix,
            self.config.seed,
            model_builder,
        )?;

        if predictions.ground_truth().len() != label_matrix.num_examples() {
            return Err(LearnerError::Shape(format!(
                "engine reported ground truth for {} examples, expected {}",
                predictions.ground_truth().len(),
                label_matrix.num_examples()
            )));
        }

        Ok((model, predictions))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::config::LearnerParameters;
    use crate::math::{prepare_feature_matrix, prepare_label_matrix, InputMatrix};
    use crate::models::rule_model::{Head, RuleListBuilder};
    use ndarray::array;

    struct CountingEngine {
        calls: Cell<usize>,
        fail: bool,
    }

    impl RuleModelInduction for CountingEngine {
        fn induce_rules(
            &self,
            _config: &AlgorithmConfiguration,
            _nominal_feature_mask: &NominalFeatureMask,
            _feature_matrix: &FeatureMatrix,
            label_matrix: &LabelMatrix,
            _seed: u32,
            model_builder: &mut dyn ModelBuilder,
        ) -> anyhow::Result<(RuleModel, Predictions)> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                anyhow::bail!("numerical failure in refinement");
            }
            model_builder.set_default_rule(Head::Full(vec![1.0]));
            Ok((
                model_builder.build(0),
                Predictions::new(vec![0; label_matrix.num_examples()]),
            ))
        }
    }

    fn matrices() -> (FeatureMatrix, LabelMatrix) {
        let x = InputMatrix::Dense(array![[0.0f32, 1.0], [2.0, 3.0]]);
        let y = InputMatrix::Dense(array![[1u32], [0]]);
        (
            prepare_feature_matrix(&x, Default::default()).unwrap(),
            prepare_label_matrix(&y).unwrap(),
        )
    }

    #[test]
    fn test_engine_is_invoked_once() {
        let config = LearnerParameters::default().build().unwrap();
        let engine = CountingEngine {
            calls: Cell::new(0),
            fail: false,
        };
        let (features, labels) = matrices();
        let before = features.clone();

        let (model, predictions) = InductionAdapter::new(&config, &engine)
            .induce(
                &NominalFeatureMask::NoneNominal,
                &features,
                &labels,
                &mut RuleListBuilder::new(),
            )
            .unwrap();

        assert_eq!(engine.calls.get(), 1);
        assert_eq!(model.num_rules(), 1);
        assert_eq!(predictions.ground_truth().len(), 2);
        assert_eq!(features, before);
    }

    #[test]
    fn test_engine_failure_is_passed_on() {
        let config = LearnerParameters::default().build().unwrap();
        let engine = CountingEngine {
            calls: Cell::new(0),
            fail: true,
        };
        let (features, labels) = matrices();

        let err = InductionAdapter::new(&config, &engine)
            .induce(
                &NominalFeatureMask::NoneNominal,
                &features,
                &labels,
                &mut RuleListBuilder::new(),
            )
            .unwrap_err();

        assert!(matches!(err, LearnerError::Engine(_)));
        assert_eq!(err.to_string(), "numerical failure in refinement");
        assert_eq!(engine.calls.get(), 1);
    }
}
