use serde::{Deserialize, Serialize};

use crate::config::LearnerParameters;
use crate::error::Result;
use crate::math::{
    prepare_feature_matrix, prepare_label_matrix, InputMatrix, NominalFeatureMask,
};
use crate::models::induction::{InductionAdapter, RuleModelInduction};
use crate::models::rule_model::{Predictions, RuleListBuilder, RuleModel};

/// A learner that can be fit to a training set.
pub trait Learner {
    /// Identity of the learner. Learners trained with different parameters
    /// have different names.
    fn name(&self) -> String;

    /// Checks the learner's parameters without fitting it.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// An unfit copy of the learner with the same parameters.
    fn fresh_copy(&self) -> Self
    where
        Self: Sized;

    fn fit(
        &mut self,
        x: &InputMatrix<f32>,
        y: &InputMatrix<u32>,
        engine: &dyn RuleModelInduction,
    ) -> Result<()>;

    /// The model learned by the last call to `fit`, if any.
    fn model(&self) -> Option<&RuleModel>;

    fn predictions(&self) -> Option<&Predictions>;

    /// Learners that distinguish nominal features expose that capability here.
    fn as_nominal_mut(&mut self) -> Option<&mut dyn NominalAttributeLearner> {
        None
    }
}

/// Capability of learners that treat some features as nominal.
pub trait NominalAttributeLearner {
    fn set_nominal_attribute_indices(&mut self, indices: Vec<u32>);

    fn nominal_attribute_indices(&self) -> Option<&[u32]>;
}

/// Learns a rule model through a pluggable induction engine.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RuleLearner {
    params: LearnerParameters,
    nominal_attribute_indices: Option<Vec<u32>>,
    model: Option<RuleModel>,
    predictions: Option<Predictions>,
}

impl RuleLearner {
    pub fn new(params: LearnerParameters) -> Self {
        Self {
            params,
            nominal_attribute_indices: None,
            model: None,
            predictions: None,
        }
    }

    pub fn params(&self) -> &LearnerParameters {
        &self.params
    }
}

impl Learner for RuleLearner {
    fn name(&self) -> String {
        self.params.name()
    }

    fn validate(&self) -> Result<()> {
        self.params.build().map(|_| ())
    }

    fn fresh_copy(&self) -> Self {
        let mut copy = RuleLearner::new(self.params.clone());
        copy.nominal_attribute_indices = self.nominal_attribute_indices.clone();
        copy
    }

    fn fit(
        &mut self,
        x: &InputMatrix<f32>,
        y: &InputMatrix<u32>,
        engine: &dyn RuleModelInduction,
    ) -> Result<()> {
        let config = self.params.build()?;
        let feature_matrix = prepare_feature_matrix(x, config.sparse_policy)?;
        let label_matrix = prepare_label_matrix(y)?;
        let nominal_feature_mask = NominalFeatureMask::new(
            self.nominal_attribute_indices.as_deref(),
            feature_matrix.num_features(),
        );

        let mut model_builder = RuleListBuilder::new();
        let (model, predictions) = InductionAdapter::new(&config, engine).induce(
            &nominal_feature_mask,
            &feature_matrix,
            &label_matrix,
            &mut model_builder,
        )?;

        self.model = Some(model);
        self.predictions = Some(predictions);
        Ok(())
    }

    fn model(&self) -> Option<&RuleModel> {
        self.model.as_ref()
    }

    fn predictions(&self) -> Option<&Predictions> {
        self.predictions.as_ref()
    }

    fn as_nominal_mut(&mut self) -> Option<&mut dyn NominalAttributeLearner> {
        Some(self)
    }
}

impl NominalAttributeLearner for RuleLearner {
    fn set_nominal_attribute_indices(&mut self, indices: Vec<u32>) {
        self.nominal_attribute_indices = Some(indices);
    }

    fn nominal_attribute_indices(&self) -> Option<&[u32]> {
        self.nominal_attribute_indices.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LearnerError;
    use crate::models::default_rule::DefaultRuleInduction;
    use ndarray::array;

    fn data() -> (InputMatrix<f32>, InputMatrix<u32>) {
        (
            InputMatrix::Dense(array![[0.0f32, 1.0], [1.0, 0.0]]),
            InputMatrix::Dense(array![[1u32], [1]]),
        )
    }

    #[test]
    fn test_fit_stores_model_and_predictions() {
        let (x, y) = data();
        let mut learner = RuleLearner::new(LearnerParameters::default());
        learner.fit(&x, &y, &DefaultRuleInduction).unwrap();
        assert_eq!(learner.model().unwrap().num_rules(), 1);
        assert_eq!(learner.predictions().unwrap().ground_truth(), &[1, 1]);
    }

    #[test]
    fn test_fresh_copy_is_unfit() {
        let (x, y) = data();
        let mut learner = RuleLearner::new(LearnerParameters::default());
        learner.as_nominal_mut().unwrap().set_nominal_attribute_indices(vec![1]);
        learner.fit(&x, &y, &DefaultRuleInduction).unwrap();

        let copy = learner.fresh_copy();
        assert!(copy.model().is_none());
        assert_eq!(copy.nominal_attribute_indices(), Some(&[1u32][..]));
        assert_eq!(copy.name(), learner.name());
    }

    #[test]
    fn test_invalid_parameters_fail_before_fitting() {
        let (x, y) = data();
        let mut learner = RuleLearner::new(LearnerParameters {
            min_support: 1.0,
            ..Default::default()
        });
        assert!(learner.validate().is_err());
        let err = learner.fit(&x, &y, &DefaultRuleInduction).unwrap_err();
        assert!(matches!(err, LearnerError::Validation { parameter, .. } if parameter == "min_support"));
        assert!(learner.model().is_none());
    }
}
