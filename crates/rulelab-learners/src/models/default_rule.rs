//! A minimal induction engine that only learns the default rule.
use rayon::prelude::*;

use crate::config::AlgorithmConfiguration;
use crate::math::{FeatureMatrix, LabelMatrix, NominalFeatureMask};
use crate::models::induction::RuleModelInduction;
use crate::models::rule_model::{Head, ModelBuilder, Predictions, RuleModel};

/// Predicts the rounded mean of every label for all examples.
///
/// Ground truth and predictions are reported per example as the sum over all
/// labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRuleInduction;

impl RuleModelInduction for DefaultRuleInduction {
    fn induce_rules(
        &self,
        config: &AlgorithmConfiguration,
        _nominal_feature_mask: &NominalFeatureMask,
        feature_matrix: &FeatureMatrix,
        label_matrix: &LabelMatrix,
        seed: u32,
        model_builder: &mut dyn ModelBuilder,
    ) -> anyhow::Result<(RuleModel, Predictions)> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.num_threads_refinement)
            .build()?;

        log::trace!(
            "Learning default rule for {} examples ({} features) with seed {} on {} threads",
            feature_matrix.num_examples(),
            feature_matrix.num_features(),
            seed,
            config.num_threads_refinement
        );

        let values = label_matrix.values();
        let num_examples = label_matrix.num_examples();
        let scores: Vec<f64> = pool.install(|| {
            (0..label_matrix.num_labels())
                .into_par_iter()
                .map(|label| {
                    let sum: u64 = values.column(label).iter().map(|&v| v as u64).sum();
                    if num_examples == 0 {
                        0.0
                    } else {
                        (sum as f64 / num_examples as f64).round()
                    }
                })
                .collect()
        });

        let prediction = scores.iter().map(|&s| s as u32).fold(0u32, u32::saturating_add);
        model_builder.set_default_rule(Head::Full(scores));
        let model = model_builder.build(0);

        let ground_truth = values
            .rows()
            .into_iter()
            .map(|row| row.iter().copied().fold(0u32, u32::saturating_add))
            .collect();
        let mut predictions = Predictions::new(ground_truth);
        predictions.push_iteration(vec![prediction; num_examples])?;

        Ok((model, predictions))
    }

    fn name(&self) -> &str {
        "default-rule-induction"
    }
}
