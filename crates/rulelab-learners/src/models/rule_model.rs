use serde::{Deserialize, Serialize};

use crate::error::{LearnerError, Result};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Leq,
    Gr,
    Eq,
    Neq,
}

impl Comparator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Leq => "<=",
            Comparator::Gr => ">",
            Comparator::Eq => "==",
            Comparator::Neq => "!=",
        }
    }
}

/// A single condition of a rule's body.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Condition {
    pub feature_index: u32,
    pub comparator: Comparator,
    pub threshold: f32,
}

/// The prediction of a rule.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum Head {
    /// One score per label.
    Full(Vec<f64>),
    /// Scores for a subset of the labels.
    Partial { label_indices: Vec<u32>, scores: Vec<f64> },
}

impl Head {
    /// `(label index, score)` pairs predicted by the head.
    pub fn entries(&self) -> Vec<(u32, f64)> {
        match self {
            Head::Full(scores) => scores
                .iter()
                .enumerate()
                .map(|(i, &s)| (i as u32, s))
                .collect(),
            Head::Partial {
                label_indices,
                scores,
            } => label_indices.iter().copied().zip(scores.iter().copied()).collect(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Rule {
    pub body: Vec<Condition>,
    pub head: Head,
}

impl Rule {
    pub fn is_default(&self) -> bool {
        self.body.is_empty()
    }
}

/// An ordered list of rules, the first of which may be a default rule.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct RuleModel {
    rules: Vec<Rule>,
    /// Number of rules to use for prediction, 0 meaning all.
    num_used_rules: usize,
}

impl RuleModel {
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn num_rules(&self) -> usize {
        self.rules.len()
    }

    pub fn num_used_rules(&self) -> usize {
        if self.num_used_rules == 0 {
            self.rules.len()
        } else {
            self.num_used_rules.min(self.rules.len())
        }
    }

    /// The rules that are used for prediction.
    pub fn used_rules(&self) -> &[Rule] {
        &self.rules[..self.num_used_rules()]
    }
}

/// Assembles a [`RuleModel`] while the engine induces rules.
pub trait ModelBuilder {
    fn set_default_rule(&mut self, head: Head);

    fn add_rule(&mut self, body: Vec<Condition>, head: Head);

    /// Finishes the model. `num_used_rules` of 0 uses all rules.
    fn build(&mut self, num_used_rules: usize) -> RuleModel;
}

/// Builds a rule list: the default rule (if any) followed by the other rules in
/// the order they were added.
#[derive(Debug, Default)]
pub struct RuleListBuilder {
    default_rule: Option<Rule>,
    rules: Vec<Rule>,
}

impl RuleListBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModelBuilder for RuleListBuilder {
    fn set_default_rule(&mut self, head: Head) {
        self.default_rule = Some(Rule {
            body: Vec::new(),
            head,
        });
    }

    fn add_rule(&mut self, body: Vec<Condition>, head: Head) {
        self.rules.push(Rule { body, head });
    }

    fn build(&mut self, num_used_rules: usize) -> RuleModel {
        let mut rules = Vec::with_capacity(self.rules.len() + 1);
        rules.extend(self.default_rule.take());
        rules.append(&mut self.rules);
        RuleModel {
            rules,
            num_used_rules,
        }
    }
}

/// Ground truth of the training examples and the predictions made after each
/// induced rule. Every prediction vector is aligned with the ground truth.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(try_from = "RawPredictions")]
pub struct Predictions {
    ground_truth: Vec<u32>,
    iterations: Vec<Vec<u32>>,
}

/// Unchecked form of [`Predictions`] read from a cache file.
#[derive(Deserialize)]
struct RawPredictions {
    ground_truth: Vec<u32>,
    iterations: Vec<Vec<u32>>,
}

impl TryFrom<RawPredictions> for Predictions {
    type Error = LearnerError;

    fn try_from(raw: RawPredictions) -> Result<Self> {
        let mut predictions = Predictions::new(raw.ground_truth);
        for iteration in raw.iterations {
            predictions.push_iteration(iteration)?;
        }
        Ok(predictions)
    }
}

impl Predictions {
    pub fn new(ground_truth: Vec<u32>) -> Self {
        Self {
            ground_truth,
            iterations: Vec::new(),
        }
    }

    /// Appends the snapshot taken after one more rule was induced.
    pub fn push_iteration(&mut self, predictions: Vec<u32>) -> Result<()> {
        if predictions.len() != self.ground_truth.len() {
            return Err(LearnerError::Shape(format!(
                "expected {} predictions, got {}",
                self.ground_truth.len(),
                predictions.len()
            )));
        }
        self.iterations.push(predictions);
        Ok(())
    }

    pub fn ground_truth(&self) -> &[u32] {
        &self.ground_truth
    }

    pub fn iterations(&self) -> &[Vec<u32>] {
        &self.iterations
    }

    pub fn num_iterations(&self) -> usize {
        self.iterations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_list_builder_puts_default_rule_first() {
        let mut builder = RuleListBuilder::new();
        builder.add_rule(
            vec![Condition {
                feature_index: 0,
                comparator: Comparator::Leq,
                threshold: 1.5,
            }],
            Head::Partial {
                label_indices: vec![1],
                scores: vec![2.0],
            },
        );
        builder.set_default_rule(Head::Full(vec![0.0, 1.0]));

        let model = builder.build(0);
        assert_eq!(model.num_rules(), 2);
        assert!(model.rules()[0].is_default());
        assert_eq!(model.used_rules().len(), 2);
    }

    #[test]
    fn test_num_used_rules_is_capped() {
        let mut builder = RuleListBuilder::new();
        builder.set_default_rule(Head::Full(vec![1.0]));
        let model = builder.build(5);
        assert_eq!(model.num_used_rules(), 1);
    }

    #[test]
    fn test_predictions_must_be_aligned() {
        let mut predictions = Predictions::new(vec![1, 0, 2]);
        predictions.push_iteration(vec![1, 1, 1]).unwrap();
        assert!(predictions.push_iteration(vec![1]).is_err());
        assert_eq!(predictions.num_iterations(), 1);
    }

    #[test]
    fn test_misaligned_predictions_are_not_deserialized() {
        let result = serde_json::from_str::<Predictions>(r#"{"ground_truth":[1,2],"iterations":[[1]]}"#);
        assert!(result.is_err());

        let predictions: Predictions =
            serde_json::from_str(r#"{"ground_truth":[1,2],"iterations":[[1,0],[2,2]]}"#).unwrap();
        assert_eq!(predictions.num_iterations(), 2);
    }
}
