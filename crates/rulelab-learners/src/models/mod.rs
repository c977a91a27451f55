pub mod default_rule;
pub mod formatter;
pub mod induction;
pub mod learner;
pub mod rule_model;

pub use default_rule::DefaultRuleInduction;
pub use formatter::{PrintOptions, RuleModelFormatter};
pub use induction::{InductionAdapter, RuleModelInduction};
pub use learner::{Learner, NominalAttributeLearner, RuleLearner};
pub use rule_model::{
    Comparator, Condition, Head, ModelBuilder, Predictions, Rule, RuleListBuilder, RuleModel,
};
