use rulelab_learners::config::{
    create_min_support, create_stopping_criteria, resolve_num_threads, FeatureSubSampling,
    LearnerParameters, StoppingCriterion,
};
use rulelab_learners::expression::{ConfigurationExpression, Literal};
use rulelab_learners::LearnerError;

use proptest::prelude::*;

const RANDOM: &str = "random-feature-selection";

// ---------------------------------------------------------------------------
// Configuration expressions
// ---------------------------------------------------------------------------

#[test]
fn test_parse_expression_with_arguments() {
    let expression = ConfigurationExpression::parse("random-feature-selection{\"sample_size\":0.5}", &[RANDOM])
        .unwrap()
        .unwrap();
    assert_eq!(expression.name, RANDOM);
    assert_eq!(expression.args.len(), 1);
    assert_eq!(expression.args.get("sample_size"), Some(&Literal::Float(0.5)));
}

#[test]
fn test_parse_expression_without_arguments() {
    let expression = ConfigurationExpression::parse(RANDOM, &[RANDOM]).unwrap().unwrap();
    assert_eq!(expression.name, RANDOM);
    assert!(expression.args.is_empty());
}

#[test]
fn test_parse_unknown_expression() {
    assert!(ConfigurationExpression::parse("unknown-strategy", &[RANDOM])
        .unwrap()
        .is_none());
}

#[test]
fn test_malformed_expression_is_a_parse_error() {
    let result = ConfigurationExpression::parse("random-feature-selection{'sample_size':", &[RANDOM]);
    assert!(matches!(result, Err(LearnerError::Parse { .. })));
}

// ---------------------------------------------------------------------------
// Algorithm configuration
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn prop_positive_max_rules_yields_one_size_criterion(max_rules in 1i64..1_000_000) {
        let criteria = create_stopping_criteria(max_rules, -1).unwrap();
        prop_assert_eq!(criteria, vec![StoppingCriterion::Size { max_rules: max_rules as u32 }]);
    }

    #[test]
    fn prop_invalid_max_rules_is_rejected(max_rules in -1_000_000i64..=0) {
        prop_assume!(max_rules != -1);
        let is_validation_error = matches!(
            create_stopping_criteria(max_rules, -1),
            Err(LearnerError::Validation { .. })
        );
        prop_assert!(is_validation_error);
    }
}

#[test]
fn test_disabled_stopping_criteria() {
    assert!(create_stopping_criteria(-1, -1).unwrap().is_empty());
    assert_eq!(
        create_stopping_criteria(10, 60).unwrap(),
        vec![
            StoppingCriterion::Size { max_rules: 10 },
            StoppingCriterion::Time { seconds: 60 }
        ]
    );
}

#[test]
fn test_min_support_domain() {
    match create_min_support(1.0) {
        Err(LearnerError::Validation { parameter, .. }) => assert_eq!(parameter, "min_support"),
        other => panic!("expected a validation error, got {:?}", other),
    }
    assert_eq!(create_min_support(0.05).unwrap(), 0.05);
}

#[test]
fn test_all_threads_resolve_to_available_cores() {
    assert_eq!(resolve_num_threads(-1, || 8).unwrap(), 8);
    assert_eq!(resolve_num_threads(3, || 8).unwrap(), 3);
    assert!(resolve_num_threads(0, || 8).is_err());
}

#[test]
fn test_parameters_from_json() {
    let params: LearnerParameters = serde_json::from_str(
        r#"{"max_rules": 10, "feature_sub_sampling": "random-feature-selection{'sample_size': 0.25}"}"#,
    )
    .unwrap();
    assert_eq!(params.min_support, LearnerParameters::default().min_support);

    let config = params.build().unwrap();
    assert_eq!(config.stopping_criteria, vec![StoppingCriterion::Size { max_rules: 10 }]);
    assert_eq!(
        config.feature_sub_sampling,
        FeatureSubSampling::RandomFeatureSelection { sample_size: 0.25 }
    );
}

#[test]
fn test_name_depends_on_sub_sampling_arguments() {
    let with_sample_size = |sample_size: f64| LearnerParameters {
        feature_sub_sampling: Some(format!("random-feature-selection{{'sample_size': {}}}", sample_size)),
        ..Default::default()
    };
    assert_ne!(with_sample_size(0.1).name(), with_sample_size(0.2).name());
}
