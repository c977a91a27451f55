use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{LearnerError, Result};
use crate::expression::ConfigurationExpression;

pub const FEATURE_SUB_SAMPLING_RANDOM: &str = "random-feature-selection";

pub const ARGUMENT_SAMPLE_SIZE: &str = "sample_size";

/// Sentinel that disables a count or duration based parameter.
pub const DISABLED: i64 = -1;

/// Whether matrices should be stored in a sparse or dense layout.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SparsePolicy {
    #[default]
    Auto,
    ForceSparse,
    ForceDense,
}

impl FromStr for SparsePolicy {
    type Err = LearnerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(SparsePolicy::Auto),
            "sparse" | "force-sparse" => Ok(SparsePolicy::ForceSparse),
            "dense" | "force-dense" => Ok(SparsePolicy::ForceDense),
            _ => Err(LearnerError::validation(
                "feature_format",
                format!("'{}'. Must be one of [auto, sparse, dense]", s),
            )),
        }
    }
}

/// Compressed sparse layouts a matrix can be converted into.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SparseFormat {
    Csc,
    Csr,
}

impl fmt::Display for SparseFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SparseFormat::Csc => write!(f, "csc"),
            SparseFormat::Csr => write!(f, "csr"),
        }
    }
}

/// Criteria that halt the induction of further rules. The engine stops as soon
/// as any of them is satisfied.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoppingCriterion {
    Size { max_rules: u32 },
    Time { seconds: u64 },
}

/// Strategy for sub-sampling the features each time a rule is refined.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Default)]
pub enum FeatureSubSampling {
    #[default]
    None,
    RandomFeatureSelection { sample_size: f32 },
}

/// Raw learner parameters as they come from the command line or a config file.
///
/// Nothing is validated here; `build` turns the parameters into an
/// [`AlgorithmConfiguration`].
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LearnerParameters {
    /// Prepended to the learner name, typically the dataset.
    pub name_prefix: Option<String>,
    pub random_state: i64,
    pub feature_format: String,
    pub max_rules: i64,
    pub time_limit: i64,
    pub feature_sub_sampling: Option<String>,
    pub min_support: f32,
    pub max_conditions: i64,
    pub num_threads_refinement: i64,
}

impl Default for LearnerParameters {
    fn default() -> Self {
        Self {
            name_prefix: None,
            random_state: 1,
            feature_format: "auto".to_string(),
            max_rules: 50,
            time_limit: DISABLED,
            feature_sub_sampling: None,
            min_support: 0.0001,
            max_conditions: DISABLED,
            num_threads_refinement: 1,
        }
    }
}

/// Validated, immutable configuration of the rule induction algorithm.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AlgorithmConfiguration {
    pub seed: u32,
    pub sparse_policy: SparsePolicy,
    pub stopping_criteria: Vec<StoppingCriterion>,
    pub min_support: f32,
    /// `None` if the number of conditions is unrestricted.
    pub max_conditions: Option<u32>,
    pub feature_sub_sampling: FeatureSubSampling,
    pub num_threads_refinement: usize,
}

impl LearnerParameters {
    /// Validates every parameter and builds the algorithm configuration. The
    /// first offending parameter is reported.
    pub fn build(&self) -> Result<AlgorithmConfiguration> {
        Ok(AlgorithmConfiguration {
            seed: create_seed(self.random_state)?,
            sparse_policy: SparsePolicy::from_str(&self.feature_format)?,
            stopping_criteria: create_stopping_criteria(self.max_rules, self.time_limit)?,
            min_support: create_min_support(self.min_support)?,
            max_conditions: create_max_conditions(self.max_conditions)?,
            feature_sub_sampling: create_feature_sub_sampling(
                self.feature_sub_sampling.as_deref(),
            )?,
            num_threads_refinement: get_preferred_num_threads(self.num_threads_refinement)?,
        })
    }

    /// Identity of a learner trained with these parameters.
    ///
    /// Every parameter that influences the learned model is part of the name, so
    /// cached models trained with different parameters never collide.
    pub fn name(&self) -> String {
        let mut parts = Vec::new();

        if let Some(prefix) = &self.name_prefix {
            parts.push(sanitize(prefix));
        }

        parts.push(format!("max-rules={}", self.max_rules));
        parts.push(format!("time-limit={}", self.time_limit));
        let sub_sampling = match self.feature_sub_sampling.as_deref() {
            Some(value) if !is_none(value) => canonical_sub_sampling(value),
            _ => "none".to_string(),
        };
        parts.push(format!("feature-sub-sampling={}", sub_sampling));
        parts.push(format!("min-support={}", self.min_support));
        parts.push(format!("max-conditions={}", self.max_conditions));
        parts.push(format!("num-threads={}", self.num_threads_refinement));
        parts.push(format!("random-state={}", self.random_state));
        parts.join("_")
    }
}

fn is_none(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("none")
}

fn canonical_sub_sampling(value: &str) -> String {
    match ConfigurationExpression::parse(value, &[FEATURE_SUB_SAMPLING_RANDOM]) {
        Ok(Some(expression)) => sanitize(&expression.canonical()),
        _ => sanitize(value),
    }
}

fn sanitize(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '=' | ',' | '(' | ')'))
        .collect()
}

pub fn create_seed(random_state: i64) -> Result<u32> {
    if random_state < 1 || random_state > u32::MAX as i64 {
        return Err(LearnerError::validation("random_state", random_state));
    }

    Ok(random_state as u32)
}

/// Builds the ordered list of stopping criteria: size first, then time. `-1`
/// disables a criterion.
pub fn create_stopping_criteria(max_rules: i64, time_limit: i64) -> Result<Vec<StoppingCriterion>> {
    let mut stopping_criteria = Vec::new();

    if max_rules != DISABLED {
        if max_rules > 0 && max_rules <= u32::MAX as i64 {
            stopping_criteria.push(StoppingCriterion::Size {
                max_rules: max_rules as u32,
            });
        } else {
            return Err(LearnerError::validation("max_rules", max_rules));
        }
    }

    if time_limit != DISABLED {
        if time_limit > 0 {
            stopping_criteria.push(StoppingCriterion::Time {
                seconds: time_limit as u64,
            });
        } else {
            return Err(LearnerError::validation("time_limit", time_limit));
        }
    }

    Ok(stopping_criteria)
}

pub fn create_min_support(min_support: f32) -> Result<f32> {
    if !(0.0..1.0).contains(&min_support) {
        return Err(LearnerError::validation("min_support", min_support));
    }

    Ok(min_support)
}

pub fn create_max_conditions(max_conditions: i64) -> Result<Option<u32>> {
    match max_conditions {
        DISABLED => Ok(None),
        n if n >= 1 && n <= u32::MAX as i64 => Ok(Some(n as u32)),
        n => Err(LearnerError::validation("max_conditions", n)),
    }
}

/// Resolves the number of refinement threads, `-1` meaning all logical cores.
pub fn get_preferred_num_threads(num_threads: i64) -> Result<usize> {
    resolve_num_threads(num_threads, || {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    })
}

pub fn resolve_num_threads<F>(num_threads: i64, available: F) -> Result<usize>
where
    F: FnOnce() -> usize,
{
    if num_threads == DISABLED {
        return Ok(available());
    }
    if num_threads < 1 {
        return Err(LearnerError::validation("num_threads_refinement", num_threads));
    }

    Ok(num_threads as usize)
}

pub fn create_feature_sub_sampling(feature_sub_sampling: Option<&str>) -> Result<FeatureSubSampling> {
    let value = match feature_sub_sampling {
        None => return Ok(FeatureSubSampling::None),
        Some(value) if is_none(value) => return Ok(FeatureSubSampling::None),
        Some(value) => value,
    };

    match ConfigurationExpression::parse(value, &[FEATURE_SUB_SAMPLING_RANDOM])? {
        Some(expression) if expression.name == FEATURE_SUB_SAMPLING_RANDOM => {
            let sample_size = expression.get_float(
                ARGUMENT_SAMPLE_SIZE,
                0.0,
                Some(&|x| (0.0..1.0).contains(&x)),
            )?;
            Ok(FeatureSubSampling::RandomFeatureSelection {
                sample_size: sample_size as f32,
            })
        }
        _ => Err(LearnerError::validation("feature_sub_sampling", value)),
    }
}
