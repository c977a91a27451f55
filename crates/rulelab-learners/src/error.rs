//! Error types shared by every module of the crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LearnerError {
    /// A configuration parameter violates its domain.
    #[error("Invalid value given for parameter '{parameter}': {value}")]
    Validation { parameter: String, value: String },

    /// A configuration expression is not a valid literal mapping.
    #[error("Failed to parse configuration expression '{expression}': {reason}")]
    Parse { expression: String, reason: String },

    /// A matrix cannot be converted into the requested layout.
    #[error("Matrix of type {matrix_type} cannot be converted to format '{format}'")]
    Format { matrix_type: String, format: String },

    /// Failure reported by the induction engine, passed on unchanged.
    #[error(transparent)]
    Engine(#[from] anyhow::Error),

    #[error("Mandatory parameter '{0}' has not been specified")]
    MissingParameter(String),

    #[error("Shape mismatch: {0}")]
    Shape(String),

    #[error("Learner has not been fit yet")]
    MissingModel,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl LearnerError {
    pub fn validation(parameter: impl Into<String>, value: impl ToString) -> Self {
        LearnerError::Validation {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LearnerError>;
