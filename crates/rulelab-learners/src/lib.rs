//! rulelab-learners: configuration and experiment orchestration for
//! multi-label rule learners.
//!
//! The crate turns raw learner parameters into a validated algorithm
//! configuration, prepares feature and label matrices in the layout that
//! uses the least memory, drives a pluggable rule induction engine and runs
//! cross-validation experiments with model caching and report output.
//!
//! The search algorithm itself is not part of this crate. Engines implement
//! [`models::RuleModelInduction`]; [`models::DefaultRuleInduction`] is a
//! minimal engine that only learns a default rule.
pub mod config;
pub mod data_handling;
pub mod error;
pub mod experiment;
pub mod expression;
pub mod io;
pub mod math;
pub mod models;
pub mod persistence;
pub mod report;

pub use error::{LearnerError, Result};
