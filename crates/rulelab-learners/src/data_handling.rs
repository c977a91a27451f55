//! Data structures for multi-label datasets.
//!
//! This module defines `DataSet` and `MetaData` and the train/test splits
//! used for cross-validation.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{LearnerError, Result};
use crate::math::InputMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    Numeric,
    Nominal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub attribute_type: AttributeType,
    /// Names of the values of a nominal attribute, indexed by their encoding.
    pub nominal_values: Vec<String>,
}

impl Attribute {
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribute_type: AttributeType::Numeric,
            nominal_values: Vec::new(),
        }
    }

    pub fn nominal(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            attribute_type: AttributeType::Nominal,
            nominal_values: values,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaData {
    /// Feature attributes in column order.
    pub attributes: Vec<Attribute>,
    /// Label names in column order.
    pub labels: Vec<String>,
}

impl MetaData {
    /// Indices of all attributes of the given type.
    pub fn get_attribute_indices(&self, attribute_type: AttributeType) -> Vec<u32> {
        self.attributes
            .iter()
            .enumerate()
            .filter(|(_, a)| a.attribute_type == attribute_type)
            .map(|(i, _)| i as u32)
            .collect()
    }
}

/// One train/test partition of a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    /// Zero-based index of the fold.
    pub index: usize,
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct DataSet {
    pub x: InputMatrix<f32>,
    pub y: InputMatrix<u32>,
    pub meta_data: MetaData,
}

impl DataSet {
    pub fn new(x: InputMatrix<f32>, y: InputMatrix<u32>, meta_data: MetaData) -> Result<Self> {
        if x.nrows() != y.nrows() {
            return Err(LearnerError::Shape(format!(
                "{} feature rows but {} label rows",
                x.nrows(),
                y.nrows()
            )));
        }
        if !meta_data.attributes.is_empty() && meta_data.attributes.len() != x.ncols() {
            return Err(LearnerError::Shape(format!(
                "{} attributes given for {} features",
                meta_data.attributes.len(),
                x.ncols()
            )));
        }
        Ok(Self { x, y, meta_data })
    }

    pub fn num_examples(&self) -> usize {
        self.x.nrows()
    }

    pub fn log_summary(&self) {
        log::info!(
            "Dataset with {} examples, {} features ({} nominal) and {} labels",
            self.num_examples(),
            self.x.ncols(),
            self.meta_data.get_attribute_indices(AttributeType::Nominal).len(),
            self.y.ncols()
        );
    }

    /// Creates the train/test splits for cross-validation.
    ///
    /// A single fold trains and tests on every example. Otherwise the examples
    /// are shuffled with the given seed and split into `num_folds` test sets of
    /// near-equal size.
    pub fn folds(&self, num_folds: usize, seed: u64) -> Result<Vec<Fold>> {
        let n = self.num_examples();

        if num_folds == 0 || (num_folds > 1 && num_folds > n) {
            return Err(LearnerError::validation("folds", num_folds));
        }

        if num_folds == 1 {
            let all: Vec<usize> = (0..n).collect();
            return Ok(vec![Fold {
                index: 0,
                train: all.clone(),
                test: all,
            }]);
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let base = n / num_folds;
        let remainder = n % num_folds;
        let mut start = 0;

        let folds = (0..num_folds)
            .map(|index| {
                let size = base + usize::from(index < remainder);
                let mut test = indices[start..start + size].to_vec();
                let mut train: Vec<usize> = indices[..start]
                    .iter()
                    .chain(indices[start + size..].iter())
                    .copied()
                    .collect();
                start += size;
                test.sort_unstable();
                train.sort_unstable();
                Fold { index, train, test }
            })
            .collect();

        Ok(folds)
    }

    /// Features and labels of the given examples.
    pub fn subset(&self, indices: &[usize]) -> (InputMatrix<f32>, InputMatrix<u32>) {
        (self.x.select_rows(indices), self.y.select_rows(indices))
    }
}
