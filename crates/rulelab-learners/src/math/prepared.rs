//! Feature and label matrices in the layouts the induction engine consumes.
use std::collections::BTreeSet;

use ndarray::{Array2, ShapeBuilder};

use crate::config::{SparseFormat, SparsePolicy};
use crate::error::{LearnerError, Result};
use crate::math::format::prefer_sparse;
use crate::math::matrix::{CompressedMatrix, Element, InputMatrix};

/// A matrix ready to be handed to the engine: dense in column-major
/// (Fortran) order, or compressed sparse.
#[derive(Clone, Debug, PartialEq)]
pub enum PreparedMatrix {
    Dense(Array2<f32>),
    Csc(CompressedMatrix<f32>),
    Csr(CompressedMatrix<f32>),
}

/// Feature matrices are always prepared with a CSC target.
pub type FeatureMatrix = PreparedMatrix;

impl PreparedMatrix {
    pub fn shape(&self) -> (usize, usize) {
        match self {
            PreparedMatrix::Dense(m) => m.dim(),
            PreparedMatrix::Csc(m) | PreparedMatrix::Csr(m) => m.shape(),
        }
    }

    pub fn num_examples(&self) -> usize {
        self.shape().0
    }

    pub fn num_features(&self) -> usize {
        self.shape().1
    }

    pub fn is_sparse(&self) -> bool {
        !matches!(self, PreparedMatrix::Dense(_))
    }

    /// Values of a single feature column, zeros included.
    pub fn column(&self, col: usize) -> Vec<f32> {
        match self {
            PreparedMatrix::Dense(m) => m.column(col).to_vec(),
            PreparedMatrix::Csc(m) => {
                let mut values = vec![0.0; m.shape().0];
                let (rows, data) = m.lane(col);
                for (&row, &v) in rows.iter().zip(data.iter()) {
                    values[row as usize] = v;
                }
                values
            }
            PreparedMatrix::Csr(m) => (0..m.shape().0)
                .map(|row| {
                    let (cols, data) = m.lane(row);
                    cols.iter()
                        .position(|&c| c as usize == col)
                        .map(|i| data[i])
                        .unwrap_or(0.0)
                })
                .collect(),
        }
    }
}

/// Dense label matrix in row-major order with one row per example.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelMatrix {
    values: Array2<u32>,
}

impl LabelMatrix {
    pub fn new(values: Array2<u32>) -> Self {
        Self {
            values: values.as_standard_layout().into_owned(),
        }
    }

    pub fn values(&self) -> &Array2<u32> {
        &self.values
    }

    pub fn num_examples(&self) -> usize {
        self.values.nrows()
    }

    pub fn num_labels(&self) -> usize {
        self.values.ncols()
    }
}

fn check_index_width(shape: (usize, usize)) -> Result<()> {
    if shape.0 > u32::MAX as usize || shape.1 > u32::MAX as usize {
        return Err(LearnerError::Shape(format!(
            "matrix of shape {:?} exceeds the 32-bit index range",
            shape
        )));
    }
    Ok(())
}

/// Converts a matrix into the preferred layout according to `prefer_sparse`.
/// NaN values are kept, infinite values are rejected.
pub fn prepare_matrix(
    m: &InputMatrix<f32>,
    format: SparseFormat,
    policy: SparsePolicy,
) -> Result<PreparedMatrix> {
    check_index_width(m.shape())?;

    if m.triplets().iter().any(|(_, _, v)| v.is_infinite()) {
        return Err(LearnerError::validation("x", "matrix contains infinite values"));
    }

    let sparse = prefer_sparse(m, format, policy, std::mem::size_of::<f32>(), true)?;
    log::debug!(
        "Using {} representation for {} of shape {:?}",
        if sparse { format.to_string() } else { "dense".to_string() },
        m.type_name(),
        m.shape()
    );

    if !sparse {
        return Ok(PreparedMatrix::Dense(to_fortran_order(&m.to_dense())));
    }

    Ok(match format {
        SparseFormat::Csc => PreparedMatrix::Csc(m.to_compressed(SparseFormat::Csc)),
        SparseFormat::Csr => PreparedMatrix::Csr(m.to_compressed(SparseFormat::Csr)),
    })
}

pub fn prepare_feature_matrix(x: &InputMatrix<f32>, policy: SparsePolicy) -> Result<FeatureMatrix> {
    prepare_matrix(x, SparseFormat::Csc, policy)
}

pub fn prepare_label_matrix(y: &InputMatrix<u32>) -> Result<LabelMatrix> {
    check_index_width(y.shape())?;
    Ok(LabelMatrix::new(y.to_dense()))
}

fn to_fortran_order<T: Element>(m: &Array2<T>) -> Array2<T> {
    let mut fortran = Array2::from_elem(m.dim().f(), T::default());
    fortran.assign(m);
    fortran
}

/// Tells the engine which features are nominal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NominalFeatureMask {
    AllNominal,
    NoneNominal,
    Explicit(BTreeSet<u32>),
}

impl NominalFeatureMask {
    pub fn new(nominal_indices: Option<&[u32]>, num_features: usize) -> Self {
        let indices: BTreeSet<u32> = nominal_indices.unwrap_or(&[]).iter().copied().collect();

        if indices.is_empty() {
            NominalFeatureMask::NoneNominal
        } else if indices.len() == num_features {
            NominalFeatureMask::AllNominal
        } else {
            NominalFeatureMask::Explicit(indices)
        }
    }

    pub fn is_nominal(&self, feature_index: u32) -> bool {
        match self {
            NominalFeatureMask::AllNominal => true,
            NominalFeatureMask::NoneNominal => false,
            NominalFeatureMask::Explicit(indices) => indices.contains(&feature_index),
        }
    }
}
