//! Decides whether a matrix is better kept dense or converted into a sparse
//! layout.
use crate::config::{SparseFormat, SparsePolicy};
use crate::error::{LearnerError, Result};
use crate::math::matrix::{Element, InputMatrix};

/// Width in bytes of the row/column indices of sparse matrices (`u32`).
pub const INDEX_SIZE: usize = std::mem::size_of::<u32>();

/// Estimated memory footprint of a matrix in a compressed sparse layout.
pub fn sparse_size(
    num_non_zero: usize,
    num_pointers: usize,
    value_size: usize,
    sparse_values: bool,
) -> usize {
    let value_size = if sparse_values { value_size } else { 0 };
    num_non_zero * value_size + num_non_zero * INDEX_SIZE + num_pointers * INDEX_SIZE
}

/// Estimated memory footprint of a matrix in a dense layout.
pub fn dense_size(num_rows: usize, num_cols: usize, value_size: usize) -> usize {
    num_rows * num_cols * value_size
}

/// Returns whether the matrix should be stored in the given sparse `format`.
///
/// * Dense input stays dense unless the policy forces a sparse layout.
/// * CSR input with a CSR target, or CSC input with a CSC target, stays sparse
///   unless the policy forces a dense layout.
/// * LIL, COO and DOK input is converted if the policy forces it. Under the
///   `Auto` policy it is converted if the sparse layout is expected to use less
///   memory than a dense one.
///
/// Any other combination cannot be converted and yields a `Format` error.
///
/// # Arguments
///
/// * `value_size` - Width in bytes of a stored value
/// * `sparse_values` - Whether the values must be stored explicitly in the sparse
///   layout (as opposed to binary matrices where only the indices are kept)
pub fn prefer_sparse<T: Element>(
    m: &InputMatrix<T>,
    format: SparseFormat,
    policy: SparsePolicy,
    value_size: usize,
    sparse_values: bool,
) -> Result<bool> {
    match (m, format) {
        (InputMatrix::Dense(_), _) => Ok(policy == SparsePolicy::ForceSparse),
        (InputMatrix::Csr(_), SparseFormat::Csr) | (InputMatrix::Csc(_), SparseFormat::Csc) => {
            Ok(policy != SparsePolicy::ForceDense)
        }
        (InputMatrix::Lil(_), _) | (InputMatrix::Coo(_), _) | (InputMatrix::Dok(_), _) => {
            match policy {
                SparsePolicy::Auto => {
                    let (num_rows, num_cols) = m.shape();
                    let num_pointers = match format {
                        SparseFormat::Csc => num_cols,
                        SparseFormat::Csr => num_rows,
                    };
                    let size_sparse = sparse_size(m.nnz(), num_pointers, value_size, sparse_values);
                    let size_dense = dense_size(num_rows, num_cols, value_size);
                    log::trace!(
                        "Estimated size of {} as {}: {} bytes, as dense matrix: {} bytes",
                        m.type_name(),
                        format,
                        size_sparse,
                        size_dense
                    );
                    Ok(size_sparse < size_dense)
                }
                SparsePolicy::ForceSparse => Ok(true),
                SparsePolicy::ForceDense => Ok(false),
            }
        }
        _ => Err(LearnerError::Format {
            matrix_type: m.type_name().to_string(),
            format: format.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::matrix::DokMatrix;
    use ndarray::Array2;
    use proptest::prelude::*;

    const F32: usize = std::mem::size_of::<f32>();

    fn coo_1000x1000_with_500_entries() -> InputMatrix<f32> {
        let rows: Vec<u32> = (0..500).collect();
        let cols: Vec<u32> = (0..500).map(|i| (i * 2) % 1000).collect();
        InputMatrix::coo((1000, 1000), rows, cols, vec![1.0; 500]).unwrap()
    }

    #[test]
    fn test_coo_auto_prefers_sparse() {
        let m = coo_1000x1000_with_500_entries();
        assert_eq!(sparse_size(500, 1000, F32, true), 8000);
        assert_eq!(dense_size(1000, 1000, F32), 4_000_000);
        assert!(prefer_sparse(&m, SparseFormat::Csc, SparsePolicy::Auto, F32, true).unwrap());
    }

    #[test]
    fn test_dense_input() {
        let m = InputMatrix::Dense(Array2::<f32>::zeros((3, 3)));
        assert!(!prefer_sparse(&m, SparseFormat::Csc, SparsePolicy::Auto, F32, true).unwrap());
        assert!(!prefer_sparse(&m, SparseFormat::Csc, SparsePolicy::ForceDense, F32, true).unwrap());
        assert!(prefer_sparse(&m, SparseFormat::Csc, SparsePolicy::ForceSparse, F32, true).unwrap());
    }

    #[test]
    fn test_matching_compressed_input() {
        let csc = InputMatrix::csc((2, 2), vec![1.0f32], vec![0], vec![0, 1, 1]).unwrap();
        assert!(prefer_sparse(&csc, SparseFormat::Csc, SparsePolicy::Auto, F32, true).unwrap());
        assert!(!prefer_sparse(&csc, SparseFormat::Csc, SparsePolicy::ForceDense, F32, true).unwrap());
    }

    #[test]
    fn test_mismatching_compressed_input_is_a_format_error() {
        let csr = InputMatrix::csr((2, 2), vec![1.0f32], vec![0], vec![0, 1, 1]).unwrap();
        for policy in [SparsePolicy::Auto, SparsePolicy::ForceDense, SparsePolicy::ForceSparse] {
            match prefer_sparse(&csr, SparseFormat::Csc, policy, F32, true) {
                Err(LearnerError::Format { matrix_type, format }) => {
                    assert_eq!(matrix_type, "CsrMatrix");
                    assert_eq!(format, "csc");
                }
                other => panic!("expected a format error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_dense_enough_dok_stays_dense() {
        let mut dok = DokMatrix::new(2, 2);
        for (r, c) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            dok.insert(r, c, 1.0f32).unwrap();
        }
        let m = InputMatrix::from(dok);
        // 4 * 4 + 4 * 4 + 2 * 4 = 40 bytes sparse vs. 16 bytes dense
        assert!(!prefer_sparse(&m, SparseFormat::Csc, SparsePolicy::Auto, F32, true).unwrap());
        assert!(prefer_sparse(&m, SparseFormat::Csc, SparsePolicy::ForceSparse, F32, true).unwrap());
    }

    proptest! {
        #[test]
        fn prop_selection_is_deterministic(
            entries in proptest::collection::vec((0u32..20, 0u32..20), 0..100),
            csc in any::<bool>(),
            policy in 0usize..3,
        ) {
            let (rows, cols): (Vec<u32>, Vec<u32>) = entries.into_iter().unzip();
            let values = vec![1.0f32; rows.len()];
            let m = InputMatrix::coo((20, 20), rows, cols, values).unwrap();
            let format = if csc { SparseFormat::Csc } else { SparseFormat::Csr };
            let policy = [SparsePolicy::Auto, SparsePolicy::ForceSparse, SparsePolicy::ForceDense][policy];

            let first = prefer_sparse(&m, format, policy, F32, true).unwrap();
            let second = prefer_sparse(&m.clone(), format, policy, F32, true).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
