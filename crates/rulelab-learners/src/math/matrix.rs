use std::collections::BTreeMap;
use std::fmt;
use std::ops::AddAssign;

use ndarray::{Array2, Axis};

use crate::config::SparseFormat;
use crate::error::{LearnerError, Result};

/// Values that can be stored in the matrices of this module.
pub trait Element: Copy + Default + PartialEq + AddAssign + fmt::Debug + Send + Sync + 'static {}

impl<T> Element for T where T: Copy + Default + PartialEq + AddAssign + fmt::Debug + Send + Sync + 'static {}

/// A compressed sparse matrix. Whether the pointers run over rows (CSR) or
/// columns (CSC) depends on the [`InputMatrix`] variant it is wrapped in.
#[derive(Clone, Debug, PartialEq)]
pub struct CompressedMatrix<T> {
    shape: (usize, usize),
    data: Vec<T>,
    indices: Vec<u32>,
    indptr: Vec<u32>,
}

impl<T> CompressedMatrix<T> {
    fn new(
        shape: (usize, usize),
        major_len: usize,
        minor_len: usize,
        data: Vec<T>,
        indices: Vec<u32>,
        indptr: Vec<u32>,
    ) -> Result<Self> {
        if indptr.len() != major_len + 1 {
            return Err(LearnerError::Shape(format!(
                "expected {} pointers, got {}",
                major_len + 1,
                indptr.len()
            )));
        }
        if data.len() != indices.len() || indptr.last().map(|&p| p as usize) != Some(data.len()) {
            return Err(LearnerError::Shape(format!(
                "{} values, {} indices and a final pointer of {:?} do not match",
                data.len(),
                indices.len(),
                indptr.last()
            )));
        }
        if indptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(LearnerError::Shape("pointers must be non-decreasing".to_string()));
        }
        if indices.iter().any(|&i| i as usize >= minor_len) {
            return Err(LearnerError::Shape(format!(
                "index out of bounds for dimension of length {}",
                minor_len
            )));
        }

        Ok(Self {
            shape,
            data,
            indices,
            indptr,
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn indptr(&self) -> &[u32] {
        &self.indptr
    }

    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Values and minor indices of one row (CSR) or column (CSC).
    pub fn lane(&self, major: usize) -> (&[u32], &[T]) {
        let start = self.indptr[major] as usize;
        let end = self.indptr[major + 1] as usize;
        (&self.indices[start..end], &self.data[start..end])
    }
}

/// A matrix in coordinate form. Duplicate coordinates are summed on conversion.
#[derive(Clone, Debug, PartialEq)]
pub struct CooMatrix<T> {
    shape: (usize, usize),
    rows: Vec<u32>,
    cols: Vec<u32>,
    data: Vec<T>,
}

/// A matrix stored as one list of `(column, value)` entries per row.
#[derive(Clone, Debug, PartialEq)]
pub struct LilMatrix<T> {
    shape: (usize, usize),
    rows: Vec<Vec<(u32, T)>>,
}

impl<T: Element> LilMatrix<T> {
    pub fn new(num_rows: usize, num_cols: usize) -> Self {
        Self {
            shape: (num_rows, num_cols),
            rows: vec![Vec::new(); num_rows],
        }
    }

    /// Sets a value, keeping the entries of the row sorted by column. Zeros are
    /// not stored.
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        check_bounds(self.shape, row, col)?;
        let entries = &mut self.rows[row];
        let col = col as u32;

        match entries.binary_search_by_key(&col, |(c, _)| *c) {
            Ok(i) if value == T::default() => {
                entries.remove(i);
            }
            Ok(i) => entries[i].1 = value,
            Err(_) if value == T::default() => {}
            Err(i) => entries.insert(i, (col, value)),
        }
        Ok(())
    }
}

/// A matrix stored as a dictionary of keys.
#[derive(Clone, Debug, PartialEq)]
pub struct DokMatrix<T> {
    shape: (usize, usize),
    entries: BTreeMap<(u32, u32), T>,
}

impl<T: Element> DokMatrix<T> {
    pub fn new(num_rows: usize, num_cols: usize) -> Self {
        Self {
            shape: (num_rows, num_cols),
            entries: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        check_bounds(self.shape, row, col)?;
        if value == T::default() {
            self.entries.remove(&(row as u32, col as u32));
        } else {
            self.entries.insert((row as u32, col as u32), value);
        }
        Ok(())
    }
}

fn check_bounds(shape: (usize, usize), row: usize, col: usize) -> Result<()> {
    if row >= shape.0 || col >= shape.1 {
        return Err(LearnerError::Shape(format!(
            "index ({}, {}) out of bounds for shape {:?}",
            row, col, shape
        )));
    }
    Ok(())
}

/// Feature or label data in the layout it was provided in.
#[derive(Clone, Debug, PartialEq)]
pub enum InputMatrix<T> {
    Dense(Array2<T>),
    Csr(CompressedMatrix<T>),
    Csc(CompressedMatrix<T>),
    Coo(CooMatrix<T>),
    Lil(LilMatrix<T>),
    Dok(DokMatrix<T>),
}

impl<T: Element> InputMatrix<T> {
    pub fn csr(
        shape: (usize, usize),
        data: Vec<T>,
        indices: Vec<u32>,
        indptr: Vec<u32>,
    ) -> Result<Self> {
        CompressedMatrix::new(shape, shape.0, shape.1, data, indices, indptr).map(InputMatrix::Csr)
    }

    pub fn csc(
        shape: (usize, usize),
        data: Vec<T>,
        indices: Vec<u32>,
        indptr: Vec<u32>,
    ) -> Result<Self> {
        CompressedMatrix::new(shape, shape.1, shape.0, data, indices, indptr).map(InputMatrix::Csc)
    }

    pub fn coo(shape: (usize, usize), rows: Vec<u32>, cols: Vec<u32>, data: Vec<T>) -> Result<Self> {
        if rows.len() != data.len() || cols.len() != data.len() {
            return Err(LearnerError::Shape(format!(
                "{} rows, {} columns and {} values given",
                rows.len(),
                cols.len(),
                data.len()
            )));
        }
        for (&row, &col) in rows.iter().zip(cols.iter()) {
            check_bounds(shape, row as usize, col as usize)?;
        }
        Ok(InputMatrix::Coo(CooMatrix {
            shape,
            rows,
            cols,
            data,
        }))
    }

    pub fn shape(&self) -> (usize, usize) {
        match self {
            InputMatrix::Dense(m) => m.dim(),
            InputMatrix::Csr(m) | InputMatrix::Csc(m) => m.shape,
            InputMatrix::Coo(m) => m.shape,
            InputMatrix::Lil(m) => m.shape,
            InputMatrix::Dok(m) => m.shape,
        }
    }

    pub fn nrows(&self) -> usize {
        self.shape().0
    }

    pub fn ncols(&self) -> usize {
        self.shape().1
    }

    pub fn is_sparse(&self) -> bool {
        !matches!(self, InputMatrix::Dense(_))
    }

    /// Number of stored entries. For a dense matrix this is every element.
    pub fn nnz(&self) -> usize {
        match self {
            InputMatrix::Dense(m) => m.len(),
            InputMatrix::Csr(m) | InputMatrix::Csc(m) => m.nnz(),
            InputMatrix::Coo(m) => m.data.len(),
            InputMatrix::Lil(m) => m.rows.iter().map(Vec::len).sum(),
            InputMatrix::Dok(m) => m.entries.len(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            InputMatrix::Dense(_) => "DenseMatrix",
            InputMatrix::Csr(_) => "CsrMatrix",
            InputMatrix::Csc(_) => "CscMatrix",
            InputMatrix::Coo(_) => "CooMatrix",
            InputMatrix::Lil(_) => "LilMatrix",
            InputMatrix::Dok(_) => "DokMatrix",
        }
    }

    /// Stored entries as `(row, column, value)`. Dense matrices yield their
    /// non-zero elements.
    pub fn triplets(&self) -> Vec<(u32, u32, T)> {
        match self {
            InputMatrix::Dense(m) => m
                .indexed_iter()
                .filter(|(_, v)| **v != T::default())
                .map(|((r, c), v)| (r as u32, c as u32, *v))
                .collect(),
            InputMatrix::Csr(m) => (0..m.shape.0)
                .flat_map(|row| {
                    let (cols, values) = m.lane(row);
                    cols.iter()
                        .zip(values.iter())
                        .map(move |(&col, &v)| (row as u32, col, v))
                })
                .collect(),
            InputMatrix::Csc(m) => (0..m.shape.1)
                .flat_map(|col| {
                    let (rows, values) = m.lane(col);
                    rows.iter()
                        .zip(values.iter())
                        .map(move |(&row, &v)| (row, col as u32, v))
                })
                .collect(),
            InputMatrix::Coo(m) => m
                .rows
                .iter()
                .zip(m.cols.iter())
                .zip(m.data.iter())
                .map(|((&r, &c), &v)| (r, c, v))
                .collect(),
            InputMatrix::Lil(m) => m
                .rows
                .iter()
                .enumerate()
                .flat_map(|(row, entries)| entries.iter().map(move |&(col, v)| (row as u32, col, v)))
                .collect(),
            InputMatrix::Dok(m) => m.entries.iter().map(|(&(r, c), &v)| (r, c, v)).collect(),
        }
    }

    /// Converts into a dense matrix in standard (row-major) layout.
    pub fn to_dense(&self) -> Array2<T> {
        match self {
            InputMatrix::Dense(m) => m.as_standard_layout().into_owned(),
            _ => {
                let mut dense = Array2::from_elem(self.shape(), T::default());
                for (r, c, v) in self.triplets() {
                    dense[[r as usize, c as usize]] += v;
                }
                dense
            }
        }
    }

    /// Converts into the given compressed layout, summing duplicate entries.
    pub fn to_compressed(&self, format: SparseFormat) -> CompressedMatrix<T> {
        match (self, format) {
            (InputMatrix::Csr(m), SparseFormat::Csr) | (InputMatrix::Csc(m), SparseFormat::Csc) => {
                m.clone()
            }
            _ => compress(self.shape(), self.triplets(), format),
        }
    }

    /// Selects the given rows, keeping the layout of the matrix.
    pub fn select_rows(&self, rows: &[usize]) -> InputMatrix<T> {
        let shape = (rows.len(), self.ncols());

        match self {
            InputMatrix::Dense(m) => InputMatrix::Dense(m.select(Axis(0), rows)),
            InputMatrix::Lil(m) => InputMatrix::Lil(LilMatrix {
                shape,
                rows: rows.iter().map(|&r| m.rows[r].clone()).collect(),
            }),
            InputMatrix::Csr(m) => {
                let mut data = Vec::new();
                let mut indices = Vec::new();
                let mut indptr = Vec::with_capacity(rows.len() + 1);
                indptr.push(0);
                for &row in rows {
                    let (cols, values) = m.lane(row);
                    indices.extend_from_slice(cols);
                    data.extend_from_slice(values);
                    indptr.push(data.len() as u32);
                }
                InputMatrix::Csr(CompressedMatrix {
                    shape,
                    data,
                    indices,
                    indptr,
                })
            }
            _ => {
                let mut positions: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
                for (new_row, &old_row) in rows.iter().enumerate() {
                    positions.entry(old_row as u32).or_default().push(new_row as u32);
                }
                let triplets: Vec<(u32, u32, T)> = self
                    .triplets()
                    .into_iter()
                    .flat_map(|(r, c, v)| {
                        positions
                            .get(&r)
                            .into_iter()
                            .flatten()
                            .map(move |&new_row| (new_row, c, v))
                    })
                    .collect();

                match self {
                    InputMatrix::Csc(_) => {
                        InputMatrix::Csc(compress(shape, triplets, SparseFormat::Csc))
                    }
                    InputMatrix::Dok(_) => {
                        let mut dok = DokMatrix {
                            shape,
                            entries: BTreeMap::new(),
                        };
                        for (r, c, v) in triplets {
                            *dok.entries.entry((r, c)).or_default() += v;
                        }
                        InputMatrix::Dok(dok)
                    }
                    _ => {
                        let (rows, (cols, data)): (Vec<u32>, (Vec<u32>, Vec<T>)) =
                            triplets.into_iter().map(|(r, c, v)| (r, (c, v))).unzip();
                        InputMatrix::Coo(CooMatrix {
                            shape,
                            rows,
                            cols,
                            data,
                        })
                    }
                }
            }
        }
    }
}

/// Builds a compressed matrix from coordinate entries, summing duplicates.
fn compress<T: Element>(
    shape: (usize, usize),
    mut triplets: Vec<(u32, u32, T)>,
    format: SparseFormat,
) -> CompressedMatrix<T> {
    let major_len = match format {
        SparseFormat::Csr => shape.0,
        SparseFormat::Csc => shape.1,
    };
    let key = |&(r, c, _): &(u32, u32, T)| match format {
        SparseFormat::Csr => (r, c),
        SparseFormat::Csc => (c, r),
    };
    triplets.sort_by_key(key);

    let mut data: Vec<T> = Vec::with_capacity(triplets.len());
    let mut indices: Vec<u32> = Vec::with_capacity(triplets.len());
    let mut counts = vec![0u32; major_len];
    let mut last: Option<(u32, u32)> = None;

    for triplet in &triplets {
        let (major, minor) = key(triplet);
        if last == Some((major, minor)) {
            if let Some(value) = data.last_mut() {
                *value += triplet.2;
            }
            continue;
        }
        data.push(triplet.2);
        indices.push(minor);
        counts[major as usize] += 1;
        last = Some((major, minor));
    }

    let mut indptr = Vec::with_capacity(major_len + 1);
    indptr.push(0u32);
    let mut total = 0u32;
    for count in counts {
        total += count;
        indptr.push(total);
    }

    CompressedMatrix {
        shape,
        data,
        indices,
        indptr,
    }
}

impl<T: Element> From<Array2<T>> for InputMatrix<T> {
    fn from(m: Array2<T>) -> Self {
        InputMatrix::Dense(m)
    }
}

impl<T: Element> From<LilMatrix<T>> for InputMatrix<T> {
    fn from(m: LilMatrix<T>) -> Self {
        InputMatrix::Lil(m)
    }
}

impl<T: Element> From<DokMatrix<T>> for InputMatrix<T> {
    fn from(m: DokMatrix<T>) -> Self {
        InputMatrix::Dok(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn example() -> Array2<f32> {
        array![[1.0, 0.0, 2.0], [0.0, 0.0, 3.0], [4.0, 5.0, 0.0]]
    }

    #[test]
    fn test_compressed_conversions_match_dense() {
        let dense = InputMatrix::Dense(example());

        let csc = dense.to_compressed(SparseFormat::Csc);
        assert_eq!(csc.indptr(), &[0, 2, 3, 5]);
        assert_eq!(csc.indices(), &[0, 2, 2, 0, 1]);
        assert_eq!(csc.data(), &[1.0, 4.0, 5.0, 2.0, 3.0]);

        let csr = dense.to_compressed(SparseFormat::Csr);
        assert_eq!(csr.indptr(), &[0, 2, 3, 5]);
        assert_eq!(InputMatrix::Csr(csr).to_dense(), example());
        assert_eq!(InputMatrix::Csc(csc).to_dense(), example());
    }

    #[test]
    fn test_coo_duplicates_are_summed() {
        let coo = InputMatrix::coo((2, 2), vec![0, 0, 1], vec![1, 1, 0], vec![1.0f32, 2.0, 5.0]).unwrap();
        assert_eq!(coo.nnz(), 3);
        let csc = coo.to_compressed(SparseFormat::Csc);
        assert_eq!(csc.nnz(), 2);
        assert_eq!(coo.to_dense(), array![[0.0, 3.0], [5.0, 0.0]]);
    }

    #[test]
    fn test_lil_and_dok_builders() {
        let mut lil = LilMatrix::new(2, 3);
        lil.set(0, 2, 1.5f32).unwrap();
        lil.set(0, 0, 2.5).unwrap();
        lil.set(1, 1, 0.0).unwrap();
        assert!(lil.set(2, 0, 1.0).is_err());
        let lil = InputMatrix::from(lil);
        assert_eq!(lil.nnz(), 2);
        assert_eq!(lil.to_dense(), array![[2.5, 0.0, 1.5], [0.0, 0.0, 0.0]]);

        let mut dok = DokMatrix::new(2, 2);
        dok.insert(1, 1, 7u32).unwrap();
        let dok = InputMatrix::from(dok);
        assert_eq!(dok.to_dense(), array![[0, 0], [0, 7]]);
    }

    #[test]
    fn test_invalid_compressed_input_is_rejected() {
        assert!(InputMatrix::csr((2, 2), vec![1.0f32], vec![0], vec![0, 1]).is_err());
        assert!(InputMatrix::csr((2, 2), vec![1.0f32], vec![5], vec![0, 1, 1]).is_err());
        assert!(InputMatrix::csc((2, 2), vec![1.0f32], vec![1], vec![0, 1, 1]).is_ok());
    }

    #[test]
    fn test_select_rows_keeps_layout() {
        let dense = InputMatrix::Dense(example());
        let expected = array![[4.0, 5.0, 0.0], [1.0, 0.0, 2.0]];

        for matrix in [
            dense.clone(),
            InputMatrix::Csr(dense.to_compressed(SparseFormat::Csr)),
            InputMatrix::Csc(dense.to_compressed(SparseFormat::Csc)),
        ] {
            let selected = matrix.select_rows(&[2, 0]);
            assert_eq!(selected.type_name(), matrix.type_name());
            assert_eq!(selected.to_dense(), expected);
        }
    }
}
