//!
//! Compressed sparse row (CSR) transition matrices
//!
//! ```text
//! row i = { (indices[p], data[p]) | indptr[i] <= p < indptr[i+1] }
//! ```
//!
//! `CsrView` borrows caller arrays (any integer index type) and checks the
//! structure once at construction. `CsrMatrix` owns its arrays and is built
//! from a dense matrix or from a `SubHmm`.
//!
use crate::error::HmmError;
use crate::float::{HmmFloat, StateIndex};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use std::ops::Range;

///
/// Validated CSR matrix over borrowed arrays.
///
#[derive(Debug, Clone, Copy)]
pub struct CsrView<'a, F, I> {
    n_rows: usize,
    n_cols: usize,
    indptr: ArrayView1<'a, I>,
    indices: ArrayView1<'a, I>,
    data: ArrayView1<'a, F>,
}

impl<'a, F: HmmFloat, I: StateIndex> CsrView<'a, F, I> {
    ///
    /// Check that
    ///
    /// * `indptr` has `n_rows + 1` entries, starts at 0 and never decreases
    /// * `indptr[n_rows] == indices.len() == data.len()`
    /// * every index is in `0..n_cols`
    /// * every value is non-negative and not NaN
    ///
    pub fn new(
        n_rows: usize,
        n_cols: usize,
        indptr: ArrayView1<'a, I>,
        indices: ArrayView1<'a, I>,
        data: ArrayView1<'a, F>,
    ) -> Result<Self, HmmError> {
        if indptr.len() != n_rows + 1 {
            return Err(HmmError::InvalidSparse(format!(
                "indptr has {} entries for {} rows",
                indptr.len(),
                n_rows
            )));
        }
        let mut prev = 0;
        for (i, &p) in indptr.iter().enumerate() {
            match p.to_state() {
                Some(p) if (i == 0 && p == 0) || (i > 0 && p >= prev) => prev = p,
                _ => {
                    return Err(HmmError::InvalidSparse(format!(
                        "indptr[{}] is not a valid row offset",
                        i
                    )))
                }
            }
        }
        if prev != indices.len() || prev != data.len() {
            return Err(HmmError::InvalidSparse(format!(
                "indptr ends at {} but there are {} indices and {} values",
                prev,
                indices.len(),
                data.len()
            )));
        }
        for (p, &j) in indices.iter().enumerate() {
            if !matches!(j.to_state(), Some(j) if j < n_cols) {
                return Err(HmmError::InvalidSparse(format!(
                    "column index at position {} is out of 0..{}",
                    p, n_cols
                )));
            }
        }
        if let Some(p) = data.iter().position(|&x| !(x >= F::zero())) {
            return Err(HmmError::InvalidSparse(format!(
                "value at position {} is negative or NaN",
                p
            )));
        }
        Ok(CsrView {
            n_rows,
            n_cols,
            indptr,
            indices,
            data,
        })
    }
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }
    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.data.len()
    }
    ///
    /// Positions `p` of the entries of `row`.
    ///
    #[inline]
    pub fn row_range(&self, row: usize) -> Range<usize> {
        // offsets were checked in `new`
        let start = self.indptr[row].to_state().unwrap_or(0);
        let end = self.indptr[row + 1].to_state().unwrap_or(start);
        start..end
    }
    /// Column index of the entry at position `p`
    #[inline]
    pub fn index(&self, p: usize) -> usize {
        self.indices[p].to_state().unwrap_or(0)
    }
    /// Value of the entry at position `p`
    #[inline]
    pub fn value(&self, p: usize) -> F {
        self.data[p]
    }
    ///
    /// `(column, value)` pairs of `row`.
    ///
    pub fn entries(&self, row: usize) -> impl Iterator<Item = (usize, F)> + '_ + use<'_, 'a, F, I> {
        self.row_range(row).map(move |p| (self.index(p), self.value(p)))
    }
    pub fn to_dense(&self) -> Array2<F> {
        let mut m = Array2::zeros((self.n_rows, self.n_cols));
        for i in 0..self.n_rows {
            for (j, x) in self.entries(i) {
                m[[i, j]] += x;
            }
        }
        m
    }
}

///
/// Owned CSR matrix with `usize` indices.
///
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix<F> {
    n_rows: usize,
    n_cols: usize,
    indptr: Array1<usize>,
    indices: Array1<usize>,
    data: Array1<F>,
}

impl<F: HmmFloat> CsrMatrix<F> {
    ///
    /// Build from the nonzero entries of each row, in order.
    ///
    pub(crate) fn from_rows<R, E>(n_cols: usize, rows: R) -> Self
    where
        R: IntoIterator<Item = E>,
        E: IntoIterator<Item = (usize, F)>,
    {
        let mut indptr = vec![0];
        let mut indices = Vec::new();
        let mut data = Vec::new();
        for row in rows {
            for (j, x) in row {
                debug_assert!(j < n_cols);
                indices.push(j);
                data.push(x);
            }
            indptr.push(indices.len());
        }
        CsrMatrix {
            n_rows: indptr.len() - 1,
            n_cols,
            indptr: Array1::from(indptr),
            indices: Array1::from(indices),
            data: Array1::from(data),
        }
    }
    ///
    /// Keep the nonzero entries of `m`.
    ///
    pub fn from_dense(m: ArrayView2<F>) -> Self {
        CsrMatrix::from_rows(
            m.ncols(),
            m.rows().into_iter().map(|row| {
                row.into_iter()
                    .enumerate()
                    .filter(|&(_, &x)| x != F::zero())
                    .map(|(j, &x)| (j, x))
                    .collect::<Vec<_>>()
            }),
        )
    }
    ///
    /// CSR of `m^T`: row `j` lists the `i` with `m[i, j] != 0`.
    ///
    /// Given a transition matrix this is the predecessor structure used by
    /// backward sampling.
    ///
    pub fn from_dense_transpose(m: ArrayView2<F>) -> Self {
        CsrMatrix::from_dense(m.t())
    }
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }
    pub fn nnz(&self) -> usize {
        self.data.len()
    }
    ///
    /// Borrow as a `CsrView`. The structure is valid by construction.
    ///
    pub fn view(&self) -> CsrView<'_, F, usize> {
        CsrView {
            n_rows: self.n_rows,
            n_cols: self.n_cols,
            indptr: self.indptr.view(),
            indices: self.indices.view(),
            data: self.data.view(),
        }
    }
    pub fn to_dense(&self) -> Array2<F> {
        self.view().to_dense()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use test_case::test_case;

    #[test]
    fn csr_from_dense_keeps_nonzeros() {
        let m = array![[0.5, 0.0, 0.5], [0.0, 0.0, 1.0], [0.2, 0.8, 0.0]];
        let csr = CsrMatrix::from_dense(m.view());
        assert_eq!(csr.nnz(), 5);
        assert_eq!(csr.view().row_range(1), 2..3);
        assert_eq!(csr.view().entries(2).collect::<Vec<_>>(), vec![(0, 0.2), (1, 0.8)]);
        assert_eq!(csr.to_dense(), m);

        let t = CsrMatrix::from_dense_transpose(m.view());
        assert_eq!(t.view().entries(2).collect::<Vec<_>>(), vec![(0, 0.5), (1, 1.0)]);
        assert_eq!(t.to_dense(), m.t());
    }
    #[test]
    fn csr_view_over_i32_arrays() {
        let indptr = array![0i32, 1, 3];
        let indices = array![1i32, 0, 1];
        let data = array![1.0f32, 0.25, 0.75];
        let csr = CsrView::new(2, 2, indptr.view(), indices.view(), data.view()).unwrap();
        assert_eq!(csr.to_dense(), array![[0.0f32, 1.0], [0.25, 0.75]]);
    }
    #[test_case(array![0i32, 1], array![0i32], array![1.0] ; "indptr too short")]
    #[test_case(array![1i32, 1, 1], array![0i32], array![1.0] ; "indptr does not start at zero")]
    #[test_case(array![0i32, 2, 1], array![0i32, 1], array![1.0, 1.0] ; "indptr decreases")]
    #[test_case(array![0i32, 1, 2], array![0i32, 2], array![1.0, 1.0] ; "column out of range")]
    #[test_case(array![0i32, 1, 2], array![0i32, -1], array![1.0, 1.0] ; "negative column")]
    #[test_case(array![0i32, 1, 3], array![0i32, 1], array![1.0, 1.0] ; "nnz mismatch")]
    #[test_case(array![0i32, 1, 2], array![0i32, 1], array![1.0, -1.0] ; "negative value")]
    fn csr_view_rejects_malformed(indptr: Array1<i32>, indices: Array1<i32>, data: Array1<f64>) {
        let r = CsrView::new(2, 2, indptr.view(), indices.view(), data.view());
        assert!(matches!(r, Err(HmmError::InvalidSparse(_))));
    }
}
