//! Column-major complex matrices
//!
//! A [`Matrix`] is a list of `cols` column vectors of length `rows`. Column
//! storage keeps each column on its own aligned buffer, so column-wise
//! arithmetic goes straight through the SIMD backends.
//!
//! # Example
//!
//! ```
//! use cxkernel::Matrix;
//!
//! let m = Matrix::new("M", 2, 3).unwrap();
//! assert_eq!(m.rows(), 2);
//! assert_eq!(m.cols(), 3);
//! ```

use std::borrow::Cow;

use num_complex::Complex32;

use crate::{Backend, ComplexVector, KernelError, Result};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// A dense `rows x cols` complex matrix stored as columns
///
/// Element `(row, col)` lives at `columns[col][row]`. Both dimensions are
/// always positive.
///
/// # Example
///
/// ```
/// use cxkernel::Matrix;
/// use num_complex::Complex32;
///
/// let m = Matrix::from_real_rows("M", &[&[1.0, 2.0], &[3.0, 4.0]]).unwrap();
/// assert_eq!(m.get(0, 1), Some(Complex32::new(2.0, 0.0)));
/// assert_eq!(m.get(1, 0), Some(Complex32::new(3.0, 0.0)));
/// assert_eq!(m.get(2, 0), None);
/// ```
#[derive(Debug, Clone)]
pub struct Matrix {
    name: Cow<'static, str>,
    rows: usize,
    cols: usize,
    columns: Vec<ComplexVector>,
}

impl Matrix {
    /// Creates a zero-filled matrix
    ///
    /// # Errors
    ///
    /// - [`KernelError::BadSize`] if either dimension is zero
    /// - [`KernelError::OutOfMemory`] if a column allocation fails
    pub fn new(name: impl Into<Cow<'static, str>>, rows: usize, cols: usize) -> Result<Self> {
        Self::with_backend(name, rows, cols, Backend::Auto)
    }

    /// Creates a zero-filled matrix whose columns use `backend`
    pub fn with_backend(
        name: impl Into<Cow<'static, str>>,
        rows: usize,
        cols: usize,
        backend: Backend,
    ) -> Result<Self> {
        if rows == 0 {
            return Err(KernelError::BadSize(rows));
        }
        if cols == 0 {
            return Err(KernelError::BadSize(cols));
        }

        let name = name.into();
        let columns = (0..cols)
            .map(|_| ComplexVector::with_backend(name.clone(), rows, backend))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name,
            rows,
            cols,
            columns,
        })
    }

    /// Creates a matrix from row-major literal rows
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::BadSize`] for no rows or empty rows, and
    /// [`KernelError::SizeMismatch`] if the rows are ragged.
    pub fn from_rows(name: impl Into<Cow<'static, str>>, rows: &[&[Complex32]]) -> Result<Self> {
        let cols = rows.first().map_or(0, |r| r.len());
        let mut m = Self::new(name, rows.len(), cols)?;

        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(KernelError::SizeMismatch {
                    expected: cols,
                    actual: row.len(),
                });
            }
            for (j, &value) in row.iter().enumerate() {
                m.update(value, i, j);
            }
        }

        Ok(m)
    }

    /// Creates a matrix of purely real entries from row-major literal rows
    pub fn from_real_rows(name: impl Into<Cow<'static, str>>, rows: &[&[f32]]) -> Result<Self> {
        let converted: Vec<Vec<Complex32>> = rows
            .iter()
            .map(|r| r.iter().map(|&re| Complex32::new(re, 0.0)).collect())
            .collect();
        let borrowed: Vec<&[Complex32]> = converted.iter().map(Vec::as_slice).collect();
        Self::from_rows(name, &borrowed)
    }

    /// Creates an `n x n` identity matrix
    ///
    /// # Example
    ///
    /// ```
    /// use cxkernel::Matrix;
    /// use num_complex::Complex32;
    ///
    /// let id = Matrix::identity(3).unwrap();
    /// assert_eq!(id.get(1, 1), Some(Complex32::new(1.0, 0.0)));
    /// assert_eq!(id.get(0, 1), Some(Complex32::new(0.0, 0.0)));
    /// ```
    pub fn identity(n: usize) -> Result<Self> {
        let mut m = Self::new("I", n, n)?;
        for i in 0..n {
            m.update(Complex32::new(1.0, 0.0), i, i);
        }
        Ok(m)
    }

    /// Releases the matrix and every column it owns
    pub fn destroy(self) {
        drop(self);
    }

    /// Diagnostic label
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replaces the diagnostic label
    pub fn rename(&mut self, name: impl Into<Cow<'static, str>>) {
        self.name = name.into();
    }

    /// Returns the number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the shape as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Backend used by the columns
    pub fn backend(&self) -> Backend {
        self.columns[0].backend()
    }

    /// Gets the element at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Option<Complex32> {
        self.columns.get(col).and_then(|c| c.get(row))
    }

    /// Column `col` as a vector
    pub fn column(&self, col: usize) -> Option<&ComplexVector> {
        self.columns.get(col)
    }

    pub(crate) fn columns(&self) -> &[ComplexVector] {
        &self.columns
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [ComplexVector] {
        &mut self.columns
    }

    /// Writes `value` at (row, col)
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    #[inline]
    pub fn update(&mut self, value: Complex32, row: usize, col: usize) {
        debug_assert!(
            col < self.cols,
            "column {col} out of range for matrix '{}' with {} columns",
            self.name,
            self.cols
        );
        self.columns[col].update(value, row);
    }

    /// Bounds-checked write
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::IndexOutOfRange`] for either index.
    pub fn try_update(&mut self, value: Complex32, row: usize, col: usize) -> Result<()> {
        let cols = self.cols;
        self.columns
            .get_mut(col)
            .ok_or(KernelError::IndexOutOfRange {
                index: col,
                len: cols,
            })?
            .try_update(value, row)
    }

    fn check_same_shape(&self, other: &Self) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(KernelError::DimensionMismatch {
                left: self.shape(),
                right: other.shape(),
            });
        }
        Ok(())
    }

    /// Column-wise `self + other`, or `self - other` when `subtract`
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::DimensionMismatch`] unless the shapes are equal.
    pub fn combine(&self, other: &Self, subtract: bool) -> Result<Self> {
        self.check_same_shape(other)?;

        let columns = self
            .columns
            .iter()
            .zip(&other.columns)
            .map(|(a, b)| a.combine(b, subtract))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: self.name.clone(),
            rows: self.rows,
            cols: self.cols,
            columns,
        })
    }

    /// Element-wise addition
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.combine(other, false)
    }

    /// Element-wise subtraction
    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.combine(other, true)
    }

    /// Multiplies every element by `factor`
    pub fn scale(&self, factor: Complex32) -> Result<Self> {
        let columns = self
            .columns
            .iter()
            .map(|c| c.scale(factor))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: self.name.clone(),
            rows: self.rows,
            cols: self.cols,
            columns,
        })
    }

    /// `true` if every element has a zero imaginary part
    pub fn is_real(&self) -> bool {
        self.columns.iter().all(ComplexVector::is_real)
    }

    /// Largest element-wise modulus of `self - other`
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::DimensionMismatch`] unless the shapes are equal.
    pub fn max_abs_diff(&self, other: &Self) -> Result<f32> {
        self.check_same_shape(other)?;

        Ok(self
            .columns
            .iter()
            .zip(&other.columns)
            .flat_map(|(a, b)| a.as_slice().iter().zip(b.as_slice()))
            .map(|(x, y)| (x - y).norm())
            .fold(0.0f32, f32::max))
    }

    /// Transposes the matrix
    #[cfg_attr(feature = "tracing", instrument(skip(self), fields(dims = %format!("{}x{}", self.rows, self.cols))))]
    pub fn transpose(&self) -> Result<Self> {
        self.transposed(false)
    }

    /// Conjugate (Hermitian) transpose
    pub fn conj_transpose(&self) -> Result<Self> {
        self.transposed(true)
    }

    fn transposed(&self, conjugate: bool) -> Result<Self> {
        let mut result = Self::with_backend(self.name.clone(), self.cols, self.rows, self.backend())?;

        for (j, column) in self.columns.iter().enumerate() {
            for (i, &value) in column.as_slice().iter().enumerate() {
                let value = if conjugate { value.conj() } else { value };
                result.columns[i].as_mut_slice()[j] = value;
            }
        }

        Ok(result)
    }

    /// Reference triple-loop product `self × other`
    ///
    /// Accumulates `result[row][col] += self[row][k] * other[k][col]` over the
    /// inner index. This is also the recursion base case of Strassen.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::DimensionMismatch`] if `self.cols() != other.rows()`.
    /// Nothing is allocated in that case.
    ///
    /// # Example
    ///
    /// ```
    /// use cxkernel::Matrix;
    /// use num_complex::Complex32;
    ///
    /// let a = Matrix::from_real_rows("A", &[&[1.0, 2.0], &[0.0, 1.0]]).unwrap();
    /// let b = Matrix::from_real_rows("B", &[&[2.0, 1.0], &[1.0, 2.0]]).unwrap();
    /// let c = a.standard_multiply(&b).unwrap();
    /// assert_eq!(c.get(0, 1), Some(Complex32::new(5.0, 0.0)));
    /// ```
    #[cfg_attr(feature = "tracing", instrument(skip(self, other), fields(dims = %format!("{}x{} @ {}x{}", self.rows, self.cols, other.rows, other.cols))))]
    pub fn standard_multiply(&self, other: &Self) -> Result<Self> {
        if self.cols != other.rows {
            return Err(KernelError::DimensionMismatch {
                left: self.shape(),
                right: other.shape(),
            });
        }

        let mut result = Self::with_backend("C", self.rows, other.cols, self.backend())?;

        for (out, rhs) in result.columns.iter_mut().zip(&other.columns) {
            let out = out.as_mut_slice();
            for (lhs, &scale) in self.columns.iter().zip(rhs.as_slice()) {
                for (acc, &x) in out.iter_mut().zip(lhs.as_slice()) {
                    *acc += x * scale;
                }
            }
        }

        Ok(result)
    }
}

impl Matrix {
    fn check_square(&self) -> Result<usize> {
        if self.rows != self.cols {
            return Err(KernelError::DimensionMismatch {
                left: self.shape(),
                right: (self.cols, self.rows),
            });
        }
        Ok(self.rows)
    }

    /// `self` raised to the `exponent`-th power; `power(0)` is the identity
    ///
    /// Uses square-and-multiply over [`Matrix::standard_multiply`].
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::DimensionMismatch`] if the matrix is not square.
    ///
    /// # Example
    ///
    /// ```
    /// use cxkernel::Matrix;
    /// use num_complex::Complex32;
    ///
    /// let m = Matrix::from_real_rows("M", &[&[1.0, 1.0], &[0.0, 1.0]]).unwrap();
    /// assert_eq!(m.power(5).unwrap().get(0, 1), Some(Complex32::new(5.0, 0.0)));
    /// ```
    pub fn power(&self, exponent: u32) -> Result<Self> {
        let n = self.check_square()?;

        let mut result = Self::identity(n)?;
        let mut base = self.clone();
        let mut e = exponent;
        while e > 0 {
            if e & 1 == 1 {
                result = result.standard_multiply(&base)?;
            }
            e >>= 1;
            if e > 0 {
                base = base.standard_multiply(&base)?;
            }
        }

        result.rename("P");
        Ok(result)
    }

    /// Element-wise (Hadamard) product
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::DimensionMismatch`] unless the shapes are equal.
    pub fn hadamard(&self, other: &Self) -> Result<Self> {
        self.check_same_shape(other)?;

        let mut result = Self::with_backend("H", self.rows, self.cols, self.backend())?;
        for ((out, a), b) in result.columns.iter_mut().zip(&self.columns).zip(&other.columns) {
            for ((slot, x), y) in out.as_mut_slice().iter_mut().zip(a.as_slice()).zip(b.as_slice()) {
                *slot = x * y;
            }
        }

        Ok(result)
    }

    /// Kronecker product, shape `(r1 * r2, c1 * c2)`
    ///
    /// Block `(i, j)` of the result is `self[i][j] * other`.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::BadSize`] if the result shape overflows `usize`.
    pub fn kronecker(&self, other: &Self) -> Result<Self> {
        let rows = self
            .rows
            .checked_mul(other.rows)
            .ok_or(KernelError::BadSize(usize::MAX))?;
        let cols = self
            .cols
            .checked_mul(other.cols)
            .ok_or(KernelError::BadSize(usize::MAX))?;

        let mut result = Self::with_backend("K", rows, cols, self.backend())?;
        for (j, out) in result.columns.iter_mut().enumerate() {
            let (a, b) = (&self.columns[j / other.cols], &other.columns[j % other.cols]);
            for (i, slot) in out.as_mut_slice().iter_mut().enumerate() {
                *slot = a.as_slice()[i / other.rows] * b.as_slice()[i % other.rows];
            }
        }

        Ok(result)
    }

    /// Sum of the diagonal
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::DimensionMismatch`] if the matrix is not square.
    pub fn trace(&self) -> Result<Complex32> {
        self.check_square()?;
        Ok(self
            .columns
            .iter()
            .enumerate()
            .map(|(j, column)| column.as_slice()[j])
            .sum())
    }

    /// Rotate 90 degrees counter-clockwise; shape becomes `(cols, rows)`
    ///
    /// # Example
    ///
    /// ```
    /// use cxkernel::Matrix;
    /// use num_complex::Complex32;
    ///
    /// // [1 2]    [2 4]
    /// // [3 4] -> [1 3]
    /// let m = Matrix::from_real_rows("M", &[&[1.0, 2.0], &[3.0, 4.0]]).unwrap();
    /// let r = m.rotate_left().unwrap();
    /// assert_eq!(r.get(0, 0), Some(Complex32::new(2.0, 0.0)));
    /// assert_eq!(r.get(1, 1), Some(Complex32::new(3.0, 0.0)));
    /// ```
    pub fn rotate_left(&self) -> Result<Self> {
        let mut result = Self::with_backend("R", self.cols, self.rows, self.backend())?;
        // r[i][j] = m[j][cols - 1 - i]
        for (j, out) in result.columns.iter_mut().enumerate() {
            for (i, slot) in out.as_mut_slice().iter_mut().enumerate() {
                *slot = self.columns[self.cols - 1 - i].as_slice()[j];
            }
        }
        Ok(result)
    }

    /// Rotate 90 degrees clockwise; shape becomes `(cols, rows)`
    pub fn rotate_right(&self) -> Result<Self> {
        let mut result = Self::with_backend("R", self.cols, self.rows, self.backend())?;
        // r[i][j] = m[rows - 1 - j][i]
        for (j, out) in result.columns.iter_mut().enumerate() {
            for (slot, column) in out.as_mut_slice().iter_mut().zip(&self.columns) {
                *slot = column.as_slice()[self.rows - 1 - j];
            }
        }
        Ok(result)
    }

    /// `true` if square and `m[i][j] == m[j][i]` for all entries
    pub fn is_symmetric(&self) -> bool {
        self.rows == self.cols
            && (0..self.cols).all(|j| (0..j).all(|i| self.get(i, j) == self.get(j, i)))
    }

    /// `true` if square and `m[i][j] == conj(m[j][i])` for all entries
    pub fn is_hermitian(&self) -> bool {
        self.rows == self.cols
            && (0..self.cols).all(|j| {
                (0..=j).all(|i| self.get(i, j) == self.get(j, i).map(|z| z.conj()))
            })
    }

    /// `true` if every entry off the main diagonal is zero
    pub fn is_diagonal(&self) -> bool {
        let zero = Complex32::new(0.0, 0.0);
        self.columns.iter().enumerate().all(|(j, column)| {
            column
                .as_slice()
                .iter()
                .enumerate()
                .all(|(i, &z)| i == j || z == zero)
        })
    }

    /// `true` if some row is entirely zero
    pub fn has_zero_row(&self) -> bool {
        let zero = Complex32::new(0.0, 0.0);
        (0..self.rows).any(|i| self.columns.iter().all(|c| c.as_slice()[i] == zero))
    }

    /// `true` if some column is entirely zero
    pub fn has_zero_column(&self) -> bool {
        let zero = Complex32::new(0.0, 0.0);
        self.columns
            .iter()
            .any(|c| c.as_slice().iter().all(|&z| z == zero))
    }
}

impl PartialEq for Matrix {
    /// Shape and element equality; names are not compared
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape() && self.columns == other.columns
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn matrix(rows: usize, cols: usize) -> impl Strategy<Value = Matrix> {
        proptest::collection::vec((-10.0f32..10.0, -10.0f32..10.0), rows * cols).prop_map(
            move |values| {
                let mut m = Matrix::new("M", rows, cols).unwrap();
                for (idx, (re, im)) in values.into_iter().enumerate() {
                    m.update(Complex32::new(re, im), idx / cols, idx % cols);
                }
                m
            },
        )
    }

    fn same_shape_pair() -> impl Strategy<Value = (Matrix, Matrix)> {
        (1usize..8, 1usize..8).prop_flat_map(|(r, c)| (matrix(r, c), matrix(r, c)))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Property: (A - B) + B = A
        #[test]
        fn test_sub_then_add_reproduces((a, b) in same_shape_pair()) {
            let back = a.sub(&b).unwrap().add(&b).unwrap();
            prop_assert!(back.max_abs_diff(&a).unwrap() < 1e-4);
        }

        /// Property: A + B = B + A
        #[test]
        fn test_add_commutative((a, b) in same_shape_pair()) {
            prop_assert_eq!(a.add(&b).unwrap(), b.add(&a).unwrap());
        }

        /// Property: (A + B) + C = A + (B + C)
        #[test]
        fn test_add_associative(
            (a, b, c) in (1usize..6, 1usize..6)
                .prop_flat_map(|(r, k)| (matrix(r, k), matrix(r, k), matrix(r, k)))
        ) {
            let left = a.add(&b).unwrap().add(&c).unwrap();
            let right = a.add(&b.add(&c).unwrap()).unwrap();
            prop_assert!(left.max_abs_diff(&right).unwrap() < 1e-4);
        }

        /// Property: (AB)^H = B^H A^H
        #[test]
        fn test_conj_transpose_of_product(
            (a, b) in (1usize..6, 1usize..6, 1usize..6)
                .prop_flat_map(|(m, k, n)| (matrix(m, k), matrix(k, n)))
        ) {
            let left = a.standard_multiply(&b).unwrap().conj_transpose().unwrap();
            let right = b
                .conj_transpose()
                .unwrap()
                .standard_multiply(&a.conj_transpose().unwrap())
                .unwrap();
            prop_assert!(left.max_abs_diff(&right).unwrap() < 1e-2);
        }
    }
}
