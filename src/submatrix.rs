//! Rectangular block copies between matrices
//!
//! [`extract`] copies a half-open block out into a fresh matrix, and
//! [`splice`] writes a matrix back into a block of another one. Strassen uses
//! these to split operands into quadrants and to assemble the result.

use std::ops::Range;

use crate::{KernelError, Matrix, Result};

fn check_block(m: &Matrix, rows: &Range<usize>, cols: &Range<usize>) -> Result<()> {
    if rows.end > m.rows() {
        return Err(KernelError::IndexOutOfRange {
            index: rows.end,
            len: m.rows(),
        });
    }
    if cols.end > m.cols() {
        return Err(KernelError::IndexOutOfRange {
            index: cols.end,
            len: m.cols(),
        });
    }
    Ok(())
}

/// Copies the block `rows x cols` of `m` into a new matrix
///
/// # Errors
///
/// - [`KernelError::BadSize`] if either range is empty
/// - [`KernelError::IndexOutOfRange`] if the block extends past `m`
///
/// # Example
///
/// ```
/// use cxkernel::{submatrix, Matrix};
/// use num_complex::Complex32;
///
/// let m = Matrix::from_real_rows("M", &[&[1.0, 2.0], &[3.0, 4.0]]).unwrap();
/// let block = submatrix::extract(&m, 1..2, 0..2).unwrap();
/// assert_eq!(block.shape(), (1, 2));
/// assert_eq!(block.get(0, 1), Some(Complex32::new(4.0, 0.0)));
/// ```
pub fn extract(m: &Matrix, rows: Range<usize>, cols: Range<usize>) -> Result<Matrix> {
    check_block(m, &rows, &cols)?;

    let mut block = Matrix::with_backend(m.name().to_owned(), rows.len(), cols.len(), m.backend())?;

    for (dest, src) in block.columns_mut().iter_mut().zip(&m.columns()[cols]) {
        dest.as_mut_slice()
            .copy_from_slice(&src.as_slice()[rows.clone()]);
    }

    Ok(block)
}

/// Copies `src` into `dest` at the block `rows x cols` and returns `dest`
///
/// Overlap and shape are the caller's responsibility.
///
/// # Panics
///
/// Panics if the block does not lie inside `dest` or does not match the
/// shape of `src`.
pub fn splice<'a>(
    dest: &'a mut Matrix,
    src: &Matrix,
    rows: Range<usize>,
    cols: Range<usize>,
) -> &'a mut Matrix {
    debug_assert_eq!(
        (rows.len(), cols.len()),
        src.shape(),
        "splice block does not match source shape"
    );

    for (dest_col, src_col) in dest.columns_mut()[cols].iter_mut().zip(src.columns()) {
        dest_col.as_mut_slice()[rows.clone()].copy_from_slice(src_col.as_slice());
    }

    dest
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex32;

    fn numbered(n: usize) -> Matrix {
        let mut m = Matrix::new("M", n, n).unwrap();
        for i in 0..n {
            for j in 0..n {
                m.update(Complex32::new((i * n + j) as f32, 0.0), i, j);
            }
        }
        m
    }

    #[test]
    fn test_extract_quadrant() {
        let m = numbered(4);
        let q = extract(&m, 2..4, 0..2).unwrap();
        assert_eq!(q.shape(), (2, 2));
        assert_eq!(q.get(0, 0), Some(Complex32::new(8.0, 0.0)));
        assert_eq!(q.get(1, 1), Some(Complex32::new(13.0, 0.0)));
    }

    #[test]
    fn test_extract_empty_range() {
        let m = numbered(4);
        assert_eq!(extract(&m, 2..2, 0..2).unwrap_err(), KernelError::BadSize(0));
    }

    #[test]
    fn test_extract_out_of_bounds() {
        let m = numbered(4);
        assert_eq!(
            extract(&m, 0..5, 0..2).unwrap_err(),
            KernelError::IndexOutOfRange { index: 5, len: 4 }
        );
        assert_eq!(
            extract(&m, 0..2, 3..6).unwrap_err(),
            KernelError::IndexOutOfRange { index: 6, len: 4 }
        );
    }

    #[test]
    fn test_splice_then_extract() {
        let mut dest = Matrix::new("D", 4, 4).unwrap();
        let src = numbered(2);

        splice(&mut dest, &src, 2..4, 2..4);

        assert_eq!(extract(&dest, 2..4, 2..4).unwrap(), src);
        assert_eq!(dest.get(0, 0), Some(Complex32::new(0.0, 0.0)));
        assert_eq!(dest.get(3, 2), Some(Complex32::new(2.0, 0.0)));
    }

    #[test]
    fn test_quadrants_reassemble() {
        let m = numbered(6);
        let mut rebuilt = Matrix::new("R", 6, 6).unwrap();
        for (rows, cols) in [(0..3, 0..3), (0..3, 3..6), (3..6, 0..3), (3..6, 3..6)] {
            let q = extract(&m, rows.clone(), cols.clone()).unwrap();
            splice(&mut rebuilt, &q, rows, cols);
        }
        assert_eq!(rebuilt, m);
    }

    #[test]
    #[should_panic]
    fn test_splice_outside_dest_panics() {
        let mut dest = Matrix::new("D", 2, 2).unwrap();
        let src = numbered(2);
        splice(&mut dest, &src, 1..3, 0..2);
    }
}
