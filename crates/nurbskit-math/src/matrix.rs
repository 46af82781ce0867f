//! Dense matrix helpers shared by the transformation builders.

use nalgebra::DMatrix;
use nurbskit_core::{NurbsError, Result};

use crate::scalar::Scalar;

/// Binomial coefficient `(n, i)`, zero outside `0..=n`.
pub fn binom(n: usize, i: usize) -> usize {
    if i > n {
        return 0;
    }
    let i = i.min(n - i);
    (0..i).fold(1, |acc, j| acc * (n - j) / (j + 1))
}

/// `value^exponent` by repeated multiplication, exact for rationals.
pub fn powi<T: Scalar>(value: &T, exponent: usize) -> T {
    (0..exponent).fold(T::one(), |acc, _| acc * value.clone())
}

/// Stack blocks sharing the same column count on top of each other.
pub fn stack_rows<T: Scalar>(blocks: &[DMatrix<T>]) -> Result<DMatrix<T>> {
    let ncols = blocks.first().map_or(0, |block| block.ncols());
    if let Some(block) = blocks.iter().find(|block| block.ncols() != ncols) {
        return Err(NurbsError::InvalidOperation(format!(
            "cannot stack a block with {} columns under blocks with {}",
            block.ncols(),
            ncols
        )));
    }
    let nrows = blocks.iter().map(|block| block.nrows()).sum();
    let mut stacked = DMatrix::zeros(nrows, ncols);
    let mut offset = 0;
    for block in blocks {
        stacked
            .rows_mut(offset, block.nrows())
            .copy_from(block);
        offset += block.nrows();
    }
    Ok(stacked)
}

/// Copy of `matrix` with every entry rounded to `f64`.
pub fn to_f64<T: Scalar>(matrix: &DMatrix<T>) -> DMatrix<f64> {
    matrix.map(|value| value.as_f64())
}
