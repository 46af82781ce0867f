//! Exact linear solver over integers and rationals.

use nalgebra::DMatrix;
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use nurbskit_core::{NurbsError, Result};

use crate::scalar::NumberKind;

/// `row <- row * pivot_value - pivot_row * row[col]`, then divide by the row gcd.
fn eliminate(row: &mut [BigInt], pivot_row: &[BigInt], col: usize) {
    let factor = row[col].clone();
    if factor.is_zero() {
        return;
    }
    let pivot = pivot_row[col].clone();
    for (entry, p) in row.iter_mut().zip(pivot_row) {
        *entry = &*entry * &pivot - p * &factor;
    }
    let gcd = row.iter().fold(BigInt::zero(), |acc, value| acc.gcd(value));
    if !gcd.is_zero() && !gcd.is_one() {
        for entry in row.iter_mut() {
            *entry = &*entry / &gcd;
        }
    }
}

/// Invert an integer matrix without leaving the integers.
///
/// Gauss-Jordan elimination with partial pivoting, dividing every row by the
/// gcd of its entries after each step. Returns `(diagonal, inverse)` with the
/// contract `inverse * matrix = diag(diagonal)`.
pub fn invert_integer_matrix(matrix: &DMatrix<BigInt>) -> Result<(Vec<BigInt>, DMatrix<BigInt>)> {
    let side = matrix.nrows();
    if side != matrix.ncols() {
        return Err(NurbsError::InvalidOperation(format!(
            "cannot invert a non-square {}x{} matrix",
            side,
            matrix.ncols()
        )));
    }

    let mut rows: Vec<Vec<BigInt>> = (0..side)
        .map(|i| {
            let mut row: Vec<BigInt> = (0..side).map(|j| matrix[(i, j)].clone()).collect();
            row.extend((0..side).map(|j| if i == j { BigInt::one() } else { BigInt::zero() }));
            row
        })
        .collect();

    for k in 0..side {
        let mut index = k;
        for i in (k + 1)..side {
            if rows[i][k].abs() > rows[index][k].abs() {
                index = i;
            }
        }
        if rows[index][k].is_zero() {
            return Err(NurbsError::SingularMatrix(format!(
                "no pivot in column {} of an integer {}x{} matrix",
                k, side, side
            )));
        }
        rows.swap(k, index);
        let (upper, lower) = rows.split_at_mut(k + 1);
        for row in lower.iter_mut() {
            eliminate(row, &upper[k], k);
        }
    }

    for k in (1..side).rev() {
        let (upper, lower) = rows.split_at_mut(k);
        for row in upper.iter_mut().rev() {
            eliminate(row, &lower[0], k);
        }
    }

    let diagonal = (0..side).map(|i| rows[i][i].clone()).collect();
    let inverse = DMatrix::from_fn(side, side, |i, j| rows[i][side + j].clone());
    Ok((diagonal, inverse))
}

/// Scale every row by the lcm of its denominators.
///
/// Returns `(scales, integers)` with `integers = diag(scales) * matrix`.
pub fn matrix_fraction2integer(matrix: &DMatrix<BigRational>) -> (Vec<BigInt>, DMatrix<BigInt>) {
    let scales: Vec<BigInt> = matrix
        .row_iter()
        .map(|row| {
            row.iter()
                .fold(BigInt::one(), |acc, value| acc.lcm(value.denom()))
        })
        .collect();
    let integers = DMatrix::from_fn(matrix.nrows(), matrix.ncols(), |i, j| {
        (&matrix[(i, j)] * BigRational::from_integer(scales[i].clone())).to_integer()
    });
    (scales, integers)
}

/// Invert a rational matrix exactly.
pub fn invert_fraction_matrix(matrix: &DMatrix<BigRational>) -> Result<DMatrix<BigRational>> {
    let side = matrix.nrows();
    let kind = NumberKind::of(matrix.iter());
    log::trace!("invert_fraction_matrix: {}x{} {:?} matrix", side, matrix.ncols(), kind);
    let (upper, integers) = match kind {
        NumberKind::Integer => (
            vec![BigInt::one(); side],
            matrix.map(|value| value.to_integer()),
        ),
        _ => matrix_fraction2integer(matrix),
    };
    let (lower, inverse) = invert_integer_matrix(&integers)?;
    Ok(DMatrix::from_fn(side, side, |i, j| {
        BigRational::new(&inverse[(i, j)] * &upper[j], lower[i].clone())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::Scalar;

    fn int_matrix(side: usize, values: &[i64]) -> DMatrix<BigInt> {
        DMatrix::from_row_slice(side, side, &values.iter().map(|&v| BigInt::from(v)).collect::<Vec<_>>())
    }

    #[test]
    fn test_invert_integer_contract() {
        let matrix = int_matrix(3, &[2, 1, 0, 1, 3, 1, 0, 1, 4]);
        let (diagonal, inverse) = invert_integer_matrix(&matrix).unwrap();
        let product = &inverse * &matrix;
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { diagonal[i].clone() } else { BigInt::zero() };
                assert_eq!(product[(i, j)], expected, "entry ({}, {})", i, j);
            }
        }
    }

    #[test]
    fn test_invert_integer_needs_pivoting() {
        let matrix = int_matrix(2, &[0, 1, 1, 0]);
        let (diagonal, inverse) = invert_integer_matrix(&matrix).unwrap();
        let product = &inverse * &matrix;
        assert_eq!(product[(0, 1)], BigInt::zero());
        assert_eq!(product[(0, 0)], diagonal[0]);
    }

    #[test]
    fn test_invert_integer_singular() {
        let matrix = int_matrix(2, &[1, 2, 2, 4]);
        assert!(matches!(
            invert_integer_matrix(&matrix),
            Err(NurbsError::SingularMatrix(_))
        ));
    }

    #[test]
    fn test_fraction2integer_scales_rows() {
        let matrix = DMatrix::from_row_slice(
            1,
            2,
            &[BigRational::from_ratio(1, 2), BigRational::from_ratio(1, 3)],
        );
        let (scales, integers) = matrix_fraction2integer(&matrix);
        assert_eq!(scales, vec![BigInt::from(6)]);
        assert_eq!(integers[(0, 0)], BigInt::from(3));
        assert_eq!(integers[(0, 1)], BigInt::from(2));
    }

    #[test]
    fn test_invert_fraction_matrix_is_exact_inverse() {
        let values = [(1, 2), (1, 3), (1, 4), (1, 5)];
        let entries: Vec<BigRational> = values
            .iter()
            .map(|&(n, d)| BigRational::from_ratio(n, d))
            .collect();
        let matrix = DMatrix::from_row_slice(2, 2, &entries);
        let inverse = invert_fraction_matrix(&matrix).unwrap();
        let product = &inverse * &matrix;
        assert_eq!(product, DMatrix::identity(2, 2));
    }
}
