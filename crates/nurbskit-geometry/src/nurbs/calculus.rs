//! Derivatives of polynomial splines as linear maps.

use nalgebra::DMatrix;
use nurbskit_core::{NurbsError, Result};
use nurbskit_math::Scalar;

use super::knot::{derivate, find_degree, find_npts};
use super::operations::degree_increase_bezier_once;

/// Factors `a_i = p / (U_{i+p} - U_i)`, zero where the denominator vanishes.
pub fn difference_vector<T: Scalar>(vector: &[T]) -> Result<Vec<T>> {
    let degree = find_degree(vector)?;
    let npts = find_npts(vector)?;
    if degree == 0 {
        return Err(NurbsError::InvalidOperation(
            "difference factors need a positive degree".into(),
        ));
    }
    let p = T::from_usize(degree);
    Ok((0..=npts)
        .map(|i| {
            let denom = vector[i + degree].clone() - vector[i].clone();
            if denom.is_zero() {
                T::zero()
            } else {
                p.clone() / denom
            }
        })
        .collect())
}

/// Scaled forward differences, shape `(npts - 1, npts)`.
///
/// Row `k` is `a_{k+1} (P_{k+1} - P_k)`; rows facing a knot of full
/// multiplicity are zero.
pub fn difference_matrix<T: Scalar>(vector: &[T]) -> Result<DMatrix<T>> {
    let npts = find_npts(vector)?;
    let factors = difference_vector(vector)?;
    let mut matrix = DMatrix::zeros(npts - 1, npts);
    for k in 0..npts - 1 {
        matrix[(k, k)] = -factors[k + 1].clone();
        matrix[(k, k + 1)] = factors[k + 1].clone();
    }
    Ok(matrix)
}

/// Map from control points to those of the derivative.
///
/// The zero rows of [`difference_matrix`] are dropped, matching
/// [`derivate`]. A degree zero spline has a zero derivative on the
/// limits-only vector.
pub fn derivate_nonrational_spline<T: Scalar>(vector: &[T]) -> Result<DMatrix<T>> {
    let degree = find_degree(vector)?;
    let npts = find_npts(vector)?;
    if degree == 0 {
        return Ok(DMatrix::zeros(1, npts));
    }
    let differences = difference_matrix(vector)?;
    let rows: Vec<usize> = (0..npts - 1)
        .filter(|&k| !differences[(k, k + 1)].is_zero())
        .collect();
    let expected = find_npts(&derivate(vector)?)?;
    if rows.len() != expected {
        return Err(NurbsError::InvalidOperation(format!(
            "derivative has {} control points, vector expects {}",
            rows.len(),
            expected
        )));
    }
    Ok(differences.select_rows(rows.iter()))
}

/// Derivative of a Bezier curve.
///
/// With `reduce` the result has degree `p - 1`; otherwise it is elevated
/// back to degree `p` so it shares the knot vector of the curve.
pub fn derivate_nonrational_bezier<T: Scalar>(vector: &[T], reduce: bool) -> Result<DMatrix<T>> {
    let degree = find_degree(vector)?;
    let npts = find_npts(vector)?;
    if npts != degree + 1 {
        return Err(NurbsError::InvalidOperation(format!(
            "{} control points of degree {} is not a Bezier curve",
            npts, degree
        )));
    }
    if degree == 0 {
        return Ok(DMatrix::zeros(1, 1));
    }
    let width = vector[vector.len() - 1].clone() - vector[0].clone();
    let factor = T::from_usize(degree) / width;
    let mut matrix = DMatrix::zeros(degree, degree + 1);
    for i in 0..degree {
        matrix[(i, i)] = -factor.clone();
        matrix[(i, i + 1)] = factor.clone();
    }
    if reduce {
        return Ok(matrix);
    }
    let derived = derivate(vector)?;
    Ok(degree_increase_bezier_once(&derived)? * matrix)
}
