//! Evaluation of basis functions at many parameters.

use nalgebra::DMatrix;
use nurbskit_core::{NurbsError, Result};
use nurbskit_math::Scalar;

use super::basis::BasisTensor;
use super::knot::{find_degree, find_npts};

fn check_nodes<T: Scalar>(nodes: &[T], vector: &[T]) -> Result<()> {
    let (lower, upper) = (&vector[0], &vector[vector.len() - 1]);
    match nodes.iter().find(|node| *node < lower || *node > upper) {
        Some(node) => Err(NurbsError::Domain {
            value: node.as_f64(),
            lower: lower.as_f64(),
            upper: upper.as_f64(),
        }),
        None => Ok(()),
    }
}

/// Matrix `L[i, j] = N_{i,degree}(nodes[j])` of shape `(npts, nodes.len())`.
pub fn eval_spline_nodes<T: Scalar>(vector: &[T], nodes: &[T], degree: usize) -> Result<DMatrix<T>> {
    let npts = find_npts(vector)?;
    let maxdegree = find_degree(vector)?;
    check_nodes(nodes, vector)?;
    let tensor = BasisTensor::build(vector, degree)?;

    let mut result = DMatrix::zeros(npts + maxdegree - degree, nodes.len());
    for (j, node) in nodes.iter().enumerate() {
        let (first, values) = tensor.eval(node);
        for (y, value) in values.into_iter().enumerate() {
            result[(first + y, j)] = value;
        }
    }
    Ok(result)
}

/// Rational basis `R[i, j] = w_i N_i(u_j) / sum_k w_k N_k(u_j)`.
pub fn eval_rational_nodes<T: Scalar>(
    vector: &[T],
    weights: &[T],
    nodes: &[T],
    degree: usize,
) -> Result<DMatrix<T>> {
    let npts = find_npts(vector)?;
    if weights.len() != npts {
        return Err(NurbsError::InvalidOperation(format!(
            "{} weights for {} control points",
            weights.len(),
            npts
        )));
    }
    let mut result = eval_spline_nodes(vector, nodes, degree)?;
    for mut column in result.column_iter_mut() {
        let mut total = T::zero();
        for (value, weight) in column.iter_mut().zip(weights) {
            *value *= weight.clone();
            total += value.clone();
        }
        if total.is_zero() {
            return Err(NurbsError::InvalidOperation(
                "weighted basis vanishes at a node".into(),
            ));
        }
        for value in column.iter_mut() {
            *value /= total.clone();
        }
    }
    Ok(result)
}
