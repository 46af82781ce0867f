//! Linear maps on control points.
//!
//! Every operation returns a matrix `M` so that the control points of the
//! transformed spline are `M * P`, with `P` holding one control point per
//! row. Knot insertion and degree elevation are exact; knot removal and
//! degree reduction are least-squares projections.

use nalgebra::DMatrix;
use nurbskit_core::{NurbsError, Result};
use nurbskit_math::matrix::stack_rows;
use nurbskit_math::Scalar;

use super::knot::{
    decrease_degree, find_degree, find_knots, find_mult, find_npts, find_span, increase_degree,
    insert_knots, nodes_to_insert, remove_knots, split,
};
use super::least_square::spline2spline;

/// Insert one knot (Boehm). The matrix has shape `(npts + 1, npts)`.
pub fn one_knot_insert<T: Scalar>(vector: &[T], node: &T) -> Result<DMatrix<T>> {
    let degree = find_degree(vector)?;
    let npts = find_npts(vector)?;
    let (lower, upper) = (&vector[0], &vector[vector.len() - 1]);
    if node <= lower || node >= upper {
        return Err(NurbsError::Domain {
            value: node.as_f64(),
            lower: lower.as_f64(),
            upper: upper.as_f64(),
        });
    }
    let mult = find_mult(node, vector)?;
    if mult > degree {
        return Err(NurbsError::InvalidKnotVector(format!(
            "knot {} already has multiplicity {}",
            node, mult
        )));
    }
    let span = find_span(node, vector)?;

    let mut matrix = DMatrix::zeros(npts + 1, npts);
    for i in 0..=span - degree {
        matrix[(i, i)] = T::one();
    }
    for i in span - mult..npts {
        matrix[(i + 1, i)] = T::one();
    }
    for i in span + 1 - degree..=span {
        let alpha = (node.clone() - vector[i].clone())
            / (vector[i + degree].clone() - vector[i].clone());
        matrix[(i, i)] = alpha.clone();
        matrix[(i, i - 1)] = T::one() - alpha;
    }
    Ok(matrix)
}

/// Insert every entry of `nodes`. Nodes on the domain boundary are ignored.
pub fn knot_insert<T: Scalar>(vector: &[T], nodes: &[T]) -> Result<DMatrix<T>> {
    let npts = find_npts(vector)?;
    let (lower, upper) = (&vector[0], &vector[vector.len() - 1]);
    if let Some(node) = nodes.iter().find(|node| *node < lower || *node > upper) {
        return Err(NurbsError::Domain {
            value: node.as_f64(),
            lower: lower.as_f64(),
            upper: upper.as_f64(),
        });
    }
    let mut matrix = DMatrix::identity(npts, npts);
    let mut current = vector.to_vec();
    for node in nodes.iter().filter(|node| *node != lower && *node != upper) {
        let step = one_knot_insert(&current, node)?;
        matrix = step * matrix;
        current = insert_knots(&current, std::slice::from_ref(node))?;
    }
    Ok(matrix)
}

/// Remove one copy of every entry of `nodes` by least squares.
pub fn knot_remove<T: Scalar>(vector: &[T], nodes: &[T]) -> Result<DMatrix<T>> {
    let newvector = remove_knots(vector, nodes)?;
    let (matrix, _) = spline2spline(vector, &newvector)?;
    Ok(matrix)
}

/// Elevate a Bezier curve by one degree. Shape `(degree + 2, degree + 1)`.
pub fn degree_increase_bezier_once<T: Scalar>(vector: &[T]) -> Result<DMatrix<T>> {
    let degree = find_degree(vector)?;
    let npts = find_npts(vector)?;
    if npts != degree + 1 {
        return Err(NurbsError::InvalidOperation(format!(
            "{} control points of degree {} is not a Bezier curve",
            npts, degree
        )));
    }
    let mut matrix = DMatrix::zeros(degree + 2, degree + 1);
    matrix[(0, 0)] = T::one();
    matrix[(degree + 1, degree)] = T::one();
    for i in 1..=degree {
        let alpha = T::from_ratio(i as i64, (degree + 1) as i64);
        matrix[(i, i - 1)] = alpha.clone();
        matrix[(i, i)] = T::one() - alpha;
    }
    Ok(matrix)
}

/// Elevate a Bezier curve by `times` degrees.
pub fn degree_increase_bezier<T: Scalar>(vector: &[T], times: usize) -> Result<DMatrix<T>> {
    let npts = find_npts(vector)?;
    let mut matrix = DMatrix::identity(npts, npts);
    let mut current = vector.to_vec();
    for _ in 0..times {
        matrix = degree_increase_bezier_once(&current)? * matrix;
        current = increase_degree(&current, 1)?;
    }
    Ok(matrix)
}

/// Elevate a spline by `times` degrees without changing its shape.
///
/// The spline is split into Bezier pieces, every piece is elevated and the
/// continuity at the former knots is restored by removing the knots that
/// splitting introduced.
pub fn degree_increase<T: Scalar>(vector: &[T], times: usize) -> Result<DMatrix<T>> {
    let degree = find_degree(vector)?;
    let npts = find_npts(vector)?;
    if times == 0 {
        return Ok(DMatrix::identity(npts, npts));
    }
    if npts == degree + 1 {
        return degree_increase_bezier(vector, times);
    }

    let nodes = find_knots(vector)?;
    let pieces = split(vector, &nodes)?;
    let blocks = split_curve(vector, &nodes)?;
    let elevated = pieces
        .iter()
        .zip(&blocks)
        .map(|(piece, block)| Ok(degree_increase_bezier(piece, times)? * block))
        .collect::<Result<Vec<_>>>()?;
    let bigmatrix = stack_rows(&elevated)?;

    let mut inserted = Vec::new();
    for node in &nodes[1..nodes.len() - 1] {
        let mult = find_mult(node, vector)?;
        inserted.extend(std::iter::repeat(node.clone()).take(degree + 1 - mult));
    }
    let bigvector = insert_knots(vector, &inserted)?;
    let incbigvector = increase_degree(&bigvector, times)?;
    let removal = knot_remove(&incbigvector, &inserted)?;
    log::trace!(
        "degree_increase: {} pieces, {} joining knots removed",
        pieces.len(),
        inserted.len()
    );
    Ok(removal * bigmatrix)
}

/// Reduce the degree by `times` with a least-squares projection.
pub fn degree_decrease<T: Scalar>(vector: &[T], times: usize) -> Result<DMatrix<T>> {
    let newvector = decrease_degree(vector, times)?;
    let (matrix, _) = spline2spline(vector, &newvector)?;
    Ok(matrix)
}

/// Matrices extracting the control points of the pieces obtained by
/// splitting at `nodes`, one block of shape `(npts_piece, npts)` per piece.
pub fn split_curve<T: Scalar>(vector: &[T], nodes: &[T]) -> Result<Vec<DMatrix<T>>> {
    let degree = find_degree(vector)?;
    let (lower, upper) = (&vector[0], &vector[vector.len() - 1]);
    let mut cuts: Vec<T> = nodes
        .iter()
        .filter(|node| *node != lower && *node != upper)
        .cloned()
        .collect();
    cuts.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    cuts.dedup();

    let mut many = Vec::new();
    for node in &cuts {
        let mult = find_mult(node, vector)?;
        many.extend(std::iter::repeat(node.clone()).take(degree + 1 - mult.min(degree + 1)));
    }
    let bigvector = insert_knots(vector, &many)?;
    let bigmatrix = knot_insert(vector, &many)?;

    split(vector, &cuts)?
        .iter()
        .map(|piece| {
            let start = bigvector.partition_point(|knot| *knot < piece[0]);
            let rows = find_npts(piece)?;
            Ok(bigmatrix.rows(start, rows).into_owned())
        })
        .collect()
}

/// Exact map from the spline space of `oldvector` to that of `newvector`.
///
/// Elevates the degree first and then inserts the missing knots. Fails if
/// the target space does not contain the source one.
pub fn matrix_transformation<T: Scalar>(oldvector: &[T], newvector: &[T]) -> Result<DMatrix<T>> {
    let degold = find_degree(oldvector)?;
    let degnew = find_degree(newvector)?;
    let same_start = oldvector[0] == newvector[0];
    let same_end = oldvector[oldvector.len() - 1] == newvector[newvector.len() - 1];
    if !same_start || !same_end {
        return Err(NurbsError::InvalidOperation(
            "transformation between different domains".into(),
        ));
    }
    if degnew < degold {
        return Err(NurbsError::InvalidOperation(format!(
            "cannot reach degree {} from degree {} exactly",
            degnew, degold
        )));
    }
    let elevation = degree_increase(oldvector, degnew - degold)?;
    let elevated = increase_degree(oldvector, degnew - degold)?;
    let nodes = nodes_to_insert(&elevated, newvector)?;
    let insertion = knot_insert(&elevated, &nodes)?;
    Ok(insertion * elevation)
}
