//! Galerkin projection between spline spaces.
//!
//! Integrals over the domain are computed piece by piece on the union of
//! both knot vectors, where every integrand is a polynomial. Each piece uses
//! an interpolatory quadrature whose weights come from inverting the
//! Bernstein matrix at the quadrature nodes.

use nalgebra::DMatrix;
use nurbskit_core::{NurbsError, Result};
use nurbskit_math::matrix::{binom, powi};
use nurbskit_math::{NumberKind, Scalar};

use super::eval::{eval_rational_nodes, eval_spline_nodes};
use super::knot::{find_degree, find_knots, find_npts};

/// Chebyshev nodes of the first kind on `[a, b]`, increasing.
pub fn chebyshev_nodes(npts: usize, a: f64, b: f64) -> Vec<f64> {
    f64::quadrature_nodes(npts, &a, &b)
}

/// Midpoints of `npts` equal sub-intervals of `[a, b]`.
pub fn uniform_nodes<T: Scalar>(npts: usize, a: &T, b: &T) -> Vec<T> {
    let width = b.clone() - a.clone();
    (0..npts)
        .map(|i| a.clone() + width.clone() * T::from_ratio((2 * i + 1) as i64, (2 * npts) as i64))
        .collect()
}

/// Bernstein basis of degree `npts - 1` at the quadrature nodes of `[0, 1]`.
///
/// Row `i` holds the values of `B_{i, npts-1}`.
pub fn interp_bezier_matrix<T: Scalar>(npts: usize) -> Result<DMatrix<T>> {
    if npts == 0 {
        return Err(NurbsError::InvalidOperation(
            "interpolation needs at least one node".into(),
        ));
    }
    let degree = npts - 1;
    let nodes = T::quadrature_nodes(npts, &T::zero(), &T::one());
    Ok(DMatrix::from_fn(npts, npts, |i, k| {
        let node = &nodes[k];
        let rest = T::one() - node.clone();
        T::from_usize(binom(degree, i)) * powi(node, i) * powi(&rest, degree - i)
    }))
}

/// Quadrature weights on `[0, 1]` exact for polynomials of degree `< npts`.
///
/// Every Bernstein polynomial of degree `npts - 1` integrates to `1 / npts`,
/// so with `B[basis, node]` the weights solve `B w = 1 / npts`.
pub fn integrator_array<T: Scalar>(npts: usize) -> Result<Vec<T>> {
    let bernstein = interp_bezier_matrix::<T>(npts)?;
    let inverse = T::invert(&bernstein)?;
    let share = T::from_ratio(1, npts as i64);
    Ok((0..npts)
        .map(|node| {
            inverse
                .row(node)
                .iter()
                .fold(T::zero(), |acc, value| acc + value.clone())
                * share.clone()
        })
        .collect())
}

/// Columns of `values` scaled by the quadrature weights of an interval of
/// width `length`.
fn weigh<T: Scalar>(values: &DMatrix<T>, quadrature: &[T], length: &T) -> DMatrix<T> {
    let mut weighted = values.clone();
    for (mut column, weight) in weighted.column_iter_mut().zip(quadrature) {
        let factor = weight.clone() * length.clone();
        for value in column.iter_mut() {
            *value *= factor.clone();
        }
    }
    weighted
}

/// Least-squares fit matrix `M = (F F^T)^{-1} F` with `F` the basis at `nodes`.
///
/// Control values of the best fit are `M * values`.
pub fn fit_matrix<T: Scalar>(
    vector: &[T],
    nodes: &[T],
    weights: Option<&[T]>,
) -> Result<DMatrix<T>> {
    let degree = find_degree(vector)?;
    let npts = find_npts(vector)?;
    if nodes.len() < npts {
        return Err(NurbsError::InvalidOperation(format!(
            "fitting {} control points needs at least as many nodes, got {}",
            npts,
            nodes.len()
        )));
    }
    let basis = match weights {
        Some(weights) => eval_rational_nodes(vector, weights, nodes, degree)?,
        None => eval_spline_nodes(vector, nodes, degree)?,
    };
    let gram = &basis * basis.transpose();
    log::trace!(
        "fit_matrix: {:?} normal equations of size {}",
        NumberKind::of(gram.iter()),
        npts
    );
    T::solve(&gram, &basis)
}

/// Control values of the spline that best fits `values` sampled at `nodes`.
pub fn fit_function<T: Scalar>(vector: &[T], nodes: &[T], values: &[T]) -> Result<Vec<T>> {
    if nodes.len() != values.len() {
        return Err(NurbsError::InvalidOperation(format!(
            "{} nodes for {} values",
            nodes.len(),
            values.len()
        )));
    }
    let matrix = fit_matrix(vector, nodes, None)?;
    let column = DMatrix::from_column_slice(values.len(), 1, values);
    Ok((matrix * column).iter().cloned().collect())
}

/// Galerkin projection between two rational spline spaces on the same domain.
///
/// Returns `(T, E)`. `T` maps old control values to the projected ones and
/// `E = A - B T` gives the squared L2 error `P^T E P` of the projection,
/// where `A`, `B` and `C` are the Gram matrices of old/old, old/new and
/// new/new basis functions.
pub fn func2func<T: Scalar>(
    oldvector: &[T],
    oldweights: &[T],
    newvector: &[T],
    newweights: &[T],
) -> Result<(DMatrix<T>, DMatrix<T>)> {
    let degold = find_degree(oldvector)?;
    let degnew = find_degree(newvector)?;
    let nptsold = find_npts(oldvector)?;
    let nptsnew = find_npts(newvector)?;
    let same_start = oldvector[0] == newvector[0];
    let same_end = oldvector[oldvector.len() - 1] == newvector[newvector.len() - 1];
    if !same_start || !same_end {
        return Err(NurbsError::InvalidOperation(
            "projection between different domains".into(),
        ));
    }

    let mut allknots = find_knots(oldvector)?;
    allknots.extend(find_knots(newvector)?);
    allknots.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    allknots.dedup();

    let nnodes = degold + degnew + 3;
    let quadrature = integrator_array::<T>(nnodes)?;

    let mut gram_old = DMatrix::<T>::zeros(nptsold, nptsold);
    let mut gram_mixed = DMatrix::<T>::zeros(nptsold, nptsnew);
    let mut gram_new = DMatrix::<T>::zeros(nptsnew, nptsnew);
    for pair in allknots.windows(2) {
        let (start, end) = (&pair[0], &pair[1]);
        let length = end.clone() - start.clone();
        let nodes = T::quadrature_nodes(nnodes, start, end);
        let fold = eval_rational_nodes(oldvector, oldweights, &nodes, degold)?;
        let fnew = eval_rational_nodes(newvector, newweights, &nodes, degnew)?;

        let weighted = weigh(&fold, &quadrature, &length);
        gram_old += &weighted * fold.transpose();
        gram_mixed += &weighted * fnew.transpose();
        gram_new += weigh(&fnew, &quadrature, &length) * fnew.transpose();
    }

    let transform = T::solve(&gram_new, &gram_mixed.transpose())?;
    let error = gram_old - &gram_mixed * &transform;
    log::debug!(
        "func2func: projected {} -> {} control points over {} intervals",
        nptsold,
        nptsnew,
        allknots.len() - 1
    );
    Ok((transform, error))
}

/// Galerkin projection between two polynomial spline spaces.
pub fn spline2spline<T: Scalar>(oldvector: &[T], newvector: &[T]) -> Result<(DMatrix<T>, DMatrix<T>)> {
    let oldweights = vec![T::one(); find_npts(oldvector)?];
    let newweights = vec![T::one(); find_npts(newvector)?];
    func2func(oldvector, &oldweights, newvector, &newweights)
}
