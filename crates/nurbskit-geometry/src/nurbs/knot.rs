//! Knot vector algebra.
//!
//! The free functions work on plain slices and accept *piecewise* vectors,
//! where an interior value may repeat `degree + 1` times and split the
//! spline into independent pieces. [`KnotVector`] wraps a slice that
//! satisfies the strict invariant: boundaries repeat exactly `degree + 1`
//! times and interior values at most `degree` times.

use std::cmp::Ordering;

use nurbskit_core::{NurbsError, Result, Tolerance, Validate};
use nurbskit_math::Scalar;
use serde::{Deserialize, Serialize};

/// Consecutive runs of equal values as `(value, count)`.
fn runs<T: Scalar>(vector: &[T]) -> Vec<(T, usize)> {
    let mut runs: Vec<(T, usize)> = Vec::new();
    for knot in vector {
        match runs.last_mut() {
            Some((value, count)) if value == knot => *count += 1,
            _ => runs.push((knot.clone(), 1)),
        }
    }
    runs
}

fn count<T: Scalar>(vector: &[T], value: &T) -> usize {
    vector.iter().filter(|knot| *knot == value).count()
}

fn sort_values<T: Scalar>(values: &mut [T]) {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
}

/// Check the invariant and return the degree.
///
/// `max_interior` is the allowed interior multiplicity minus the degree:
/// `0` for the strict invariant, `1` for piecewise vectors.
fn check_vector<T: Scalar>(vector: &[T], max_interior: usize) -> Result<usize> {
    if vector.len() < 2 {
        return Err(NurbsError::InvalidKnotVector(format!(
            "needs at least two knots, got {}",
            vector.len()
        )));
    }
    if vector.iter().any(|knot| knot.partial_cmp(knot).is_none()) {
        return Err(NurbsError::InvalidKnotVector("contains NaN".into()));
    }
    if let Some(i) = (0..vector.len() - 1).find(|&i| vector[i] > vector[i + 1]) {
        return Err(NurbsError::InvalidKnotVector(format!(
            "decreasing at index {}: {} > {}",
            i,
            vector[i],
            vector[i + 1]
        )));
    }
    let runs = runs(vector);
    if runs.len() < 2 {
        return Err(NurbsError::InvalidKnotVector(
            "first and last knots are equal".into(),
        ));
    }
    let degree = runs[0].1 - 1;
    let (last, last_count) = &runs[runs.len() - 1];
    if *last_count != degree + 1 {
        return Err(NurbsError::InvalidKnotVector(format!(
            "last knot {} repeats {} times, expected {}",
            last,
            last_count,
            degree + 1
        )));
    }
    let limit = degree + max_interior;
    if let Some((value, mult)) = runs[1..runs.len() - 1].iter().find(|(_, c)| *c > limit) {
        return Err(NurbsError::InvalidKnotVector(format!(
            "interior knot {} repeats {} times, degree is {}",
            value, mult, degree
        )));
    }
    Ok(degree)
}

fn check_domain<T: Scalar>(node: &T, vector: &[T]) -> Result<()> {
    let (lower, upper) = (&vector[0], &vector[vector.len() - 1]);
    if node < lower || node > upper {
        return Err(NurbsError::Domain {
            value: node.as_f64(),
            lower: lower.as_f64(),
            upper: upper.as_f64(),
        });
    }
    Ok(())
}

fn check_nodes<T: Scalar>(nodes: &[T], vector: &[T]) -> Result<()> {
    nodes.iter().try_for_each(|node| check_domain(node, vector))
}

/// Whether `vector` satisfies the strict knot vector invariant.
pub fn is_valid<T: Scalar>(vector: &[T]) -> bool {
    check_vector(vector, 0).is_ok()
}

/// Whether `vector` is valid when interior knots may split the spline.
pub fn is_piecewise_valid<T: Scalar>(vector: &[T]) -> bool {
    check_vector(vector, 1).is_ok()
}

pub fn find_degree<T: Scalar>(vector: &[T]) -> Result<usize> {
    check_vector(vector, 1)
}

pub fn find_npts<T: Scalar>(vector: &[T]) -> Result<usize> {
    let degree = check_vector(vector, 1)?;
    Ok(vector.len() - degree - 1)
}

/// Index of the knot interval containing `node`.
///
/// Binary search for the last knot `<= node`, restricted to
/// `[degree, npts]`, so the upper domain boundary maps to `npts`.
pub fn find_span<T: Scalar>(node: &T, vector: &[T]) -> Result<usize> {
    let degree = check_vector(vector, 1)?;
    check_domain(node, vector)?;
    let npts = vector.len() - degree - 1;
    let last_le = vector.partition_point(|knot| knot <= node) - 1;
    Ok(last_le.clamp(degree, npts))
}

/// Number of knots equal to `node` within the knot tolerance.
pub fn find_mult<T: Scalar>(node: &T, vector: &[T]) -> Result<usize> {
    check_vector(vector, 1)?;
    check_domain(node, vector)?;
    let tolerance = Tolerance::default();
    let node = node.as_f64();
    Ok(vector
        .iter()
        .filter(|knot| tolerance.knot_eq(knot.as_f64(), node))
        .count())
}

/// Distinct knot values in increasing order.
pub fn find_knots<T: Scalar>(vector: &[T]) -> Result<Vec<T>> {
    check_vector(vector, 1)?;
    Ok(runs(vector).into_iter().map(|(value, _)| value).collect())
}

pub fn insert_knots<T: Scalar>(vector: &[T], nodes: &[T]) -> Result<Vec<T>> {
    check_vector(vector, 1)?;
    check_nodes(nodes, vector)?;
    let mut merged: Vec<T> = vector.iter().chain(nodes).cloned().collect();
    sort_values(&mut merged);
    check_vector(&merged, 1)?;
    Ok(merged)
}

/// Remove one occurrence of every entry of `nodes`.
pub fn remove_knots<T: Scalar>(vector: &[T], nodes: &[T]) -> Result<Vec<T>> {
    check_vector(vector, 1)?;
    check_nodes(nodes, vector)?;
    let mut reduced = vector.to_vec();
    for node in nodes {
        let index = reduced
            .iter()
            .position(|knot| knot == node)
            .ok_or_else(|| NurbsError::KnotNotFound(format!("{} is not in the vector", node)))?;
        reduced.remove(index);
    }
    check_vector(&reduced, 1)?;
    Ok(reduced)
}

fn combine<T: Scalar>(
    vectora: &[T],
    vectorb: &[T],
    pick: impl Fn(usize, usize) -> usize,
) -> Result<Vec<T>> {
    check_vector(vectora, 1)?;
    check_vector(vectorb, 1)?;
    let same_start = vectora[0] == vectorb[0];
    let same_end = vectora[vectora.len() - 1] == vectorb[vectorb.len() - 1];
    if !same_start || !same_end {
        return Err(NurbsError::InvalidOperation(
            "knot vectors have different domains".into(),
        ));
    }
    let mut values: Vec<T> = vectora.iter().chain(vectorb).cloned().collect();
    sort_values(&mut values);
    values.dedup();
    let mut combined = Vec::new();
    for value in values {
        let mult = pick(count(vectora, &value), count(vectorb, &value));
        combined.extend(std::iter::repeat(value).take(mult));
    }
    check_vector(&combined, 1)?;
    Ok(combined)
}

/// Union of two vectors on the same domain: per-knot maximum multiplicity.
pub fn unite_vectors<T: Scalar>(vectora: &[T], vectorb: &[T]) -> Result<Vec<T>> {
    combine(vectora, vectorb, usize::max)
}

/// Intersection of two vectors on the same domain: per-knot minimum multiplicity.
pub fn intersect_vectors<T: Scalar>(vectora: &[T], vectorb: &[T]) -> Result<Vec<T>> {
    combine(vectora, vectorb, usize::min)
}

/// Partition `vector` at `nodes` into independent sub-vectors.
///
/// ```text
/// split([0, 0, 0.5, 1, 1], [0.25]) = [[0, 0, 0.25, 0.25], [0.25, 0.25, 0.5, 1, 1]]
/// ```
pub fn split<T: Scalar>(vector: &[T], nodes: &[T]) -> Result<Vec<Vec<T>>> {
    let degree = check_vector(vector, 1)?;
    check_nodes(nodes, vector)?;
    let mut cuts: Vec<T> = nodes.to_vec();
    cuts.push(vector[0].clone());
    cuts.push(vector[vector.len() - 1].clone());
    sort_values(&mut cuts);
    cuts.dedup();

    Ok(cuts
        .windows(2)
        .map(|pair| {
            let (a, b) = (&pair[0], &pair[1]);
            let mut piece: Vec<T> = std::iter::repeat(a.clone()).take(degree + 1).collect();
            piece.extend(vector.iter().filter(|knot| *knot > a && *knot < b).cloned());
            piece.extend(std::iter::repeat(b.clone()).take(degree + 1));
            piece
        })
        .collect())
}

/// Knots to insert in `vectora` to obtain `vectorb`.
pub fn nodes_to_insert<T: Scalar>(vectora: &[T], vectorb: &[T]) -> Result<Vec<T>> {
    let degreea = check_vector(vectora, 1)?;
    let degreeb = check_vector(vectorb, 1)?;
    if degreea != degreeb {
        return Err(NurbsError::InvalidOperation(format!(
            "cannot reach degree {} by knot insertion from degree {}",
            degreeb, degreea
        )));
    }
    if let Some((value, _)) = runs(vectora)
        .into_iter()
        .find(|(value, mult)| count(vectorb, value) < *mult)
    {
        return Err(NurbsError::InvalidOperation(format!(
            "knot {} of the source is missing from the target",
            value
        )));
    }
    let mut nodes = Vec::new();
    for (value, multb) in runs(vectorb) {
        let multa = count(vectora, &value);
        nodes.extend(std::iter::repeat(value).take(multb - multa));
    }
    Ok(nodes)
}

/// Knot vector of the first derivative.
///
/// Drops one copy of every knot repeated `degree + 1` times; a degree zero
/// vector collapses to its two limits.
pub fn derivate<T: Scalar>(vector: &[T]) -> Result<Vec<T>> {
    let degree = check_vector(vector, 1)?;
    if degree == 0 {
        return Ok(vec![vector[0].clone(), vector[vector.len() - 1].clone()]);
    }
    let mut derived = Vec::with_capacity(vector.len());
    for (value, mult) in runs(vector) {
        let keep = if mult == degree + 1 { mult - 1 } else { mult };
        derived.extend(std::iter::repeat(value).take(keep));
    }
    check_vector(&derived, 1)?;
    Ok(derived)
}

/// Knot vector of the same spline space elevated by `times` degrees.
pub fn increase_degree<T: Scalar>(vector: &[T], times: usize) -> Result<Vec<T>> {
    check_vector(vector, 1)?;
    let mut elevated = Vec::with_capacity(vector.len());
    for (value, mult) in runs(vector) {
        elevated.extend(std::iter::repeat(value).take(mult + times));
    }
    Ok(elevated)
}

/// Knot vector with `times` fewer degrees: every knot loses `times` copies.
pub fn decrease_degree<T: Scalar>(vector: &[T], times: usize) -> Result<Vec<T>> {
    let degree = check_vector(vector, 1)?;
    if times > degree {
        return Err(NurbsError::InvalidOperation(format!(
            "cannot decrease degree {} by {}",
            degree, times
        )));
    }
    let mut reduced = Vec::with_capacity(vector.len());
    for (value, mult) in runs(vector) {
        reduced.extend(std::iter::repeat(value).take(mult.saturating_sub(times)));
    }
    check_vector(&reduced, 1)?;
    Ok(reduced)
}

/// A knot vector satisfying the strict invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<T>", into = "Vec<T>")]
#[serde(bound(
    serialize = "T: Scalar + Serialize",
    deserialize = "T: Scalar + Deserialize<'de>"
))]
pub struct KnotVector<T = f64> {
    knots: Vec<T>,
}

impl<T: Scalar> KnotVector<T> {
    pub fn new(knots: Vec<T>) -> Result<Self> {
        check_vector(&knots, 0)?;
        Ok(Self { knots })
    }

    /// Bezier knot vector `[0; degree+1] ++ [1; degree+1]`.
    pub fn bezier(degree: usize) -> Self {
        let mut knots = vec![T::zero(); degree + 1];
        knots.extend(std::iter::repeat(T::one()).take(degree + 1));
        Self { knots }
    }

    /// Clamped vector on `[0, 1]` with equally spaced interior knots.
    pub fn uniform(npts: usize, degree: usize) -> Result<Self> {
        if npts <= degree {
            return Err(NurbsError::InvalidKnotVector(format!(
                "{} control points cannot carry degree {}",
                npts, degree
            )));
        }
        let segments = npts - degree;
        let mut knots = vec![T::zero(); degree + 1];
        knots.extend((1..segments).map(|i| T::from_ratio(i as i64, segments as i64)));
        knots.extend(std::iter::repeat(T::one()).take(degree + 1));
        Ok(Self { knots })
    }

    pub fn as_slice(&self) -> &[T] {
        &self.knots
    }

    pub fn len(&self) -> usize {
        self.knots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.knots.is_empty()
    }

    pub fn degree(&self) -> usize {
        runs(&self.knots)[0].1 - 1
    }

    pub fn npts(&self) -> usize {
        self.knots.len() - self.degree() - 1
    }

    /// Domain `(first, last)`.
    pub fn limits(&self) -> (T, T) {
        (self.knots[0].clone(), self.knots[self.knots.len() - 1].clone())
    }

    pub fn knots(&self) -> Vec<T> {
        runs(&self.knots).into_iter().map(|(value, _)| value).collect()
    }

    pub fn span(&self, node: &T) -> Result<usize> {
        find_span(node, &self.knots)
    }

    pub fn mult(&self, node: &T) -> Result<usize> {
        find_mult(node, &self.knots)
    }

    pub fn insert(&self, nodes: &[T]) -> Result<Self> {
        Self::new(insert_knots(&self.knots, nodes)?)
    }

    pub fn remove(&self, nodes: &[T]) -> Result<Self> {
        Self::new(remove_knots(&self.knots, nodes)?)
    }

    pub fn split(&self, nodes: &[T]) -> Result<Vec<Self>> {
        split(&self.knots, nodes)?.into_iter().map(Self::new).collect()
    }

    pub fn unite(&self, other: &Self) -> Result<Self> {
        Self::new(unite_vectors(&self.knots, &other.knots)?)
    }

    pub fn intersect(&self, other: &Self) -> Result<Self> {
        Self::new(intersect_vectors(&self.knots, &other.knots)?)
    }

    pub fn derivative(&self) -> Result<Self> {
        Self::new(derivate(&self.knots)?)
    }

    pub fn increase_degree(&self, times: usize) -> Result<Self> {
        Self::new(increase_degree(&self.knots, times)?)
    }

    pub fn decrease_degree(&self, times: usize) -> Result<Self> {
        Self::new(decrease_degree(&self.knots, times)?)
    }
}

impl<T: Scalar> Validate for KnotVector<T> {
    fn validate(&self) -> Result<()> {
        check_vector(&self.knots, 0).map(|_| ())
    }
}

impl<T: Scalar> TryFrom<Vec<T>> for KnotVector<T> {
    type Error = NurbsError;

    fn try_from(knots: Vec<T>) -> Result<Self> {
        Self::new(knots)
    }
}

impl<T> From<KnotVector<T>> for Vec<T> {
    fn from(vector: KnotVector<T>) -> Self {
        vector.knots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<f64> {
        vec![0.0, 0.0, 0.2, 0.4, 0.5, 0.6, 0.8, 1.0, 1.0]
    }

    #[test]
    fn test_validity() {
        assert!(is_valid(&[0.0, 0.0, 1.0, 1.0]));
        assert!(is_valid(&[0.0, 0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0, 1.0]));
        assert!(!is_valid(&[0.0, 0.0, 0.0, 1.0, 1.0]));
        assert!(!is_valid(&[0.0, 0.0, 1.0, 1.0, 1.0]));
        assert!(!is_valid(&[0.0, 0.0, 0.7, 0.2, 1.0, 1.0]));
        assert!(!is_valid(&[1.0, 1.0]));
        assert!(!is_valid(&[0.0, 0.0, 0.0, 0.5, 0.5, 0.5, 1.0, 1.0, 1.0]));
        assert!(is_piecewise_valid(&[0.0, 0.0, 0.0, 0.5, 0.5, 0.5, 1.0, 1.0, 1.0]));
        assert!(!is_piecewise_valid(&[0.0, 0.0, 0.0, 0.5, 0.5, 0.5, 0.5, 1.0, 1.0, 1.0]));
        assert!(!is_valid(&[0.0, f64::NAN, 1.0]));
    }

    #[test]
    fn test_degree_and_npts() {
        assert_eq!(find_degree(&[0.0, 0.0, 0.0, 0.2, 0.6, 1.0, 1.0, 1.0]).unwrap(), 2);
        assert_eq!(find_npts(&[0.0, 0.0, 0.0, 0.2, 0.6, 1.0, 1.0, 1.0]).unwrap(), 5);
        assert_eq!(find_npts(&[0.0, 1.0]).unwrap(), 1);
    }

    #[test]
    fn test_find_span() {
        let vector = sample();
        let expected = [1, 1, 2, 2, 3, 4, 5, 5, 6, 6, 7];
        for (i, &span) in expected.iter().enumerate() {
            let node = i as f64 / 10.0;
            assert_eq!(find_span(&node, &vector).unwrap(), span, "node {}", node);
        }
        assert!(matches!(
            find_span(&1.1, &vector),
            Err(NurbsError::Domain { .. })
        ));
    }

    #[test]
    fn test_find_mult() {
        let vector = sample();
        let expected = [2, 0, 1, 0, 1, 1, 1, 0, 1, 0, 2];
        for (i, &mult) in expected.iter().enumerate() {
            let node = i as f64 / 10.0;
            assert_eq!(find_mult(&node, &vector).unwrap(), mult, "node {}", node);
        }
        assert!(find_mult(&-0.1, &vector).is_err());
    }

    #[test]
    fn test_insert_and_remove() {
        let vector = vec![0.0, 0.0, 0.5, 1.0, 1.0];
        let inserted = insert_knots(&vector, &[0.25, 0.5]).unwrap();
        assert_eq!(inserted, vec![0.0, 0.0, 0.25, 0.5, 0.5, 1.0, 1.0]);
        assert_eq!(remove_knots(&inserted, &[0.25, 0.5]).unwrap(), vector);
        assert!(matches!(
            remove_knots(&vector, &[0.3]),
            Err(NurbsError::KnotNotFound(_))
        ));
        assert!(matches!(
            insert_knots(&vector, &[2.0]),
            Err(NurbsError::Domain { .. })
        ));
    }

    #[test]
    fn test_unite_and_intersect() {
        let a = vec![0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0];
        let b = vec![0.0, 0.0, 0.0, 0.25, 0.5, 0.5, 1.0, 1.0, 1.0];
        assert_eq!(
            unite_vectors(&a, &b).unwrap(),
            vec![0.0, 0.0, 0.0, 0.25, 0.5, 0.5, 1.0, 1.0, 1.0]
        );
        assert_eq!(intersect_vectors(&a, &b).unwrap(), a);
        let c = vec![0.0, 0.0, 2.0, 2.0];
        assert!(unite_vectors(&a, &c).is_err());
    }

    #[test]
    fn test_split() {
        let vector = vec![0.0, 0.0, 0.5, 1.0, 1.0];
        let pieces = split(&vector, &[0.25, 0.75]).unwrap();
        assert_eq!(
            pieces,
            vec![
                vec![0.0, 0.0, 0.25, 0.25],
                vec![0.25, 0.25, 0.5, 0.75, 0.75],
                vec![0.75, 0.75, 1.0, 1.0],
            ]
        );
        assert_eq!(split(&vector, &[0.5]).unwrap().len(), 2);
    }

    #[test]
    fn test_derivate() {
        assert_eq!(derivate(&[0.0, 0.0, 1.0, 1.0]).unwrap(), vec![0.0, 1.0]);
        assert_eq!(
            derivate(&[0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0]).unwrap(),
            vec![0.0, 0.0, 0.5, 1.0, 1.0]
        );
        assert_eq!(derivate(&[0.0, 0.5, 1.0]).unwrap(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_nodes_to_insert() {
        let a = vec![0.0, 0.0, 0.5, 1.0, 1.0];
        let b = vec![0.0, 0.0, 0.25, 0.5, 0.5, 1.0, 1.0];
        assert_eq!(nodes_to_insert(&a, &b).unwrap(), vec![0.25, 0.5]);
        assert!(nodes_to_insert(&b, &a).is_err());
    }

    #[test]
    fn test_degree_change_vectors() {
        let vector = vec![0.0, 0.0, 0.5, 1.0, 1.0];
        let elevated = increase_degree(&vector, 1).unwrap();
        assert_eq!(elevated, vec![0.0, 0.0, 0.0, 0.5, 0.5, 1.0, 1.0, 1.0]);
        assert_eq!(decrease_degree(&elevated, 1).unwrap(), vector);
        assert!(decrease_degree(&vector, 2).is_err());
    }

    #[test]
    fn test_knot_vector_wrapper() {
        let vector = KnotVector::new(sample()).unwrap();
        assert_eq!(vector.degree(), 1);
        assert_eq!(vector.npts(), 7);
        assert_eq!(vector.span(&0.5).unwrap(), 4);
        assert_eq!(vector.span(&1.0).unwrap(), 7);
        assert_eq!(vector.limits(), (0.0, 1.0));
        assert_eq!(vector.knots().len(), 7);
        assert!(KnotVector::new(vec![0.0, 0.0, 0.0, 1.0, 1.0]).is_err());
        assert_eq!(
            KnotVector::<f64>::bezier(2).as_slice(),
            &[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]
        );
        assert_eq!(
            KnotVector::<f64>::uniform(4, 1).unwrap().as_slice(),
            &[0.0, 0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0, 1.0]
        );
    }

    #[test]
    fn test_wrapper_rejects_full_interior_multiplicity() {
        let vector = KnotVector::new(vec![0.0, 0.0, 0.5, 1.0, 1.0]).unwrap();
        assert!(matches!(
            vector.insert(&[0.5]),
            Err(NurbsError::InvalidKnotVector(_))
        ));
    }
}
