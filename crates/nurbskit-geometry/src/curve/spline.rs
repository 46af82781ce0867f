//! Spline curve in 3D: knot vector, control points and optional weights.

use nalgebra::DMatrix;
use nurbskit_core::{NurbsError, Result, Tolerance, Validate};
use nurbskit_math::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::jet::CurveJet;
use super::Curve;
use crate::nurbs::calculus::derivate_nonrational_spline;
use crate::nurbs::eval::{eval_rational_nodes, eval_spline_nodes};
use crate::nurbs::least_square::spline2spline;
use crate::nurbs::operations::{degree_increase, knot_insert, split_curve};
use crate::nurbs::KnotVector;

/// Rows of `matrix` applied to `points`: `out_i = sum_j M_ij P_j`.
pub(crate) fn transform_points(matrix: &DMatrix<f64>, points: &[Point3]) -> Vec<Point3> {
    matrix
        .row_iter()
        .map(|row| {
            row.iter()
                .zip(points)
                .fold(Point3::ZERO, |acc, (coef, point)| acc + *coef * *point)
        })
        .collect()
}

fn transform_values(matrix: &DMatrix<f64>, values: &[f64]) -> Vec<f64> {
    matrix
        .row_iter()
        .map(|row| row.iter().zip(values).map(|(coef, value)| coef * value).sum())
        .collect()
}

/// A polynomial or rational B-spline curve.
///
/// Rational curves store their control points in Cartesian form; linear
/// maps are applied to the weighted points `w_i P_i` and to the weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplineCurve {
    knotvector: KnotVector,
    ctrlpoints: Vec<Point3>,
    weights: Option<Vec<f64>>,
}

impl SplineCurve {
    pub fn new(knotvector: KnotVector, ctrlpoints: Vec<Point3>) -> Result<Self> {
        let curve = Self {
            knotvector,
            ctrlpoints,
            weights: None,
        };
        curve.validate()?;
        Ok(curve)
    }

    /// Rational curve. Every weight must be positive.
    pub fn rational(knotvector: KnotVector, ctrlpoints: Vec<Point3>, weights: Vec<f64>) -> Result<Self> {
        let curve = Self {
            knotvector,
            ctrlpoints,
            weights: Some(weights),
        };
        curve.validate()?;
        Ok(curve)
    }

    pub fn knotvector(&self) -> &KnotVector {
        &self.knotvector
    }

    pub fn ctrlpoints(&self) -> &[Point3] {
        &self.ctrlpoints
    }

    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    pub fn is_rational(&self) -> bool {
        self.weights.is_some()
    }

    pub fn degree(&self) -> usize {
        self.knotvector.degree()
    }

    pub fn npts(&self) -> usize {
        self.ctrlpoints.len()
    }

    /// Evaluate the curve at every node.
    pub fn eval(&self, nodes: &[f64]) -> Result<Vec<Point3>> {
        let vector = self.knotvector.as_slice();
        let basis = match &self.weights {
            Some(weights) => eval_rational_nodes(vector, weights, nodes, self.degree())?,
            None => eval_spline_nodes(vector, nodes, self.degree())?,
        };
        Ok(transform_points(&basis.transpose(), &self.ctrlpoints))
    }

    pub fn eval_at(&self, node: f64) -> Result<Point3> {
        let points = self.eval(&[node])?;
        Ok(points[0])
    }

    /// Value, first and second derivative evaluator.
    pub fn jet(&self) -> Result<CurveJet> {
        CurveJet::new(self)
    }

    /// Derivative curve of a polynomial curve.
    ///
    /// A curve with a `C^0` joint has a discontinuous derivative, which a
    /// [`KnotVector`] cannot carry; split such curves first.
    pub fn derivative(&self) -> Result<Self> {
        if self.is_rational() {
            return Err(NurbsError::InvalidOperation(
                "the derivative of a rational curve is not a spline of the same kind".into(),
            ));
        }
        let matrix = derivate_nonrational_spline(self.knotvector.as_slice())?;
        let knotvector = self.knotvector.derivative()?;
        Self::new(knotvector, transform_points(&matrix, &self.ctrlpoints))
    }

    /// New curve on `knotvector` with control points `matrix * P`.
    pub fn apply_lineartrans(&self, knotvector: KnotVector, matrix: &DMatrix<f64>) -> Result<Self> {
        if matrix.ncols() != self.npts() || matrix.nrows() != knotvector.npts() {
            return Err(NurbsError::InvalidOperation(format!(
                "a {}x{} matrix cannot map {} control points onto {}",
                matrix.nrows(),
                matrix.ncols(),
                self.npts(),
                knotvector.npts()
            )));
        }
        match &self.weights {
            None => Self::new(knotvector, transform_points(matrix, &self.ctrlpoints)),
            Some(weights) => {
                let weighted: Vec<Point3> = self
                    .ctrlpoints
                    .iter()
                    .zip(weights)
                    .map(|(point, weight)| *point * *weight)
                    .collect();
                let newweights = transform_values(matrix, weights);
                let ctrlpoints = transform_points(matrix, &weighted)
                    .into_iter()
                    .zip(&newweights)
                    .map(|(point, weight)| point / *weight)
                    .collect();
                Self::rational(knotvector, ctrlpoints, newweights)
            }
        }
    }

    /// Split into independent curves at `nodes`, or at every interior knot
    /// when `nodes` is `None` (Bezier decomposition).
    pub fn split(&self, nodes: Option<&[f64]>) -> Result<Vec<Self>> {
        let knots = self.knotvector.knots();
        let nodes = nodes.unwrap_or(&knots[1..knots.len() - 1]);
        let vectors = self.knotvector.split(nodes)?;
        let matrices = split_curve(self.knotvector.as_slice(), nodes)?;
        vectors
            .into_iter()
            .zip(&matrices)
            .map(|(vector, matrix)| self.apply_lineartrans(vector, matrix))
            .collect()
    }

    pub fn knot_insert(&mut self, nodes: &[f64]) -> Result<()> {
        let (lower, upper) = self.knotvector.limits();
        let interior: Vec<f64> = nodes
            .iter()
            .copied()
            .filter(|node| *node != lower && *node != upper)
            .collect();
        let knotvector = self.knotvector.insert(&interior)?;
        let matrix = knot_insert(self.knotvector.as_slice(), &interior)?;
        *self = self.apply_lineartrans(knotvector, &matrix)?;
        Ok(())
    }

    /// Galerkin map onto `target` and the squared L2 error it makes.
    ///
    /// Rational curves are projected in homogeneous coordinates.
    pub fn projection_error(&self, target: &KnotVector) -> Result<(DMatrix<f64>, f64)> {
        let (matrix, error) = spline2spline(self.knotvector.as_slice(), target.as_slice())?;
        let weights = self.weights.clone().unwrap_or_else(|| vec![1.0; self.npts()]);
        let mut total = 0.0;
        for i in 0..self.npts() {
            for j in 0..self.npts() {
                let mut product = self.ctrlpoints[i].dot(self.ctrlpoints[j]);
                if self.is_rational() {
                    product += 1.0;
                }
                total += error[(i, j)] * weights[i] * weights[j] * product;
            }
        }
        Ok((matrix, total.max(0.0)))
    }

    fn project_onto(&mut self, target: KnotVector, tolerance: f64) -> Result<()> {
        let (matrix, error) = self.projection_error(&target)?;
        if error > tolerance {
            return Err(NurbsError::NonExactReduction { error, tolerance });
        }
        log::debug!(
            "projected curve from {} to {} control points, error {:e}",
            self.npts(),
            target.npts(),
            error
        );
        *self = self.apply_lineartrans(target, &matrix)?;
        Ok(())
    }

    /// Remove `nodes`; fails with [`NurbsError::NonExactReduction`] and
    /// leaves the curve unchanged if the shape would move by more than
    /// `tolerance`.
    pub fn knot_remove(&mut self, nodes: &[f64], tolerance: f64) -> Result<()> {
        let target = self.knotvector.remove(nodes)?;
        self.project_onto(target, tolerance)
    }

    pub fn can_remove_knot(&self, node: f64, tolerance: f64) -> bool {
        self.knotvector
            .remove(&[node])
            .and_then(|target| self.projection_error(&target))
            .map(|(_, error)| error <= tolerance)
            .unwrap_or(false)
    }

    /// Remove every copy of `nodes` (all interior knots by default) that
    /// can go without exceeding `tolerance.removal`. Returns how many were
    /// removed.
    pub fn knot_clean(&mut self, nodes: Option<&[f64]>, tolerance: &Tolerance) -> Result<usize> {
        let tolerance = tolerance.removal;
        let candidates = match nodes {
            Some(nodes) => nodes.to_vec(),
            None => {
                let knots = self.knotvector.knots();
                knots[1..knots.len() - 1].to_vec()
            }
        };
        let mut removed = 0;
        for node in candidates {
            while self.can_remove_knot(node, tolerance) {
                self.knot_remove(&[node], tolerance)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub fn degree_increase(&mut self, times: usize) -> Result<()> {
        let matrix = degree_increase(self.knotvector.as_slice(), times)?;
        let knotvector = self.knotvector.increase_degree(times)?;
        *self = self.apply_lineartrans(knotvector, &matrix)?;
        Ok(())
    }

    pub fn degree_decrease(&mut self, times: usize, tolerance: f64) -> Result<()> {
        let target = self.knotvector.decrease_degree(times)?;
        self.project_onto(target, tolerance)
    }

    pub fn can_decrease_degree(&self, tolerance: f64) -> bool {
        self.degree() > 0
            && self
                .knotvector
                .decrease_degree(1)
                .and_then(|target| self.projection_error(&target))
                .map(|(_, error)| error <= tolerance)
                .unwrap_or(false)
    }

    /// Lower the degree while the shape is kept within `tolerance.removal`.
    pub fn degree_clean(&mut self, tolerance: &Tolerance) -> Result<usize> {
        let tolerance = tolerance.removal;
        let mut lowered = 0;
        while self.can_decrease_degree(tolerance) {
            self.degree_decrease(1, tolerance)?;
            lowered += 1;
        }
        Ok(lowered)
    }
}

impl Validate for SplineCurve {
    fn validate(&self) -> Result<()> {
        self.knotvector.validate()?;
        if self.ctrlpoints.len() != self.knotvector.npts() {
            return Err(NurbsError::InvalidOperation(format!(
                "{} control points for a knot vector expecting {}",
                self.ctrlpoints.len(),
                self.knotvector.npts()
            )));
        }
        if let Some(weights) = &self.weights {
            if weights.len() != self.ctrlpoints.len() {
                return Err(NurbsError::InvalidOperation(format!(
                    "{} weights for {} control points",
                    weights.len(),
                    self.ctrlpoints.len()
                )));
            }
            if let Some(weight) = weights.iter().find(|weight| !(**weight > 0.0)) {
                return Err(NurbsError::InvalidOperation(format!(
                    "weight {} is not positive",
                    weight
                )));
            }
        }
        Ok(())
    }
}

impl Curve for SplineCurve {
    fn point_at(&self, t: f64) -> Result<Point3> {
        self.eval_at(t)
    }

    fn tangent_at(&self, t: f64) -> Result<Vector3> {
        let [_, first, _] = self.jet()?.eval(t)?;
        Ok(first)
    }

    fn domain(&self) -> (f64, f64) {
        self.knotvector.limits()
    }
}
