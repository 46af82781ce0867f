//! Value and first two derivatives of a curve.
//!
//! A rational curve is `C = A / w` with `A = sum N_i w_i P_i` and
//! `w = sum N_i w_i`. Both are polynomial splines, so their derivatives come
//! from the derivative matrices, and the quotient rule gives
//! `C' = (A' - w' C) / w` and `C'' = (A'' - 2 w' C' - w'' C) / w`.

use nurbskit_core::{NurbsError, Result};
use nurbskit_math::{Point3, Vector3};

use super::spline::{transform_points, SplineCurve};
use crate::nurbs::basis::BasisTensor;
use crate::nurbs::calculus::derivate_nonrational_spline;
use crate::nurbs::knot::{derivate, find_degree};

/// Homogeneous polynomial spline `(A, w)`.
#[derive(Debug, Clone)]
struct Homogeneous {
    knotvector: Vec<f64>,
    tensor: BasisTensor<f64>,
    points: Vec<Point3>,
    weights: Vec<f64>,
}

impl Homogeneous {
    fn new(knotvector: Vec<f64>, points: Vec<Point3>, weights: Vec<f64>) -> Result<Self> {
        let tensor = BasisTensor::build(&knotvector, find_degree(&knotvector)?)?;
        Ok(Self {
            knotvector,
            tensor,
            points,
            weights,
        })
    }

    fn derivative(&self) -> Result<Self> {
        let matrix = derivate_nonrational_spline(&self.knotvector)?;
        let weights = (&matrix * nalgebra::DVector::from_column_slice(&self.weights))
            .iter()
            .copied()
            .collect();
        Self::new(
            derivate(&self.knotvector)?,
            transform_points(&matrix, &self.points),
            weights,
        )
    }

    fn eval(&self, node: f64) -> (Point3, f64) {
        let (first, values) = self.tensor.eval(&node);
        values
            .iter()
            .enumerate()
            .fold((Point3::ZERO, 0.0), |(point, weight), (y, value)| {
                (
                    point + *value * self.points[first + y],
                    weight + value * self.weights[first + y],
                )
            })
    }
}

/// Evaluator of `C`, `C'` and `C''`, built once per curve.
#[derive(Debug, Clone)]
pub struct CurveJet {
    limits: (f64, f64),
    levels: [Homogeneous; 3],
}

impl CurveJet {
    pub fn new(curve: &SplineCurve) -> Result<Self> {
        let weights = curve
            .weights()
            .map(<[f64]>::to_vec)
            .unwrap_or_else(|| vec![1.0; curve.npts()]);
        let points = curve
            .ctrlpoints()
            .iter()
            .zip(&weights)
            .map(|(point, weight)| *point * *weight)
            .collect();
        let value = Homogeneous::new(curve.knotvector().as_slice().to_vec(), points, weights)?;
        let first = value.derivative()?;
        let second = first.derivative()?;
        Ok(Self {
            limits: curve.knotvector().limits(),
            levels: [value, first, second],
        })
    }

    pub fn domain(&self) -> (f64, f64) {
        self.limits
    }

    /// `[C(u), C'(u), C''(u)]`.
    pub fn eval(&self, node: f64) -> Result<[Vector3; 3]> {
        let (lower, upper) = self.limits;
        if !(lower..=upper).contains(&node) {
            return Err(NurbsError::Domain {
                value: node,
                lower,
                upper,
            });
        }
        let (a0, w0) = self.levels[0].eval(node);
        let (a1, w1) = self.levels[1].eval(node);
        let (a2, w2) = self.levels[2].eval(node);
        let point = a0 / w0;
        let first = (a1 - w1 * point) / w0;
        let second = (a2 - 2.0 * w1 * first - w2 * point) / w0;
        Ok([point, first, second])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nurbs::KnotVector;
    use nurbskit_math::dvec3;

    #[test]
    fn test_polynomial_derivatives() {
        let curve = SplineCurve::new(
            KnotVector::bezier(2),
            vec![dvec3(0.0, 0.0, 0.0), dvec3(0.5, 1.0, 0.0), dvec3(1.0, 0.0, 0.0)],
        )
        .unwrap();
        let [point, first, second] = curve.jet().unwrap().eval(0.25).unwrap();
        assert!((point - dvec3(0.25, 0.375, 0.0)).length() < 1e-12);
        assert!((first - dvec3(1.0, 1.0, 0.0)).length() < 1e-12);
        assert!((second - dvec3(0.0, -4.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_circle_derivatives() {
        // Quarter circle: |C| = 1, so C . C' = 0 and C . C'' = -|C'|^2.
        let w = std::f64::consts::FRAC_1_SQRT_2;
        let curve = SplineCurve::rational(
            KnotVector::bezier(2),
            vec![dvec3(1.0, 0.0, 0.0), dvec3(1.0, 1.0, 0.0), dvec3(0.0, 1.0, 0.0)],
            vec![1.0, w, 1.0],
        )
        .unwrap();
        let jet = curve.jet().unwrap();
        for i in 0..=8 {
            let [point, first, second] = jet.eval(i as f64 / 8.0).unwrap();
            assert!(point.dot(first).abs() < 1e-10);
            assert!((point.dot(second) + first.length_squared()).abs() < 1e-10);
        }
    }

    #[test]
    fn test_linear_curve_has_no_curvature() {
        let curve = SplineCurve::new(
            KnotVector::bezier(1),
            vec![dvec3(0.0, 0.0, 0.0), dvec3(2.0, 0.0, 0.0)],
        )
        .unwrap();
        let [_, first, second] = curve.jet().unwrap().eval(0.5).unwrap();
        assert!((first - dvec3(2.0, 0.0, 0.0)).length() < 1e-12);
        assert_eq!(second, Vector3::ZERO);
    }

    #[test]
    fn test_outside_domain() {
        let curve = SplineCurve::new(
            KnotVector::bezier(1),
            vec![dvec3(0.0, 0.0, 0.0), dvec3(2.0, 0.0, 0.0)],
        )
        .unwrap();
        assert!(curve.jet().unwrap().eval(1.5).is_err());
    }
}
