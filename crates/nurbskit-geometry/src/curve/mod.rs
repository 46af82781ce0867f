//! Curve trait and the spline curve used by the query engine.

mod jet;
mod spline;

use nurbskit_core::{Result, Tolerance};
use nurbskit_math::{Point3, Vector3};

pub use jet::CurveJet;
pub use spline::SplineCurve;

/// Trait for parametric curves in 3D space.
pub trait Curve: Send + Sync {
    /// Evaluate the curve at parameter `t`.
    fn point_at(&self, t: f64) -> Result<Point3>;

    /// Evaluate the tangent vector at parameter `t`.
    fn tangent_at(&self, t: f64) -> Result<Vector3>;

    /// Return the parameter domain `(t_min, t_max)`.
    fn domain(&self) -> (f64, f64);

    /// Whether both ends meet within the knot tolerance.
    fn is_closed(&self) -> bool {
        let (start, end) = self.domain();
        match (self.point_at(start), self.point_at(end)) {
            (Ok(first), Ok(last)) => first.distance(last) < Tolerance::DEFAULT_KNOT,
            _ => false,
        }
    }
}
