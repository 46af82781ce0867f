//! NurbsKit geometry: knot vector algebra, spline transformations,
//! Galerkin projection and Newton-based curve queries.

pub mod curve;
pub mod nurbs;
pub mod query;

pub use curve::{Curve, CurveJet, SplineCurve};
pub use nurbs::KnotVector;
pub use query::{curve_and_curve, point_on_curve, Roots};
