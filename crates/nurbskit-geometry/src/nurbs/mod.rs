//! Spline kernel on plain knot slices: knot algebra, basis evaluation,
//! linear maps between control-point spaces and Galerkin projection.
//!
//! Every routine is generic over [`nurbskit_math::Scalar`], so the same
//! code runs on `f64` and on exact `BigRational` knots.

pub mod algebra;
pub mod basis;
pub mod calculus;
pub mod eval;
pub mod knot;
pub mod least_square;
pub mod operations;

pub use basis::{horner, BasisTensor};
pub use eval::{eval_rational_nodes, eval_spline_nodes};
pub use knot::KnotVector;
pub use least_square::{fit_function, func2func, spline2spline};
pub use operations::{
    degree_increase, knot_insert, knot_remove, matrix_transformation, split_curve,
};
