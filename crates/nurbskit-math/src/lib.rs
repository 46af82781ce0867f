//! NurbsKit math: number domain, dense matrices, and the exact linear solver.

pub mod aabb;
pub mod exact;
pub mod matrix;
pub mod scalar;

pub use glam::{dvec3, DVec3};
pub use nalgebra::DMatrix;
pub use num_bigint::BigInt;
pub use num_rational::BigRational;

pub use aabb::Aabb3;
pub use scalar::{NumberKind, Scalar};

pub type Point3 = DVec3;
pub type Vector3 = DVec3;
