//! Number domain of the kernel.
//!
//! Every routine is generic over [`Scalar`]. The implementation for `f64`
//! solves with LU factorisation; the implementation for [`BigRational`]
//! keeps every entry exact by going through the integer Gauss-Jordan
//! elimination of [`crate::exact`]. Arbitrary-precision integers are the
//! rationals whose denominator is one.

use std::f64::consts::PI;
use std::fmt;
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

use nalgebra::DMatrix;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Num, Signed, ToPrimitive};
use nurbskit_core::{NurbsError, Result};

use crate::exact::invert_fraction_matrix;

/// Kind of the numbers stored in a matrix, ordered by promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NumberKind {
    Integer,
    Rational,
    Float,
}

impl NumberKind {
    /// Kind of the result of mixing `self` and `other`.
    pub fn promote(self, other: Self) -> Self {
        self.max(other)
    }

    /// Resolve the kind of a whole collection once.
    pub fn of<'a, T: Scalar + 'a>(values: impl IntoIterator<Item = &'a T>) -> Self {
        values
            .into_iter()
            .fold(NumberKind::Integer, |kind, value| kind.promote(value.kind()))
    }
}

/// Scalar type usable by the knot algebra and the linear maps built on it.
pub trait Scalar:
    nalgebra::Scalar
    + Num
    + Signed
    + PartialOrd
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
    + fmt::Display
{
    /// Kind of this particular value.
    fn kind(&self) -> NumberKind;

    fn from_usize(n: usize) -> Self;

    /// The exact ratio `numer / denom`, or its nearest float.
    fn from_ratio(numer: i64, denom: i64) -> Self;

    /// Nearest `f64`, used for tolerance checks and error reporting.
    fn as_f64(&self) -> f64;

    /// `npts` sorted quadrature nodes strictly inside `[a, b]`.
    fn quadrature_nodes(npts: usize, a: &Self, b: &Self) -> Vec<Self>;

    /// Solve `matrix * X = rhs` for `X`.
    fn solve(matrix: &DMatrix<Self>, rhs: &DMatrix<Self>) -> Result<DMatrix<Self>>;

    fn invert(matrix: &DMatrix<Self>) -> Result<DMatrix<Self>> {
        let side = matrix.nrows();
        Self::solve(matrix, &DMatrix::identity(side, side))
    }
}

fn check_system<T: nalgebra::Scalar>(matrix: &DMatrix<T>, rhs: &DMatrix<T>) -> Result<()> {
    if matrix.nrows() != matrix.ncols() {
        return Err(NurbsError::InvalidOperation(format!(
            "cannot solve with a non-square {}x{} matrix",
            matrix.nrows(),
            matrix.ncols()
        )));
    }
    if matrix.nrows() != rhs.nrows() {
        return Err(NurbsError::InvalidOperation(format!(
            "right-hand side has {} rows, system has {}",
            rhs.nrows(),
            matrix.nrows()
        )));
    }
    Ok(())
}

impl Scalar for f64 {
    fn kind(&self) -> NumberKind {
        NumberKind::Float
    }

    fn from_usize(n: usize) -> Self {
        n as f64
    }

    fn from_ratio(numer: i64, denom: i64) -> Self {
        numer as f64 / denom as f64
    }

    fn as_f64(&self) -> f64 {
        *self
    }

    /// Chebyshev nodes mapped to `[a, b]`.
    fn quadrature_nodes(npts: usize, a: &Self, b: &Self) -> Vec<Self> {
        let half = (b - a) / 2.0;
        let middle = (a + b) / 2.0;
        let mut nodes: Vec<f64> = (0..npts)
            .map(|k| {
                let theta = PI * (2 * k + 1) as f64 / (2 * npts) as f64;
                middle + half * theta.cos()
            })
            .collect();
        nodes.reverse();
        nodes
    }

    fn solve(matrix: &DMatrix<Self>, rhs: &DMatrix<Self>) -> Result<DMatrix<Self>> {
        check_system(matrix, rhs)?;
        matrix
            .clone()
            .lu()
            .solve(rhs)
            .ok_or_else(|| NurbsError::SingularMatrix("LU factorisation failed".into()))
    }
}

impl Scalar for BigRational {
    fn kind(&self) -> NumberKind {
        if self.is_integer() {
            NumberKind::Integer
        } else {
            NumberKind::Rational
        }
    }

    fn from_usize(n: usize) -> Self {
        BigRational::from_integer(BigInt::from(n))
    }

    fn from_ratio(numer: i64, denom: i64) -> Self {
        BigRational::new(BigInt::from(numer), BigInt::from(denom))
    }

    fn as_f64(&self) -> f64 {
        match (self.numer().to_f64(), self.denom().to_f64()) {
            (Some(numer), Some(denom)) => numer / denom,
            _ => f64::NAN,
        }
    }

    /// Midpoints of `npts` equal sub-intervals, which stay rational.
    fn quadrature_nodes(npts: usize, a: &Self, b: &Self) -> Vec<Self> {
        let width = b.clone() - a.clone();
        (0..npts)
            .map(|i| {
                let offset = Self::from_ratio((2 * i + 1) as i64, (2 * npts) as i64);
                a.clone() + width.clone() * offset
            })
            .collect()
    }

    fn solve(matrix: &DMatrix<Self>, rhs: &DMatrix<Self>) -> Result<DMatrix<Self>> {
        check_system(matrix, rhs)?;
        let inverse = invert_fraction_matrix(matrix)?;
        Ok(inverse * rhs)
    }
}
