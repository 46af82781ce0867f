//! Polynomial form of the B-spline basis.
//!
//! On every non-empty knot interval `[k_z, k_{z+1}]` each of the
//! `degree + 1` active basis functions is a polynomial. The tensor stores
//! its coefficients in the local variable `t = (u - k_z) / (k_{z+1} - k_z)`,
//! built with the Cox-de Boor recurrence applied to coefficient arrays.

use nurbskit_core::{NurbsError, Result};
use nurbskit_math::Scalar;

use super::knot::{find_degree, find_knots};

/// Coefficients `[interval][local][power]` of the basis functions.
#[derive(Debug, Clone, PartialEq)]
pub struct BasisTensor<T> {
    degree: usize,
    knots: Vec<T>,
    spans: Vec<usize>,
    coefs: Vec<T>,
}

impl<T: Scalar> BasisTensor<T> {
    /// Build the basis of degree `degree` over `vector`.
    ///
    /// `degree` may be lower than the degree of the vector, in which case
    /// the lower-degree functions of the same recurrence are returned.
    pub fn build(vector: &[T], degree: usize) -> Result<Self> {
        let maxdegree = find_degree(vector)?;
        if degree > maxdegree {
            return Err(NurbsError::InvalidOperation(format!(
                "basis of degree {} requested from a degree {} vector",
                degree, maxdegree
            )));
        }
        let knots = find_knots(vector)?;
        let spans: Vec<usize> = knots[..knots.len() - 1]
            .iter()
            .map(|knot| vector.partition_point(|value| value <= knot) - 1)
            .collect();

        let side = degree + 1;
        let block = side * side;
        let index = |z: usize, y: usize, k: usize| (z * side + y) * side + k;

        let mut coefs = vec![T::zero(); spans.len() * block];
        for z in 0..spans.len() {
            coefs[index(z, 0, 0)] = T::one();
        }

        for j in 1..=degree {
            let mut next = vec![T::zero(); coefs.len()];
            for (z, &span) in spans.iter().enumerate() {
                let a1 = knots[z + 1].clone() - knots[z].clone();
                let b1 = knots[z].clone() - knots[z + 1].clone();
                for y in 0..j {
                    let i = y + span + 1 - j;
                    let denom = vector[i + j].clone() - vector[i].clone();
                    if denom.is_zero() {
                        continue;
                    }
                    let a0 = knots[z].clone() - vector[i].clone();
                    let b0 = vector[i + j].clone() - knots[z].clone();
                    for k in 0..j {
                        let c = coefs[index(z, y, k)].clone() / denom.clone();
                        if c.is_zero() {
                            continue;
                        }
                        next[index(z, y, k)] += b0.clone() * c.clone();
                        next[index(z, y, k + 1)] += b1.clone() * c.clone();
                        next[index(z, y + 1, k)] += a0.clone() * c.clone();
                        next[index(z, y + 1, k + 1)] += a1.clone() * c;
                    }
                }
            }
            coefs = next;
        }

        Ok(Self {
            degree,
            knots,
            spans,
            coefs,
        })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Number of non-empty knot intervals.
    pub fn intervals(&self) -> usize {
        self.spans.len()
    }

    /// Knot span index of interval `z`.
    pub fn span(&self, z: usize) -> usize {
        self.spans[z]
    }

    /// Limits `(k_z, k_{z+1})` of interval `z`.
    pub fn limits(&self, z: usize) -> (&T, &T) {
        (&self.knots[z], &self.knots[z + 1])
    }

    /// Interval containing `node`; the upper limit belongs to the last one.
    pub fn interval_of(&self, node: &T) -> usize {
        let count = self.knots.partition_point(|knot| knot <= node);
        count.saturating_sub(1).min(self.spans.len() - 1)
    }

    /// Coefficients of active function `local` on interval `z`, lowest power first.
    pub fn coefficients(&self, z: usize, local: usize) -> &[T] {
        let side = self.degree + 1;
        let start = (z * side + local) * side;
        &self.coefs[start..start + side]
    }

    /// Values of the `degree + 1` active functions at `node`, with the
    /// index of the first one.
    pub fn eval(&self, node: &T) -> (usize, Vec<T>) {
        let z = self.interval_of(node);
        let (lower, upper) = self.limits(z);
        let local = (node.clone() - lower.clone()) / (upper.clone() - lower.clone());
        let first = self.spans[z] - self.degree;
        let values = (0..=self.degree)
            .map(|y| horner(self.coefficients(z, y), &local))
            .collect();
        (first, values)
    }
}

/// Evaluate `coefs[0] + coefs[1] x + ...` with Horner's scheme.
pub fn horner<T: Scalar>(coefs: &[T], x: &T) -> T {
    coefs
        .iter()
        .rev()
        .fold(T::zero(), |acc, coef| acc * x.clone() + coef.clone())
}
