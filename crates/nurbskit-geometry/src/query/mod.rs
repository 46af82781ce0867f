//! Geometric queries solved by Newton iteration on Bezier pieces.
//!
//! Non-convergence is not an error: a query that finds nothing returns
//! [`Roots::NotFound`].

pub mod intersection;
pub mod projection;

pub use intersection::curve_and_curve;
pub use projection::point_on_curve;

/// Outcome of a root-finding query.
#[derive(Debug, Clone, PartialEq)]
pub enum Roots<T> {
    /// At least one root, sorted ascending.
    Found(Vec<T>),
    NotFound,
}

impl<T> Roots<T> {
    pub fn from_vec(roots: Vec<T>) -> Self {
        if roots.is_empty() {
            Roots::NotFound
        } else {
            Roots::Found(roots)
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Roots::Found(_))
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        !self.is_found()
    }

    pub fn as_slice(&self) -> &[T] {
        match self {
            Roots::Found(roots) => roots,
            Roots::NotFound => &[],
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            Roots::Found(roots) => roots,
            Roots::NotFound => Vec::new(),
        }
    }
}
