/// Tolerances and iteration caps shared by the spline kernel.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Tolerance {
    /// Two knots closer than this are the same knot
    pub knot: f64,
    /// Newton step below which point projection has converged
    pub projection_step: f64,
    /// Band around the minimal distance kept by point projection
    pub projection_distance: f64,
    /// Newton step below which curve intersection has converged
    pub intersection_step: f64,
    /// Jacobian determinant below which a Newton system is singular
    pub singular: f64,
    /// Radius used to merge duplicated parameter pairs
    pub pair_merge: f64,
    /// Maximal point distance for a parameter pair to be an intersection
    pub touch: f64,
    /// Residual below which a projection seed is already stationary
    pub stationary: f64,
    /// Galerkin error allowed by knot removal and degree reduction
    pub removal: f64,
    /// Newton iteration cap
    pub max_iterations: usize,
}

impl Tolerance {
    pub const DEFAULT_KNOT: f64 = 1e-9;
    pub const DEFAULT_MAX_ITERATIONS: usize = 10;

    pub fn default_precision() -> Self {
        Self {
            knot: Self::DEFAULT_KNOT,
            projection_step: 1e-6,
            projection_distance: 1e-6,
            intersection_step: 1e-9,
            singular: 1e-9,
            pair_merge: 1e-9,
            touch: 1e-6,
            stationary: 1e-12,
            removal: 1e-9,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn loose() -> Self {
        Self {
            projection_step: 1e-4,
            projection_distance: 1e-4,
            intersection_step: 1e-6,
            touch: 1e-4,
            removal: 1e-6,
            ..Self::default_precision()
        }
    }

    pub fn tight() -> Self {
        Self {
            projection_step: 1e-10,
            projection_distance: 1e-10,
            intersection_step: 1e-12,
            touch: 1e-9,
            removal: 1e-12,
            max_iterations: 20,
            ..Self::default_precision()
        }
    }

    /// Check if two knots coincide within the knot tolerance
    pub fn knot_eq(self, a: f64, b: f64) -> bool {
        (a - b).abs() < self.knot
    }

    /// Newton cap used by point projection, which starts from coarser seeds
    pub fn projection_iterations(self) -> usize {
        2 * self.max_iterations
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::default_precision()
    }
}
