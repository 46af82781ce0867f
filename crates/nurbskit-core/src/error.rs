use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NurbsError {
    #[error("Invalid knot vector: {0}")]
    InvalidKnotVector(String),

    #[error("Value {value} lies outside the domain [{lower}, {upper}]")]
    Domain { value: f64, lower: f64, upper: f64 },

    #[error("Non-exact reduction: error {error:e} exceeds tolerance {tolerance:e}")]
    NonExactReduction { error: f64, tolerance: f64 },

    #[error("Knot not found: {0}")]
    KnotNotFound(String),

    #[error("Singular matrix: {0}")]
    SingularMatrix(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

pub type Result<T> = std::result::Result<T, NurbsError>;
