//! Error types for core primitives.

use thiserror::Error;

/// Errors raised by matrix functions and tensor data extraction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// The matrix has no inverse, so it has no logarithm either.
    #[error("Singular matrix: {0}")]
    SingularMatrix(String),

    /// The inverse scaling-and-squaring loop did not reach the identity.
    #[error("Matrix logarithm did not converge after {iterations} square roots")]
    LogarithmDidNotConverge { iterations: usize },

    /// A NaN or infinity was produced.
    #[error("Non-finite value: {0}")]
    NonFinite(String),

    /// Tensor data could not be read back as `f32`.
    #[error("Tensor data error: {0}")]
    TensorData(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::LogarithmDidNotConverge { iterations: 64 };
        assert_eq!(
            err.to_string(),
            "Matrix logarithm did not converge after 64 square roots"
        );
    }
}
