//! Error types for transform fusion.
//!
//! Every precondition failure has its own variant so callers can tell a
//! bad invocation from a numerically hopeless input.

use polyrigid_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for fusion operations.
#[derive(Error, Debug)]
pub enum FusionError {
    /// A mask or the reference grid disagrees with the floating grid.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Masks and transforms are index-aligned and must come in equal numbers.
    #[error("Count mismatch: {masks} component masks but {transforms} transforms")]
    CountMismatch { masks: usize, transforms: usize },

    /// At least one component is required.
    #[error("No components: at least one mask and one transform are required")]
    NoComponents,

    /// A transform is not invertible or has no usable principal logarithm.
    #[error("Transform {index} is singular: {reason}")]
    SingularTransform { index: usize, reason: String },

    /// Reading, parsing or writing a file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A NaN, infinity or zero weight sum appeared during the computation.
    #[error("Numerical error: {0}")]
    Numerical(String),
}

/// Result type for fusion operations.
pub type Result<T> = std::result::Result<T, FusionError>;

impl FusionError {
    /// Create an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: impl Into<anyhow::Error>) -> Self {
        Self::Io {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Create a singular transform error.
    pub fn singular_transform(index: usize, reason: impl Into<String>) -> Self {
        Self::SingularTransform {
            index,
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Create a numerical error.
    pub fn numerical(msg: impl Into<String>) -> Self {
        Self::Numerical(msg.into())
    }

    pub(crate) fn shape_mismatch(expected: [usize; 3], actual: [usize; 3]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }
}

impl From<CoreError> for FusionError {
    fn from(err: CoreError) -> Self {
        Self::Numerical(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_mismatch_display() {
        let err = FusionError::CountMismatch {
            masks: 2,
            transforms: 3,
        };
        assert_eq!(
            err.to_string(),
            "Count mismatch: 2 component masks but 3 transforms"
        );
    }

    #[test]
    fn test_shape_mismatch() {
        let err = FusionError::shape_mismatch([4, 4, 4], [4, 4, 5]);
        let err_str = err.to_string();
        assert!(err_str.contains("expected [4, 4, 4]"));
        assert!(err_str.contains("got [4, 4, 5]"));
    }

    #[test]
    fn test_io_error_keeps_source() {
        use std::error::Error as _;

        let err = FusionError::io("/tmp/missing.txt", anyhow::anyhow!("not found"));
        assert!(err.to_string().contains("/tmp/missing.txt"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_core_error_is_numerical() {
        let err: FusionError = CoreError::NonFinite("matrix logarithm".into()).into();
        assert!(matches!(err, FusionError::Numerical(_)));
    }
}
