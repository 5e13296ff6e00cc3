//! Error types for mia_core operations.
//!
//! Provides a simple error enum with no external dependencies for no_std compatibility.

use core::fmt;

/// Error types that can occur during camera geometry operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MiaCoreError {
    /// A point landed on or behind the camera plane after rotation and translation.
    NonPositiveDepth {
        /// The offending depth value.
        depth: f32,
    },
    /// A weak-perspective scale that cannot be inverted.
    NonPositiveScale {
        /// The offending scale value.
        scale: f32,
    },
    /// A bounding box with non-positive height.
    DegenerateBoundingBox {
        /// The offending height.
        height: f32,
    },
}

impl fmt::Display for MiaCoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiaCoreError::NonPositiveDepth { depth } => {
                write!(f, "point depth {} is not in front of the camera", depth)
            }
            MiaCoreError::NonPositiveScale { scale } => {
                write!(f, "weak-perspective scale {} must be positive", scale)
            }
            MiaCoreError::DegenerateBoundingBox { height } => {
                write!(f, "bounding box height {} must be positive", height)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MiaCoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "std")]
    #[test]
    fn test_error_display() {
        use std::format;

        let err = MiaCoreError::NonPositiveDepth { depth: -1.5 };
        assert_eq!(
            format!("{}", err),
            "point depth -1.5 is not in front of the camera"
        );

        let err = MiaCoreError::NonPositiveScale { scale: 0.0 };
        assert_eq!(
            format!("{}", err),
            "weak-perspective scale 0 must be positive"
        );

        let err = MiaCoreError::DegenerateBoundingBox { height: -2.0 };
        assert_eq!(
            format!("{}", err),
            "bounding box height -2 must be positive"
        );
    }

    #[test]
    fn test_error_equality() {
        let err1 = MiaCoreError::NonPositiveScale { scale: 0.0 };
        let err2 = MiaCoreError::NonPositiveScale { scale: 0.0 };
        let err3 = MiaCoreError::NonPositiveDepth { depth: 0.0 };

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }
}
