//! Error types for neural_mia.

use thiserror::Error;

/// Errors that can occur while building, training or checkpointing an EMG regressor.
#[derive(Error, Debug)]
pub enum MiaError {
    /// Tensor shape mismatch, usually a malformed batch record.
    #[error("tensor shape mismatch in {field}: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Batch field or tensor the check ran on.
        field: &'static str,
        /// Expected shape.
        expected: Vec<usize>,
        /// Actual shape.
        got: Vec<usize>,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// Loss evaluated to NaN or infinity.
    #[error("non-finite loss {value} at step {step}")]
    NonFiniteLoss {
        /// The offending value.
        value: f32,
        /// Global step the loss was computed at.
        step: usize,
    },

    /// Training error.
    #[error("training error: {message}")]
    TrainingError {
        /// Description of the error.
        message: String,
    },

    /// Checkpoint could not be written or restored.
    #[error("checkpoint error: {message}")]
    CheckpointError {
        /// Description of the error.
        message: String,
    },

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Scalar camera geometry rejected its input.
    #[error("camera geometry error: {0}")]
    Core(#[from] mia_core::MiaCoreError),
}

impl MiaError {
    /// Create a shape mismatch error.
    pub fn shape_mismatch(field: &'static str, expected: &[usize], got: &[usize]) -> Self {
        Self::ShapeMismatch {
            field,
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a checkpoint error.
    pub fn checkpoint(message: impl Into<String>) -> Self {
        Self::CheckpointError {
            message: message.into(),
        }
    }
}

/// Result type for neural_mia operations.
pub type Result<T> = std::result::Result<T, MiaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_display() {
        let err = MiaError::shape_mismatch("emg", &[2, 30, 8], &[2, 29, 8]);
        assert_eq!(
            err.to_string(),
            "tensor shape mismatch in emg: expected [2, 30, 8], got [2, 29, 8]"
        );
    }

    #[test]
    fn test_core_error_conversion() {
        let err: MiaError = mia_core::MiaCoreError::NonPositiveScale { scale: 0.0 }.into();
        assert!(matches!(err, MiaError::Core(_)));
    }
}
