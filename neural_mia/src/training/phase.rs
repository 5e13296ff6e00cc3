//! Training phases.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which pass of an epoch is running.
///
/// Train passes run on the autodiff backend and update parameters; eval
/// passes run the inner-backend model with dropout disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Gradient-tracked pass that steps the optimizer.
    Train,
    /// Inference-mode pass for monitoring.
    Eval,
}

impl Phase {
    /// Metric prefix for this phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Train => "train",
            Phase::Eval => "eval",
        }
    }

    /// Whether parameters are updated in this phase.
    pub fn is_train(&self) -> bool {
        matches!(self, Phase::Train)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
