//! Bounded tolerance for batch failures.

use crate::error::MiaError;

/// Outcome of recording one batch failure.
#[derive(Debug)]
pub enum FailureAction {
    /// Below the threshold: log and move on to the next batch.
    Skip(MiaError),
    /// Threshold reached: the phase must abort with this error.
    Abort(MiaError),
}

/// Counts batch failures within one phase.
///
/// The `max_failures`-th failure aborts; earlier ones are skipped. The
/// counter is reset at the start of every phase.
#[derive(Debug, Clone)]
pub struct FailurePolicy {
    max_failures: usize,
    failures: usize,
}

impl FailurePolicy {
    /// Threshold used unless configured otherwise.
    pub const DEFAULT_MAX_FAILURES: usize = 7;

    /// Create a policy that aborts on the `max_failures`-th failure.
    pub fn new(max_failures: usize) -> Self {
        Self {
            max_failures: max_failures.max(1),
            failures: 0,
        }
    }

    /// Record a failure and decide what to do with it.
    pub fn record(&mut self, error: MiaError) -> FailureAction {
        self.failures += 1;
        if self.failures >= self.max_failures {
            FailureAction::Abort(error)
        } else {
            FailureAction::Skip(error)
        }
    }

    /// Failures since the last reset.
    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Configured threshold.
    pub fn max_failures(&self) -> usize {
        self.max_failures
    }

    /// Start counting from zero.
    pub fn reset(&mut self) {
        self.failures = 0;
    }
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_FAILURES)
    }
}
