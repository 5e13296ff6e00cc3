//! Phase summaries.

use super::optimizer::RunningLoss;
use super::phase::Phase;

/// What one pass over a loader did.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSummary {
    /// Phase that ran.
    pub phase: Phase,
    /// Epoch index.
    pub epoch: usize,
    /// Batches whose loss was computed (and, in training, applied).
    pub batches: usize,
    /// Batches skipped after an error.
    pub failures: usize,
    /// Mean total loss over processed batches.
    pub mean_loss: f32,
    /// Lowest total loss in the pass.
    pub best_loss: f32,
    /// Whether the pass stopped at the debug step limit.
    pub truncated: bool,
}

/// Accumulates per-batch totals into a [`PhaseSummary`].
#[derive(Debug, Clone)]
pub(crate) struct PhaseTracker {
    phase: Phase,
    epoch: usize,
    sum: f64,
    running: RunningLoss,
}

impl PhaseTracker {
    pub(crate) fn new(phase: Phase, epoch: usize) -> Self {
        Self {
            phase,
            epoch,
            sum: 0.0,
            running: RunningLoss::default(),
        }
    }

    pub(crate) fn add(&mut self, total: f32) {
        self.sum += total as f64;
        self.running.update(total);
    }

    pub(crate) fn smoothed(&self) -> f32 {
        self.running.avg
    }

    pub(crate) fn finish(self, failures: usize, truncated: bool) -> PhaseSummary {
        let batches = self.running.count;
        PhaseSummary {
            phase: self.phase,
            epoch: self.epoch,
            batches,
            failures,
            mean_loss: if batches == 0 {
                f32::NAN
            } else {
                (self.sum / batches as f64) as f32
            },
            best_loss: self.running.best,
            truncated,
        }
    }
}
