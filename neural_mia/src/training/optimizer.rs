//! Optimizer construction, learning-rate schedule and loss tracking.

use burn::optim::AdamWConfig;
use serde::{Deserialize, Serialize};

use crate::config::{OptimizerConfig, TrainingConfig};

/// AdamW configuration for a run.
///
/// Gradient clipping is not attached here: it is applied over the global
/// norm by the trainer, see [`clip_grad_norm`](super::clip_grad_norm).
pub fn adamw_config(config: &OptimizerConfig) -> AdamWConfig {
    AdamWConfig::new().with_weight_decay(config.weight_decay)
}

/// Step decay at fixed epoch milestones.
///
/// `lr = base_lr * gamma^k` where `k` is the number of milestones at or below
/// the number of completed [`step`](Self::step) calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiStepLr {
    base_lr: f64,
    milestones: Vec<usize>,
    gamma: f64,
    last_epoch: usize,
}

impl MultiStepLr {
    /// Create a scheduler.
    pub fn new(base_lr: f64, mut milestones: Vec<usize>, gamma: f64) -> Self {
        milestones.sort_unstable();
        Self {
            base_lr,
            milestones,
            gamma,
            last_epoch: 0,
        }
    }

    /// Scheduler for a run: milestones at 2/5, 3/5 and 4/5 of `num_epochs`.
    pub fn from_config(config: &TrainingConfig) -> Self {
        Self::new(
            config.optimizer.learning_rate,
            config.lr_milestones(),
            config.optimizer.lr_decay,
        )
    }

    /// Learning rate for the next optimizer step.
    pub fn current_lr(&self) -> f64 {
        let decays = self
            .milestones
            .iter()
            .filter(|&&m| m <= self.last_epoch)
            .count();
        self.base_lr * self.gamma.powi(decays as i32)
    }

    /// Advance by one epoch.
    pub fn step(&mut self) {
        self.last_epoch += 1;
    }

    /// Number of completed steps.
    pub fn steps(&self) -> usize {
        self.last_epoch
    }

    /// Epoch milestones.
    pub fn milestones(&self) -> &[usize] {
        &self.milestones
    }
}

/// Exponential moving average and best value of a loss.
#[derive(Debug, Clone)]
pub struct RunningLoss {
    /// Smoothed loss.
    pub avg: f32,
    /// Lowest loss seen.
    pub best: f32,
    /// Number of values seen.
    pub count: usize,
    ema_factor: f32,
}

impl Default for RunningLoss {
    fn default() -> Self {
        Self::new(0.99)
    }
}

impl RunningLoss {
    /// Create a tracker with the given EMA factor.
    pub fn new(ema_factor: f32) -> Self {
        Self {
            avg: 0.0,
            best: f32::INFINITY,
            count: 0,
            ema_factor,
        }
    }

    /// Add a loss value.
    pub fn update(&mut self, loss: f32) {
        self.count += 1;

        if self.count == 1 {
            self.avg = loss;
        } else {
            self.avg = self.ema_factor * self.avg + (1.0 - self.ema_factor) * loss;
        }

        if loss < self.best {
            self.best = loss;
        }
    }
}
