//! Training infrastructure for EMG regression.
//!
//! This module provides:
//! - `TrainPipeline`: per-batch geometry, model call and preliminary loss
//! - `Trainer`: epoch driver and training loop controller
//! - Failure tolerance, learning-rate schedule and phase summaries
//! - Global-norm gradient clipping
//! - Checkpoint save/load for training resumption
//! - `run_training`: end-to-end run setup

mod checkpoint;
mod clip;
mod failure;
mod logger;
mod metrics;
mod optimizer;
mod phase;
mod pipeline;
mod run;
mod trainer;

pub use checkpoint::{
    checkpoint_exists, find_latest_checkpoint, load_checkpoint, read_metadata, save_checkpoint,
    CheckpointManager, CheckpointMetadata, CheckpointSink, CHECKPOINT_VERSION,
};
pub use clip::{clip_grad_norm, global_grad_norm};
pub use failure::{FailureAction, FailurePolicy};
pub use logger::{RunLogger, TrainLogger};
pub use metrics::PhaseSummary;
pub use optimizer::{adamw_config, MultiStepLr, RunningLoss};
pub use phase::Phase;
pub use pipeline::{ModelOutput, TrainPipeline};
pub use run::{run_training, RunOutcome};
pub use trainer::Trainer;
