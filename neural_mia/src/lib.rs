//! # neural_mia
//!
//! Burn training pipeline that regresses surface EMG from pose keypoints.
//!
//! Every batch carries per-frame 3D joints, the weak-perspective camera a
//! pose estimator produced for each crop, and the crop bounding boxes. The
//! pipeline turns those cameras into full-image translations, projects the
//! joints onto the video frame, and feeds the normalized 2D keypoints to an
//! EMG regressor. Loss is a masked MSE over the recorded EMG channels.
//!
//! ## Features
//!
//! - **Camera geometry**: batched perspective projection and weak-perspective
//!   conversion (scalar reference math lives in `mia_core`)
//! - **Models**: transformer and convolutional regressors behind `EmgNet`
//! - **Loss**: masked MSE with per-session channel overrides and exclusions
//! - **Training loop**: per-phase failure tolerance, multi-step learning-rate
//!   decay, debug truncation and per-epoch checkpoints with resume
//!
//! ## Quick Start
//!
//! ```ignore
//! use neural_mia::prelude::*;
//! use burn::backend::{Autodiff, NdArray};
//!
//! type MyBackend = Autodiff<NdArray>;
//!
//! let config = TrainingConfig::default().with_num_epochs(5);
//! let device = Default::default();
//!
//! let dataset = SyntheticEmgDataset::new(&config.data, &config.pipeline);
//! let (train, val) = dataset.splits()?;
//! let mut loaders = DataLoaders::<MyBackend>::in_memory(train, val, config.data.clone(), &device);
//!
//! let outcome = run_training(config, &mut loaders, &device)?;
//! println!("checkpoints in {}", outcome.run_dir.display());
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Standard library support
//! - `ndarray` (default): CPU backend using ndarray
//! - `wgpu`: GPU acceleration via WebGPU

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod camera;
pub mod config;
pub mod data;
pub mod error;
pub mod loss;
pub mod nn;
pub mod training;

// Re-export key types for convenience
pub use config::{DatasetConfig, ModelConfig, PipelineConfig, TrainingConfig};
pub use data::{DataLoaders, EmgBatch};
pub use error::{MiaError, Result};
pub use nn::{EmgNet, EmgRegressor};
pub use training::{run_training, RunOutcome, Trainer};

pub use mia_core::{ImageSize, WeakPerspectiveCamera};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::camera::{
        convert_weak_perspective_to_full_camera, intrinsic_matrix, normalize_keypoints,
        perspective_projection,
    };
    pub use crate::config::{
        ConvEmgConfig, DatasetConfig, LossConfig, MaskOverride, ModelConfig, ModelKind,
        OptimizerConfig, PipelineConfig, TrainingConfig, TransformerEmgConfig,
    };
    pub use crate::data::{
        BatchLoader, DataLoaders, EmgBatch, EmgSample, InMemoryLoader, SyntheticEmgDataset,
    };
    pub use crate::error::{MiaError, Result};
    pub use crate::loss::{build_loss_mask, masked_mse, EmgLosses, LossRecord};
    pub use crate::nn::{ConvEmg, EmgNet, EmgRegressor, TransformerEmg};
    pub use crate::training::{
        checkpoint_exists, find_latest_checkpoint, load_checkpoint, run_training,
        save_checkpoint, CheckpointManager, CheckpointMetadata, CheckpointSink, FailurePolicy,
        MultiStepLr, Phase, PhaseSummary, RunLogger, RunOutcome, TrainLogger, TrainPipeline,
        Trainer,
    };

    pub use mia_core::{ImageSize, WeakPerspectiveCamera};
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = Autodiff<NdArray>;

    #[test]
    fn test_public_api() {
        let config = TrainingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.model.num_frames, config.pipeline.sequence_length);
    }

    #[test]
    fn test_model_creation() {
        use burn::backend::ndarray::NdArrayDevice;

        let device = NdArrayDevice::Cpu;
        let config = TrainingConfig::default();
        let model: EmgNet<TestBackend> = config.model.init(&device);

        assert_eq!(model.num_channels(), config.data.num_channels);
    }
}
