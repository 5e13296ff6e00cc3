//! Dataset shape configuration.

use burn::config::Config;

/// Shape and sampling parameters of the batch records a dataset produces.
#[derive(Config, Debug)]
pub struct DatasetConfig {
    /// Frames per sequence.
    #[config(default = 30)]
    pub num_frames: usize,

    /// Joints per skeleton.
    #[config(default = 25)]
    pub num_joints: usize,

    /// EMG channels per frame.
    #[config(default = 8)]
    pub num_channels: usize,

    /// Width of the per-sequence conditioning vector.
    #[config(default = 1)]
    pub condition_dim: usize,

    /// Number of discrete EMG amplitude bins.
    #[config(default = 20)]
    pub num_bins: usize,

    /// Sequences per batch.
    #[config(default = 8)]
    pub batch_size: usize,

    /// Sequences in the training split.
    #[config(default = 256)]
    pub train_sequences: usize,

    /// Sequences in the validation split.
    #[config(default = 64)]
    pub val_sequences: usize,

    /// Seed for shuffling and synthesis.
    #[config(default = 42)]
    pub seed: u64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetConfig {
    /// Flattened keypoint features per frame (`joints * 2`).
    #[inline]
    pub fn keypoint_features(&self) -> usize {
        self.num_joints * 2
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.num_frames == 0 || self.num_joints == 0 || self.num_channels == 0 {
            return Err("num_frames, num_joints and num_channels must be positive".to_string());
        }
        if self.batch_size == 0 {
            return Err("batch_size must be positive".to_string());
        }
        if self.num_bins == 0 {
            return Err("num_bins must be positive".to_string());
        }
        Ok(())
    }
}
