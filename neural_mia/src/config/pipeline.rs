//! Projection pipeline and loss configuration.

use burn::config::Config;

/// Forces one output channel's loss weight for examples from a given session.
///
/// An example matches when the path of its first frame contains `pattern`.
#[derive(Config, Debug, PartialEq)]
pub struct MaskOverride {
    /// Substring searched for in the frame path.
    pub pattern: String,

    /// EMG channel the override applies to.
    pub channel: usize,

    /// Mask value written for every frame of that channel.
    #[config(default = 1.0)]
    pub value: f32,
}

/// Configuration for the forward pass: reprojection geometry and target scaling.
#[derive(Config, Debug)]
pub struct PipelineConfig {
    /// Focal length (pixels) used to reproject the 3D joints.
    #[config(default = 5000.0)]
    pub focal_length: f32,

    /// Full video frame width in pixels.
    #[config(default = 1080.0)]
    pub image_width: f32,

    /// Full video frame height in pixels.
    #[config(default = 1920.0)]
    pub image_height: f32,

    /// Side length of the crop the pose estimator ran on.
    #[config(default = 224.0)]
    pub crop_resolution: f32,

    /// Raw EMG values are divided by this before the loss.
    #[config(default = 100.0)]
    pub emg_scale: f32,

    /// Frames per training sequence.
    #[config(default = 30)]
    pub sequence_length: usize,

    /// Per-session channel mask overrides.
    #[config(default = "vec![MaskOverride::new(\"2423\".to_string(), 4)]")]
    pub mask_overrides: Vec<MaskOverride>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.focal_length <= 0.0 {
            return Err("focal_length must be positive".to_string());
        }
        if self.image_width <= 0.0 || self.image_height <= 0.0 {
            return Err("image dimensions must be positive".to_string());
        }
        if self.crop_resolution <= 0.0 {
            return Err("crop_resolution must be positive".to_string());
        }
        if self.emg_scale == 0.0 {
            return Err("emg_scale must be non-zero".to_string());
        }
        if self.sequence_length == 0 {
            return Err("sequence_length must be positive".to_string());
        }
        Ok(())
    }
}

/// Weights for the batch-level loss terms.
#[derive(Config, Debug)]
pub struct LossConfig {
    /// Weight for the masked mean squared error.
    #[config(default = 1.0)]
    pub mse_weight: f32,

    /// Weight for the masked mean absolute error (0 = disabled).
    #[config(default = 0.0)]
    pub l1_weight: f32,
}

impl Default for LossConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pipeline_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.focal_length, 5000.0);
        assert_eq!(config.image_width, 1080.0);
        assert_eq!(config.image_height, 1920.0);
        assert_eq!(config.mask_overrides.len(), 1);
        assert_eq!(config.mask_overrides[0].pattern, "2423");
        assert_eq!(config.mask_overrides[0].channel, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let invalid = PipelineConfig::new().with_focal_length(0.0);
        assert!(invalid.validate().is_err());

        let invalid = PipelineConfig::new().with_sequence_length(0);
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_loss_defaults() {
        let config = LossConfig::default();
        assert_eq!(config.mse_weight, 1.0);
        assert_eq!(config.l1_weight, 0.0);
    }
}
