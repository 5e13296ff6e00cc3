//! Neural network configuration types.

use burn::config::Config;
use serde::{Deserialize, Serialize};

/// Backbone family used to regress EMG from keypoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    /// Per-frame embedding followed by a transformer encoder over time.
    Transformer,
    /// Convolution over the keypoint axis followed by temporal convolutions.
    Conv,
}

impl ModelKind {
    /// Short identifier used in run names and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Transformer => "transf",
            ModelKind::Conv => "conv",
        }
    }
}

/// Configuration for the transformer backbone.
#[derive(Config, Debug)]
pub struct TransformerEmgConfig {
    /// Token embedding width.
    #[config(default = 128)]
    pub d_model: usize,

    /// Attention heads per layer.
    #[config(default = 4)]
    pub n_heads: usize,

    /// Encoder layers.
    #[config(default = 2)]
    pub n_layers: usize,

    /// Feed-forward width inside each encoder layer.
    #[config(default = 256)]
    pub d_ff: usize,

    /// Dropout probability.
    #[config(default = 0.1)]
    pub dropout: f64,
}

/// Configuration for the convolutional backbone.
#[derive(Config, Debug)]
pub struct ConvEmgConfig {
    /// Channels produced by the keypoint-collapsing convolution.
    #[config(default = 64)]
    pub hidden_channels: usize,

    /// Temporal kernel size (odd, so sequences keep their length).
    #[config(default = 5)]
    pub kernel_size: usize,

    /// Temporal convolution layers after the first one.
    #[config(default = 2)]
    pub temporal_layers: usize,
}

/// Configuration for an EMG regressor.
///
/// Both backbones map `[batch, 1, input_features, frames]` to
/// `[batch, num_channels, frames]`; `kind` selects which one is built.
#[derive(Config, Debug)]
pub struct ModelConfig {
    /// Flattened keypoint features per frame (`joints * 2`).
    pub input_features: usize,

    /// EMG channels to predict.
    pub num_channels: usize,

    /// Frames per sequence (number of transformer tokens).
    pub num_frames: usize,

    /// Backbone family.
    #[config(default = "ModelKind::Transformer")]
    pub kind: ModelKind,

    /// Transformer backbone settings.
    #[config(default = "TransformerEmgConfig::new()")]
    pub transformer: TransformerEmgConfig,

    /// Convolutional backbone settings.
    #[config(default = "ConvEmgConfig::new()")]
    pub conv: ConvEmgConfig,
}

impl ModelConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.input_features == 0 || self.num_channels == 0 || self.num_frames == 0 {
            return Err("input_features, num_channels and num_frames must be positive".to_string());
        }
        match self.kind {
            ModelKind::Transformer => {
                let t = &self.transformer;
                if t.n_heads == 0 || t.d_model % t.n_heads != 0 {
                    return Err("d_model must be divisible by n_heads".to_string());
                }
                if t.n_layers == 0 {
                    return Err("n_layers must be positive".to_string());
                }
                if !(0.0..1.0).contains(&t.dropout) {
                    return Err("dropout must be in [0, 1)".to_string());
                }
            }
            ModelKind::Conv => {
                if self.conv.kernel_size % 2 == 0 {
                    return Err("kernel_size must be odd".to_string());
                }
                if self.conv.hidden_channels == 0 {
                    return Err("hidden_channels must be positive".to_string());
                }
            }
        }
        Ok(())
    }
}
