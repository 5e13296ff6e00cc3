//! Transformer backbone.

use burn::module::Module;
use burn::nn::transformer::{TransformerEncoder, TransformerEncoderConfig, TransformerEncoderInput};
use burn::nn::{Embedding, EmbeddingConfig, Linear, LinearConfig};
use burn::prelude::*;

use super::model::EmgRegressor;
use crate::config::ModelConfig;

/// Treats each frame as a token.
///
/// Keypoint features are embedded per frame, summed with a learned position
/// embedding, mixed over time by a transformer encoder and projected to EMG
/// channels.
#[derive(Module, Debug)]
pub struct TransformerEmg<B: Backend> {
    /// Per-frame feature embedding.
    embed: Linear<B>,
    /// Learned position embedding, one row per frame.
    positions: Embedding<B>,
    /// Temporal encoder.
    encoder: TransformerEncoder<B>,
    /// Output projection to EMG channels.
    head: Linear<B>,
    #[module(skip)]
    num_channels: usize,
}

impl<B: Backend> TransformerEmg<B> {
    /// Create a new transformer backbone from configuration.
    pub fn new(config: &ModelConfig, device: &B::Device) -> Self {
        let t = &config.transformer;
        Self {
            embed: LinearConfig::new(config.input_features, t.d_model).init(device),
            positions: EmbeddingConfig::new(config.num_frames, t.d_model).init(device),
            encoder: TransformerEncoderConfig::new(t.d_model, t.d_ff, t.n_heads, t.n_layers)
                .with_dropout(t.dropout)
                .init(device),
            head: LinearConfig::new(t.d_model, config.num_channels).init(device),
            num_channels: config.num_channels,
        }
    }

    /// Forward pass.
    ///
    /// Input shape: [batch, 1, features, frames]
    /// Output shape: [batch, channels, frames]
    pub fn forward(&self, keypoints: Tensor<B, 4>) -> Tensor<B, 3> {
        let [batch, _, features, frames] = keypoints.dims();
        let device = keypoints.device();

        let tokens = keypoints.reshape([batch, features, frames]).swap_dims(1, 2);
        let tokens = self.embed.forward(tokens);

        let index = Tensor::<B, 1, Int>::arange(0..frames as i64, &device)
            .reshape([1, frames])
            .repeat_dim(0, batch);
        let tokens = tokens + self.positions.forward(index);

        let encoded = self.encoder.forward(TransformerEncoderInput::new(tokens));
        self.head.forward(encoded).swap_dims(1, 2)
    }
}

impl<B: Backend> EmgRegressor<B> for TransformerEmg<B> {
    fn forward(&self, keypoints: Tensor<B, 4>) -> Tensor<B, 3> {
        TransformerEmg::forward(self, keypoints)
    }

    fn num_channels(&self) -> usize {
        self.num_channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransformerEmgConfig;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_transformer_forward_shape() {
        let device = Default::default();
        let config = ModelConfig::new(10, 4, 6).with_transformer(
            TransformerEmgConfig::new()
                .with_d_model(16)
                .with_n_heads(2)
                .with_d_ff(32)
                .with_n_layers(1),
        );
        let model = TransformerEmg::<TestBackend>::new(&config, &device);

        let output = model.forward(Tensor::zeros([3, 1, 10, 6], &device));
        assert_eq!(output.dims(), [3, 4, 6]);
    }
}
