//! Convolutional backbone.

use burn::module::Module;
use burn::nn::conv::{Conv1d, Conv1dConfig, Conv2d, Conv2dConfig};
use burn::nn::{PaddingConfig1d, PaddingConfig2d, Relu};
use burn::prelude::*;

use super::model::EmgRegressor;
use crate::config::ModelConfig;

/// Collapses the keypoint axis with one 2D convolution, then convolves over time.
#[derive(Module, Debug)]
pub struct ConvEmg<B: Backend> {
    /// `[1, features, frames] -> [hidden, 1, frames]`
    collapse: Conv2d<B>,
    /// Same-length temporal convolutions.
    temporal: Vec<Conv1d<B>>,
    /// 1x1 projection to EMG channels.
    head: Conv1d<B>,
    activation: Relu,
    #[module(skip)]
    num_channels: usize,
}

impl<B: Backend> ConvEmg<B> {
    /// Create a new convolutional backbone from configuration.
    pub fn new(config: &ModelConfig, device: &B::Device) -> Self {
        let c = &config.conv;
        let pad = c.kernel_size / 2;

        let collapse = Conv2dConfig::new([1, c.hidden_channels], [config.input_features, c.kernel_size])
            .with_padding(PaddingConfig2d::Explicit(0, pad))
            .init(device);

        let temporal = (0..c.temporal_layers)
            .map(|_| {
                Conv1dConfig::new(c.hidden_channels, c.hidden_channels, c.kernel_size)
                    .with_padding(PaddingConfig1d::Explicit(pad))
                    .init(device)
            })
            .collect();

        let head = Conv1dConfig::new(c.hidden_channels, config.num_channels, 1).init(device);

        Self {
            collapse,
            temporal,
            head,
            activation: Relu::new(),
            num_channels: config.num_channels,
        }
    }

    /// Forward pass.
    ///
    /// Input shape: [batch, 1, features, frames]
    /// Output shape: [batch, channels, frames]
    pub fn forward(&self, keypoints: Tensor<B, 4>) -> Tensor<B, 3> {
        let x = self.activation.forward(self.collapse.forward(keypoints));
        let [batch, hidden, _, frames] = x.dims();

        let mut x = x.reshape([batch, hidden, frames]);
        for layer in &self.temporal {
            x = self.activation.forward(layer.forward(x));
        }
        self.head.forward(x)
    }
}

impl<B: Backend> EmgRegressor<B> for ConvEmg<B> {
    fn forward(&self, keypoints: Tensor<B, 4>) -> Tensor<B, 3> {
        ConvEmg::forward(self, keypoints)
    }

    fn num_channels(&self) -> usize {
        self.num_channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConvEmgConfig, ModelKind};
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_conv_forward_shape() {
        let device = Default::default();
        let config = ModelConfig::new(10, 4, 6)
            .with_kind(ModelKind::Conv)
            .with_conv(ConvEmgConfig::new().with_hidden_channels(8));
        let model = ConvEmg::<TestBackend>::new(&config, &device);

        let output = model.forward(Tensor::zeros([2, 1, 10, 6], &device));
        assert_eq!(output.dims(), [2, 4, 6]);
    }

    #[test]
    fn test_conv_without_temporal_layers() {
        let device = Default::default();
        let config = ModelConfig::new(6, 3, 9)
            .with_kind(ModelKind::Conv)
            .with_conv(ConvEmgConfig::new().with_hidden_channels(4).with_temporal_layers(0));
        let model = ConvEmg::<TestBackend>::new(&config, &device);

        assert_eq!(model.forward(Tensor::ones([1, 1, 6, 9], &device)).dims(), [1, 3, 9]);
    }
}
