//! The regressor interface and the config-selected model.

use burn::module::Module;
use burn::prelude::*;

use super::conv::ConvEmg;
use super::transformer::TransformerEmg;
use crate::config::{ModelConfig, ModelKind};

/// Maps a normalized keypoint sequence to an EMG sequence.
pub trait EmgRegressor<B: Backend> {
    /// `[batch, 1, features, frames] -> [batch, channels, frames]`
    fn forward(&self, keypoints: Tensor<B, 4>) -> Tensor<B, 3>;

    /// Number of predicted EMG channels.
    fn num_channels(&self) -> usize;
}

/// EMG regressor whose backbone is chosen by [`ModelConfig::kind`].
#[derive(Module, Debug)]
pub enum EmgNet<B: Backend> {
    Transformer(TransformerEmg<B>),
    Conv(ConvEmg<B>),
}

impl ModelConfig {
    /// Initialize the model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> EmgNet<B> {
        EmgNet::new(self, device)
    }
}

impl<B: Backend> EmgNet<B> {
    /// Create the backbone selected by `config.kind`.
    pub fn new(config: &ModelConfig, device: &B::Device) -> Self {
        match config.kind {
            ModelKind::Transformer => Self::Transformer(TransformerEmg::new(config, device)),
            ModelKind::Conv => Self::Conv(ConvEmg::new(config, device)),
        }
    }

    /// Which backbone this model runs.
    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Transformer(_) => ModelKind::Transformer,
            Self::Conv(_) => ModelKind::Conv,
        }
    }

    /// Forward pass through the selected backbone.
    pub fn forward(&self, keypoints: Tensor<B, 4>) -> Tensor<B, 3> {
        match self {
            Self::Transformer(model) => model.forward(keypoints),
            Self::Conv(model) => model.forward(keypoints),
        }
    }
}

impl<B: Backend> EmgRegressor<B> for EmgNet<B> {
    fn forward(&self, keypoints: Tensor<B, 4>) -> Tensor<B, 3> {
        EmgNet::forward(self, keypoints)
    }

    fn num_channels(&self) -> usize {
        match self {
            Self::Transformer(model) => model.num_channels(),
            Self::Conv(model) => model.num_channels(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConvEmgConfig, TransformerEmgConfig};
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn small(kind: ModelKind) -> ModelConfig {
        ModelConfig::new(8, 3, 5)
            .with_kind(kind)
            .with_transformer(
                TransformerEmgConfig::new()
                    .with_d_model(8)
                    .with_n_heads(2)
                    .with_d_ff(16)
                    .with_n_layers(1),
            )
            .with_conv(ConvEmgConfig::new().with_hidden_channels(4))
    }

    #[test]
    fn test_kind_selects_backbone() {
        let device = Default::default();
        for kind in [ModelKind::Transformer, ModelKind::Conv] {
            let model = small(kind).init::<TestBackend>(&device);
            assert_eq!(model.kind(), kind);
            match (&model, kind) {
                (EmgNet::Transformer(_), ModelKind::Transformer)
                | (EmgNet::Conv(_), ModelKind::Conv) => {}
                _ => panic!("{kind:?} built the wrong backbone"),
            }

            let output = EmgRegressor::forward(&model, Tensor::zeros([2, 1, 8, 5], &device));
            assert_eq!(output.dims(), [2, 3, 5]);
            assert_eq!(model.num_channels(), 3);
        }
    }
}
