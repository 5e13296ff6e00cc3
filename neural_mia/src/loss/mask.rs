//! Loss masks.

use burn::prelude::*;
use burn::tensor::TensorData;

use crate::config::MaskOverride;
use crate::error::{MiaError, Result};

/// Build the `[batch, channels, frames]` loss mask for a batch.
///
/// The mask is all ones except where an override matches: for every example
/// whose first frame path contains `pattern`, `mask[i, channel, :] = value`.
pub fn build_loss_mask<B: Backend>(
    frame_paths: &[Vec<String>],
    channels: usize,
    frames: usize,
    overrides: &[MaskOverride],
    device: &B::Device,
) -> Result<Tensor<B, 3>> {
    let batch = frame_paths.len();
    let mut mask = vec![1.0f32; batch * channels * frames];

    for rule in overrides {
        if rule.channel >= channels {
            return Err(MiaError::invalid_config(format!(
                "mask override '{}' targets channel {} but the model predicts {}",
                rule.pattern, rule.channel, channels
            )));
        }
        for (i, paths) in frame_paths.iter().enumerate() {
            if first_path_contains(paths, &rule.pattern) {
                let start = (i * channels + rule.channel) * frames;
                mask[start..start + frames].fill(rule.value);
            }
        }
    }

    Ok(Tensor::from_data(
        TensorData::new(mask, [batch, channels, frames]),
        device,
    ))
}

/// Per-example weights `[batch, 1, 1]`: 0 for examples from `exclude`, 1 otherwise.
///
/// Returns the weights and the number of examples kept.
pub fn example_weights<B: Backend>(
    frame_paths: &[Vec<String>],
    exclude: Option<&str>,
    device: &B::Device,
) -> (Tensor<B, 3>, usize) {
    let weights: Vec<f32> = frame_paths
        .iter()
        .map(|paths| match exclude {
            Some(id) if first_path_contains(paths, id) => 0.0,
            _ => 1.0,
        })
        .collect();
    let kept = weights.iter().filter(|&&w| w > 0.0).count();
    let batch = weights.len();

    (
        Tensor::from_data(TensorData::new(weights, [batch, 1, 1]), device),
        kept,
    )
}

fn first_path_contains(paths: &[String], pattern: &str) -> bool {
    paths.first().is_some_and(|p| p.contains(pattern))
}
