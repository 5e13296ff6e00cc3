//! Loss functions for EMG regression.
//!
//! This module provides:
//! - Masked regression terms (MSE and L1) over `[batch, channels, frames]`
//! - Construction of the per-example, per-channel loss mask
//! - [`LossRecord`], the named loss components of one batch
//! - [`EmgLosses`], the phase-scoped batch loss aggregator

mod emg;
mod mask;
mod record;

pub use emg::EmgLosses;
pub use mask::{build_loss_mask, example_weights};
pub use record::LossRecord;

use burn::prelude::*;

/// Masked mean squared error.
///
/// `mean((pred * mask - target * mask)^2)` over every element, so masked-out
/// entries still count in the denominator.
pub fn masked_mse<B: Backend>(
    pred: Tensor<B, 3>,
    target: Tensor<B, 3>,
    mask: Tensor<B, 3>,
) -> Tensor<B, 1> {
    let diff = pred * mask.clone() - target * mask;
    (diff.clone() * diff).mean()
}

/// Masked mean absolute error, reduced like [`masked_mse`].
pub fn masked_l1<B: Backend>(
    pred: Tensor<B, 3>,
    target: Tensor<B, 3>,
    mask: Tensor<B, 3>,
) -> Tensor<B, 1> {
    (pred * mask.clone() - target * mask).abs().mean()
}
