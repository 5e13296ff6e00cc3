//! Forward pass of one batch: geometry, model and preliminary loss.

use burn::prelude::*;
use mia_core::ImageSize;

use super::phase::Phase;
use crate::camera::{
    convert_weak_perspective_to_full_camera, identity_rotations, image_centers,
    normalize_keypoints, perspective_projection,
};
use crate::config::{LossConfig, PipelineConfig};
use crate::data::EmgBatch;
use crate::error::{MiaError, Result};
use crate::loss::{build_loss_mask, masked_mse, EmgLosses, LossRecord};
use crate::nn::EmgRegressor;

/// Tensors produced by one forward pass.
#[derive(Debug, Clone)]
pub struct ModelOutput<B: Backend> {
    /// Predicted EMG `[batch, channels, frames]`.
    pub emg_output: Tensor<B, 3>,
    /// Scaled ground truth `[batch, channels, frames]`.
    pub emg_gt: Tensor<B, 3>,
    /// Reprojected keypoints in image units `[batch, frames, joints * 2]`.
    pub keypoints_2d: Tensor<B, 3>,
    /// Loss mask `[batch, channels, frames]`.
    pub loss_mask: Tensor<B, 3>,
}

/// Runs the per-batch computation for the current phase.
///
/// The pipeline is backend-agnostic: the trainer calls it with the autodiff
/// model during training and with `model.valid()` during evaluation.
#[derive(Debug, Clone)]
pub struct TrainPipeline {
    config: PipelineConfig,
    loss_config: LossConfig,
    losses: EmgLosses,
}

impl TrainPipeline {
    /// Create a pipeline in the training phase.
    pub fn new(config: PipelineConfig, loss_config: LossConfig) -> Self {
        let losses = EmgLosses::new(loss_config.clone(), Phase::Train);
        Self {
            config,
            loss_config,
            losses,
        }
    }

    /// Switch phase and start a fresh loss aggregator.
    ///
    /// Must be called before the first batch of every phase.
    pub fn set_phase(&mut self, phase: Phase) {
        self.losses = EmgLosses::new(self.loss_config.clone(), phase);
    }

    /// The current phase.
    pub fn phase(&self) -> Phase {
        self.losses.phase()
    }

    /// Pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn image(&self) -> ImageSize {
        ImageSize::new(self.config.image_width, self.config.image_height)
    }

    /// Reproject the 3D keypoints of a batch onto the full image.
    ///
    /// Returns `[batch, frames, joints, 2]` in image units.
    pub fn reproject<B: Backend>(&self, batch: &EmgBatch<B>) -> Tensor<B, 4> {
        let [b, t, j, _] = batch.keypoints_3d.dims();
        let n = b * t;
        let device = batch.device();
        let image = self.image();

        let bboxes = batch.bboxes.clone().reshape([n, 3]);
        let bbox_center = bboxes.clone().slice([0..n, 0..2]);
        let bbox_height = bboxes.slice([0..n, 2..3]).reshape([n]);
        let cams = batch.pred_cam.clone().reshape([n, 3]);

        let translation = convert_weak_perspective_to_full_camera(
            cams,
            bbox_height,
            bbox_center,
            image,
            self.config.focal_length,
            self.config.crop_resolution,
        );

        let (points_2d, _) = perspective_projection(
            batch.keypoints_3d.clone().reshape([n, j, 3]),
            identity_rotations(n, &device),
            translation,
            Tensor::full([n], self.config.focal_length, &device),
            image_centers(n, image, &device),
        );

        normalize_keypoints(points_2d.reshape([b, t, j, 2]), image)
    }

    /// Run one batch through geometry, model and masked MSE.
    ///
    /// Fails with [`MiaError::ShapeMismatch`] when the batch fields disagree
    /// or the model output does not match the ground truth layout.
    pub fn forward<B: Backend, M: EmgRegressor<B>>(
        &self,
        model: &M,
        batch: &EmgBatch<B>,
        step: usize,
        total_step: usize,
    ) -> Result<(ModelOutput<B>, LossRecord<B>)> {
        batch.validate(self.config.sequence_length)?;

        let [b, t, j, _] = batch.keypoints_3d.dims();
        let c = batch.num_channels();
        let device = batch.device();

        let keypoints_2d = self.reproject(batch).reshape([b, t, j * 2]);
        let model_input = keypoints_2d
            .clone()
            .swap_dims(1, 2)
            .reshape([b, 1, j * 2, t]);

        let emg_output = model.forward(model_input);
        if emg_output.dims() != [b, c, t] {
            return Err(MiaError::shape_mismatch(
                "emg_output",
                &[b, c, t],
                &emg_output.dims(),
            ));
        }

        let emg_gt = batch
            .emg
            .clone()
            .div_scalar(self.config.emg_scale)
            .swap_dims(1, 2);
        let loss_mask = build_loss_mask::<B>(
            &batch.frame_paths,
            c,
            t,
            &self.config.mask_overrides,
            &device,
        )?;

        let mse = masked_mse(emg_output.clone(), emg_gt.clone(), loss_mask.clone());
        log::trace!(
            "[{}] step {} (global {}): forward on {} sequences",
            self.phase(),
            step,
            total_step,
            b
        );

        let output = ModelOutput {
            emg_output,
            emg_gt,
            keypoints_2d,
            loss_mask,
        };
        Ok((output, LossRecord::new().with("mse", mse)))
    }

    /// Hand the batch to the phase's loss aggregator.
    pub fn finalize_batch_loss<B: Backend>(
        &self,
        batch: &EmgBatch<B>,
        output: &ModelOutput<B>,
        preliminary: LossRecord<B>,
        exclude: Option<&str>,
        _step: usize,
        total_step: usize,
    ) -> Result<LossRecord<B>> {
        self.losses
            .entire_batch(batch, output, preliminary, exclude, total_step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatasetConfig;
    use crate::data::SyntheticEmgDataset;
    use burn::backend::NdArray;
    use burn::tensor::ElementConversion;

    type TestBackend = NdArray;

    struct ConstantModel {
        channels: usize,
        value: f32,
    }

    impl<B: Backend> EmgRegressor<B> for ConstantModel {
        fn forward(&self, keypoints: Tensor<B, 4>) -> Tensor<B, 3> {
            let [b, _, _, t] = keypoints.dims();
            Tensor::full([b, self.channels, t], self.value, &keypoints.device())
        }

        fn num_channels(&self) -> usize {
            self.channels
        }
    }

    fn batch(dataset: &DatasetConfig, pipeline: &PipelineConfig) -> EmgBatch<TestBackend> {
        let samples = SyntheticEmgDataset::new(dataset, pipeline).generate(0, 2).unwrap();
        let refs: Vec<_> = samples.iter().collect();
        EmgBatch::collate(&refs, dataset, &Default::default()).unwrap()
    }

    fn dataset() -> DatasetConfig {
        DatasetConfig::new()
            .with_num_frames(4)
            .with_num_joints(3)
            .with_num_channels(5)
    }

    #[test]
    fn test_reprojection_matches_detections() {
        let dataset = dataset();
        let config = PipelineConfig::new().with_sequence_length(4);
        let batch = batch(&dataset, &config);
        let pipeline = TrainPipeline::new(config, LossConfig::default());

        let reprojected: Vec<f32> = pipeline.reproject(&batch).into_data().to_vec().unwrap();
        let detected: Vec<f32> = batch.keypoints_2d.clone().into_data().to_vec().unwrap();

        for (i, (r, d)) in reprojected.iter().zip(&detected).enumerate() {
            let scale = if i % 2 == 0 { 1080.0 } else { 1920.0 };
            assert!((r * scale - d).abs() < 0.1, "index {}: {} vs {}", i, r * scale, d);
        }
    }

    #[test]
    fn test_forward_shapes_and_loss() {
        let dataset = dataset();
        let config = PipelineConfig::new().with_sequence_length(4);
        let batch = batch(&dataset, &config);
        let pipeline = TrainPipeline::new(config, LossConfig::default());
        let model = ConstantModel { channels: 5, value: 0.0 };

        let (output, record) = pipeline.forward(&model, &batch, 0, 0).unwrap();
        assert_eq!(output.emg_output.dims(), [2, 5, 4]);
        assert_eq!(output.emg_gt.dims(), [2, 5, 4]);
        assert_eq!(output.loss_mask.dims(), [2, 5, 4]);
        assert_eq!(output.keypoints_2d.dims(), [2, 4, 6]);

        let gt = output.emg_gt.clone();
        let expected: f32 = (gt.clone() * gt).mean().into_scalar().elem();
        let mse: f32 = record.get("mse").unwrap().clone().into_scalar().elem();
        assert!((mse - expected).abs() < 1e-6);
    }

    #[test]
    fn test_forward_rejects_wrong_sequence_length() {
        let dataset = dataset();
        let config = PipelineConfig::new().with_sequence_length(4);
        let batch = batch(&dataset, &config);
        let pipeline = TrainPipeline::new(config.with_sequence_length(8), LossConfig::default());
        let model = ConstantModel { channels: 5, value: 0.0 };

        let result = pipeline.forward(&model, &batch, 0, 0);
        assert!(matches!(result, Err(MiaError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_forward_rejects_wrong_channel_count() {
        let dataset = dataset();
        let config = PipelineConfig::new().with_sequence_length(4);
        let batch = batch(&dataset, &config);
        let pipeline = TrainPipeline::new(config, LossConfig::default());
        let model = ConstantModel { channels: 3, value: 0.0 };

        let result = pipeline.forward(&model, &batch, 0, 0);
        assert!(matches!(
            result,
            Err(MiaError::ShapeMismatch { field: "emg_output", .. })
        ));
    }

    #[test]
    fn test_set_phase() {
        let mut pipeline = TrainPipeline::new(PipelineConfig::default(), LossConfig::default());
        assert_eq!(pipeline.phase(), Phase::Train);
        pipeline.set_phase(Phase::Eval);
        assert_eq!(pipeline.phase(), Phase::Eval);
    }
}
