//! Batch records consumed by the training pipeline.

use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::TensorData;

use crate::config::DatasetConfig;
use crate::error::{MiaError, Result};

/// One sequence of frames, stored flat on the host.
///
/// Field layouts are row-major: `keypoints_2d` is `[frames, joints, 2]`,
/// `emg` is `[frames, channels]`, and so on.
#[derive(Debug, Clone, PartialEq)]
pub struct EmgSample {
    /// Detected 2D keypoints in full-image pixels.
    pub keypoints_2d: Vec<f32>,
    /// Estimated 3D keypoints in body coordinates.
    pub keypoints_3d: Vec<f32>,
    /// Per-frame crop `(center_x, center_y, height)`.
    pub bboxes: Vec<f32>,
    /// Per-frame weak-perspective camera `(s, tx, ty)`.
    pub pred_cam: Vec<f32>,
    /// Raw EMG amplitudes.
    pub emg: Vec<f32>,
    /// Discretized EMG amplitudes.
    pub emg_bins: Vec<i64>,
    /// Conditioning vector.
    pub condition: Vec<f32>,
    /// Source frame identifiers.
    pub frame_paths: Vec<String>,
}

/// A batch of sequences on a device.
#[derive(Debug, Clone)]
pub struct EmgBatch<B: Backend> {
    /// `[batch, frames, joints, 2]`
    pub keypoints_2d: Tensor<B, 4>,
    /// `[batch, frames, joints, 3]`
    pub keypoints_3d: Tensor<B, 4>,
    /// `[batch, frames, 3]` as `(center_x, center_y, height)`
    pub bboxes: Tensor<B, 3>,
    /// `[batch, frames, 3]` as `(s, tx, ty)`
    pub pred_cam: Tensor<B, 3>,
    /// `[batch, frames, channels]`
    pub emg: Tensor<B, 3>,
    /// `[batch, frames, channels]`
    pub emg_bins: Tensor<B, 3, Int>,
    /// `[batch, condition_dim]`
    pub condition: Tensor<B, 2>,
    /// `batch x frames` frame identifiers.
    pub frame_paths: Vec<Vec<String>>,
}

impl<B: Backend> EmgBatch<B> {
    /// Stack samples into a batch.
    ///
    /// Every sample must match the shape described by `config`.
    pub fn collate(samples: &[&EmgSample], config: &DatasetConfig, device: &B::Device) -> Result<Self> {
        let b = samples.len();
        let (f, j, c) = (config.num_frames, config.num_joints, config.num_channels);
        let d = config.condition_dim;

        if b == 0 {
            return Err(MiaError::shape_mismatch("batch", &[1], &[0]));
        }

        let mut kp2 = Vec::with_capacity(b * f * j * 2);
        let mut kp3 = Vec::with_capacity(b * f * j * 3);
        let mut bboxes = Vec::with_capacity(b * f * 3);
        let mut cams = Vec::with_capacity(b * f * 3);
        let mut emg = Vec::with_capacity(b * f * c);
        let mut bins = Vec::with_capacity(b * f * c);
        let mut condition = Vec::with_capacity(b * d);
        let mut frame_paths = Vec::with_capacity(b);

        for sample in samples {
            check_len("keypoints_2d", &sample.keypoints_2d, &[f, j, 2])?;
            check_len("keypoints_3d", &sample.keypoints_3d, &[f, j, 3])?;
            check_len("bboxes", &sample.bboxes, &[f, 3])?;
            check_len("pred_cam", &sample.pred_cam, &[f, 3])?;
            check_len("emg", &sample.emg, &[f, c])?;
            check_len("emg_bins", &sample.emg_bins, &[f, c])?;
            check_len("condition", &sample.condition, &[d])?;
            check_len("frame_paths", &sample.frame_paths, &[f])?;

            kp2.extend_from_slice(&sample.keypoints_2d);
            kp3.extend_from_slice(&sample.keypoints_3d);
            bboxes.extend_from_slice(&sample.bboxes);
            cams.extend_from_slice(&sample.pred_cam);
            emg.extend_from_slice(&sample.emg);
            bins.extend_from_slice(&sample.emg_bins);
            condition.extend_from_slice(&sample.condition);
            frame_paths.push(sample.frame_paths.clone());
        }

        Ok(Self {
            keypoints_2d: Tensor::from_data(TensorData::new(kp2, [b, f, j, 2]), device),
            keypoints_3d: Tensor::from_data(TensorData::new(kp3, [b, f, j, 3]), device),
            bboxes: Tensor::from_data(TensorData::new(bboxes, [b, f, 3]), device),
            pred_cam: Tensor::from_data(TensorData::new(cams, [b, f, 3]), device),
            emg: Tensor::from_data(TensorData::new(emg, [b, f, c]), device),
            emg_bins: Tensor::from_data(TensorData::new(bins, [b, f, c]), device),
            condition: Tensor::from_data(TensorData::new(condition, [b, d]), device),
            frame_paths,
        })
    }

    /// Number of sequences.
    pub fn batch_size(&self) -> usize {
        self.keypoints_3d.dims()[0]
    }

    /// Frames per sequence.
    pub fn num_frames(&self) -> usize {
        self.keypoints_3d.dims()[1]
    }

    /// Joints per skeleton.
    pub fn num_joints(&self) -> usize {
        self.keypoints_3d.dims()[2]
    }

    /// EMG channels per frame.
    pub fn num_channels(&self) -> usize {
        self.emg.dims()[2]
    }

    /// Get the device of this batch.
    pub fn device(&self) -> B::Device {
        self.keypoints_3d.device()
    }

    /// Check that every field agrees on batch size and frame count.
    ///
    /// `sequence_length` is the frame count the model was built for.
    pub fn validate(&self, sequence_length: usize) -> Result<()> {
        let [b, f, j, _] = self.keypoints_3d.dims();
        let c = self.num_channels();

        if f != sequence_length {
            return Err(MiaError::shape_mismatch(
                "keypoints_3d",
                &[b, sequence_length, j, 3],
                &self.keypoints_3d.dims(),
            ));
        }

        check_dims("keypoints_2d", &self.keypoints_2d.dims(), &[b, f, j, 2])?;
        check_dims("keypoints_3d", &self.keypoints_3d.dims(), &[b, f, j, 3])?;
        check_dims("bboxes", &self.bboxes.dims(), &[b, f, 3])?;
        check_dims("pred_cam", &self.pred_cam.dims(), &[b, f, 3])?;
        check_dims("emg", &self.emg.dims(), &[b, f, c])?;
        check_dims("emg_bins", &self.emg_bins.dims(), &[b, f, c])?;

        let [cond_b, cond_d] = self.condition.dims();
        check_dims("condition", &[cond_b, cond_d], &[b, cond_d])?;

        if self.frame_paths.len() != b {
            return Err(MiaError::shape_mismatch(
                "frame_paths",
                &[b],
                &[self.frame_paths.len()],
            ));
        }
        for paths in &self.frame_paths {
            if paths.len() != f {
                return Err(MiaError::shape_mismatch(
                    "frame_paths",
                    &[b, f],
                    &[b, paths.len()],
                ));
            }
        }

        Ok(())
    }

    /// Move the batch to another device.
    pub fn to_device(self, device: &B::Device) -> Self {
        Self {
            keypoints_2d: self.keypoints_2d.to_device(device),
            keypoints_3d: self.keypoints_3d.to_device(device),
            bboxes: self.bboxes.to_device(device),
            pred_cam: self.pred_cam.to_device(device),
            emg: self.emg.to_device(device),
            emg_bins: self.emg_bins.to_device(device),
            condition: self.condition.to_device(device),
            frame_paths: self.frame_paths,
        }
    }
}

impl<B: AutodiffBackend> EmgBatch<B> {
    /// Strip autodiff tracking for evaluation.
    pub fn inner(self) -> EmgBatch<B::InnerBackend> {
        EmgBatch {
            keypoints_2d: self.keypoints_2d.inner(),
            keypoints_3d: self.keypoints_3d.inner(),
            bboxes: self.bboxes.inner(),
            pred_cam: self.pred_cam.inner(),
            emg: self.emg.inner(),
            emg_bins: self.emg_bins.inner(),
            condition: self.condition.inner(),
            frame_paths: self.frame_paths,
        }
    }
}

fn check_len<T>(field: &'static str, values: &[T], shape: &[usize]) -> Result<()> {
    let expected: usize = shape.iter().product();
    if values.len() != expected {
        return Err(MiaError::shape_mismatch(field, &[expected], &[values.len()]));
    }
    Ok(())
}

fn check_dims(field: &'static str, got: &[usize], expected: &[usize]) -> Result<()> {
    if got != expected {
        return Err(MiaError::shape_mismatch(field, expected, got));
    }
    Ok(())
}
