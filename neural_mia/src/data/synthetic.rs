//! Synthetic pose/EMG sequences.
//!
//! Generates records that are geometrically consistent: the 3D skeleton,
//! crop and weak-perspective camera reproject onto the stored 2D keypoints,
//! and each EMG channel follows the motion of one joint so the mapping is
//! learnable.

use mia_core::{
    project_points, translation_to_weak_perspective, BoundingBox, CameraIntrinsics, ImageSize,
    Mat3, Point2, Point3,
};

use super::batch::EmgSample;
use crate::config::{DatasetConfig, PipelineConfig};
use crate::error::Result;

/// Session identifiers assigned round-robin to synthetic sequences.
pub const SYNTHETIC_SESSIONS: [&str; 4] = ["2423", "2517", "2608", "2714"];

/// Generator for synthetic training sequences.
#[derive(Debug, Clone)]
pub struct SyntheticEmgDataset {
    dataset: DatasetConfig,
    image: ImageSize,
    focal_length: f32,
    skeleton: Vec<Point3>,
    seed: u64,
}

impl SyntheticEmgDataset {
    /// Create a generator matching the dataset shape and pipeline geometry.
    pub fn new(dataset: &DatasetConfig, pipeline: &PipelineConfig) -> Self {
        let mut seed = dataset.seed;
        let skeleton = (0..dataset.num_joints)
            .map(|_| {
                Point3::new(
                    rand(&mut seed) * 0.8 - 0.4,
                    rand(&mut seed) * 1.6 - 0.8,
                    rand(&mut seed) * 0.3 - 0.15,
                )
            })
            .collect();

        Self {
            dataset: dataset.clone(),
            image: ImageSize::new(pipeline.image_width, pipeline.image_height),
            focal_length: pipeline.focal_length,
            skeleton,
            seed,
        }
    }

    /// Generate `count` sequences starting at sequence index `offset`.
    pub fn generate(&self, offset: usize, count: usize) -> Result<Vec<EmgSample>> {
        (offset..offset + count).map(|i| self.sequence(i)).collect()
    }

    /// Generate the training and validation splits.
    pub fn splits(&self) -> Result<(Vec<EmgSample>, Vec<EmgSample>)> {
        let train = self.generate(0, self.dataset.train_sequences)?;
        let val = self.generate(self.dataset.train_sequences, self.dataset.val_sequences)?;
        Ok((train, val))
    }

    fn sequence(&self, index: usize) -> Result<EmgSample> {
        let cfg = &self.dataset;
        let (f, j, c) = (cfg.num_frames, cfg.num_joints, cfg.num_channels);
        let mut seed = self.seed ^ (index as u64).wrapping_mul(0x2545_F491_4F6C_DD1D);

        let session = SYNTHETIC_SESSIONS[index % SYNTHETIC_SESSIONS.len()];
        let root = Point3::new(
            rand(&mut seed) * 0.6 - 0.3,
            rand(&mut seed) * 0.6 - 0.3,
            8.0 + rand(&mut seed) * 6.0,
        );
        let omega = 0.2 + rand(&mut seed) * 0.3;
        let phases: Vec<f32> = (0..j).map(|_| rand(&mut seed) * std::f32::consts::TAU).collect();
        let amplitude = 0.05 + rand(&mut seed) * 0.1;

        let intrinsics = CameraIntrinsics::for_image(self.focal_length, self.image);

        let mut sample = EmgSample {
            keypoints_2d: Vec::with_capacity(f * j * 2),
            keypoints_3d: Vec::with_capacity(f * j * 3),
            bboxes: Vec::with_capacity(f * 3),
            pred_cam: Vec::with_capacity(f * 3),
            emg: Vec::with_capacity(f * c),
            emg_bins: Vec::with_capacity(f * c),
            condition: vec![(index % SYNTHETIC_SESSIONS.len()) as f32 / SYNTHETIC_SESSIONS.len() as f32; cfg.condition_dim],
            frame_paths: Vec::with_capacity(f),
        };

        for frame in 0..f {
            let t = frame as f32;
            let joints: Vec<Point3> = self
                .skeleton
                .iter()
                .zip(&phases)
                .map(|(&p, &phase)| p + Point3::new(0.0, amplitude * (omega * t + phase).sin(), 0.0))
                .collect();

            let pixels = project_points(&joints, &Mat3::IDENTITY, root, &intrinsics);
            let (center, _) = mia_core::project_point(Point3::splat(0.0), &Mat3::IDENTITY, root, &intrinsics);
            let bbox = BoundingBox::new(
                Point2::new(center.x, center.y),
                self.focal_length * 2.0 / root.z,
            );
            let cam = translation_to_weak_perspective(root, bbox, self.image, self.focal_length)?;

            for (p3, p2) in joints.iter().zip(&pixels) {
                sample.keypoints_3d.extend_from_slice(&p3.as_array());
                sample.keypoints_2d.extend_from_slice(&p2.as_array());
            }
            sample.bboxes.extend_from_slice(&bbox.as_array());
            sample.pred_cam.extend_from_slice(&cam.as_array());

            for ch in 0..c {
                let phase = phases[ch % j];
                let value = 50.0 * (1.0 + (omega * t + phase).sin());
                let bin = ((value / 100.0) * cfg.num_bins as f32) as i64;
                sample.emg.push(value);
                sample.emg_bins.push(bin.clamp(0, cfg.num_bins as i64 - 1));
            }

            sample
                .frame_paths
                .push(format!("synthetic/{}/{:05}/frame_{:04}.jpg", session, index, frame));
        }

        Ok(sample)
    }
}

fn rand(seed: &mut u64) -> f32 {
    *seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
    ((*seed >> 33) as f32) / (1u64 << 31) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use mia_core::weak_perspective_to_translation;

    fn dataset() -> DatasetConfig {
        DatasetConfig::new()
            .with_num_frames(6)
            .with_num_joints(5)
            .with_num_channels(3)
            .with_train_sequences(4)
            .with_val_sequences(2)
    }

    #[test]
    fn test_sample_shapes() {
        let gen = SyntheticEmgDataset::new(&dataset(), &PipelineConfig::default());
        let (train, val) = gen.splits().unwrap();

        assert_eq!(train.len(), 4);
        assert_eq!(val.len(), 2);
        let s = &train[0];
        assert_eq!(s.keypoints_2d.len(), 6 * 5 * 2);
        assert_eq!(s.keypoints_3d.len(), 6 * 5 * 3);
        assert_eq!(s.emg.len(), 6 * 3);
        assert_eq!(s.frame_paths.len(), 6);
        assert!(s.frame_paths[0].contains("2423"));
        assert!(train[1].frame_paths[0].contains("2517"));
    }

    #[test]
    fn test_deterministic() {
        let gen = SyntheticEmgDataset::new(&dataset(), &PipelineConfig::default());
        assert_eq!(gen.generate(0, 2).unwrap(), gen.generate(0, 2).unwrap());
    }

    #[test]
    fn test_emg_in_range() {
        let gen = SyntheticEmgDataset::new(&dataset(), &PipelineConfig::default());
        for s in gen.generate(0, 4).unwrap() {
            assert!(s.emg.iter().all(|&v| (0.0..=100.0).contains(&v)));
            assert!(s.emg_bins.iter().all(|&b| (0..20).contains(&b)));
        }
    }

    #[test]
    fn test_camera_recovers_root() {
        let pipeline = PipelineConfig::default();
        let gen = SyntheticEmgDataset::new(&dataset(), &pipeline);
        let s = gen.generate(3, 1).unwrap().remove(0);

        let bbox = BoundingBox::new(Point2::new(s.bboxes[0], s.bboxes[1]), s.bboxes[2]);
        let cam = mia_core::WeakPerspectiveCamera::new(s.pred_cam[0], s.pred_cam[1], s.pred_cam[2]);
        let t = weak_perspective_to_translation(
            cam,
            bbox,
            ImageSize::default(),
            pipeline.focal_length,
            pipeline.crop_resolution,
        )
        .unwrap();

        let intrinsics = CameraIntrinsics::for_image(pipeline.focal_length, ImageSize::default());
        let joint = Point3::new(s.keypoints_3d[0], s.keypoints_3d[1], s.keypoints_3d[2]);
        let (px, _) = mia_core::project_point(joint, &Mat3::IDENTITY, t, &intrinsics);

        assert!((px.x - s.keypoints_2d[0]).abs() < 0.05, "{} vs {}", px.x, s.keypoints_2d[0]);
        assert!((px.y - s.keypoints_2d[1]).abs() < 0.05, "{} vs {}", px.y, s.keypoints_2d[1]);
    }
}
