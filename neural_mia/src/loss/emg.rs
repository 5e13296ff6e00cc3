//! Batch-level loss aggregation.

use burn::prelude::*;

use super::{example_weights, masked_l1, masked_mse, LossRecord};
use crate::config::LossConfig;
use crate::data::EmgBatch;
use crate::error::Result;
use crate::training::{ModelOutput, Phase};

/// Combines the per-batch loss terms into a `total` for one phase.
///
/// A new aggregator is created every time the pipeline changes phase.
#[derive(Debug, Clone)]
pub struct EmgLosses {
    config: LossConfig,
    phase: Phase,
}

impl EmgLosses {
    /// Create the aggregator for a phase.
    pub fn new(config: LossConfig, phase: Phase) -> Self {
        Self { config, phase }
    }

    /// The phase this aggregator was built for.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Finalize the loss of one batch.
    ///
    /// Starts from the preliminary record and adds `total`. When `exclude` is
    /// set, examples whose first frame path contains it are dropped from the
    /// regression terms; if every example is dropped the terms are zero.
    pub fn entire_batch<B: Backend>(
        &self,
        batch: &EmgBatch<B>,
        output: &ModelOutput<B>,
        preliminary: LossRecord<B>,
        exclude: Option<&str>,
        total_step: usize,
    ) -> Result<LossRecord<B>> {
        let device = output.emg_output.device();
        let (weights, kept) = example_weights::<B>(&batch.frame_paths, exclude, &device);
        let batch_size = batch.frame_paths.len();
        let mut record = preliminary;

        let mask = if kept < batch_size {
            log::debug!(
                "[{}] step {}: excluding {} of {} examples",
                self.phase,
                total_step,
                batch_size - kept,
                batch_size
            );
            let rescale = if kept == 0 {
                0.0
            } else {
                batch_size as f32 / kept as f32
            };
            let mask = output.loss_mask.clone() * weights;
            // Rescale so the mean runs over kept examples only.
            let mse = masked_mse(output.emg_output.clone(), output.emg_gt.clone(), mask.clone())
                .mul_scalar(rescale);
            record.insert("mse", mse);
            Some((mask, rescale))
        } else {
            None
        };

        let mse = match record.get("mse") {
            Some(mse) => mse.clone(),
            None => masked_mse(
                output.emg_output.clone(),
                output.emg_gt.clone(),
                output.loss_mask.clone(),
            ),
        };
        let mut total = mse.mul_scalar(self.config.mse_weight);

        if self.config.l1_weight > 0.0 {
            let l1 = match mask {
                Some((mask, rescale)) => {
                    masked_l1(output.emg_output.clone(), output.emg_gt.clone(), mask).mul_scalar(rescale)
                }
                None => masked_l1(
                    output.emg_output.clone(),
                    output.emg_gt.clone(),
                    output.loss_mask.clone(),
                ),
            };
            total = total + l1.clone().mul_scalar(self.config.l1_weight);
            record.insert("l1", l1);
        }

        record.insert(LossRecord::<B>::TOTAL, total);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::{ElementConversion, TensorData};

    type TestBackend = NdArray;

    fn fixture(ids: &[&str]) -> (EmgBatch<TestBackend>, ModelOutput<TestBackend>) {
        let device = Default::default();
        let b = ids.len();
        let paths: Vec<Vec<String>> = ids.iter().map(|id| vec![format!("{}/0.jpg", id)]).collect();
        let batch = EmgBatch {
            keypoints_2d: Tensor::zeros([b, 1, 1, 2], &device),
            keypoints_3d: Tensor::zeros([b, 1, 1, 3], &device),
            bboxes: Tensor::zeros([b, 1, 3], &device),
            pred_cam: Tensor::zeros([b, 1, 3], &device),
            emg: Tensor::zeros([b, 1, 1], &device),
            emg_bins: Tensor::zeros([b, 1, 1], &device),
            condition: Tensor::zeros([b, 1], &device),
            frame_paths: paths,
        };
        // Example i predicts i + 1 against a zero target.
        let pred: Vec<f32> = (0..b).map(|i| (i + 1) as f32).collect();
        let output = ModelOutput {
            emg_output: Tensor::from_data(TensorData::new(pred, [b, 1, 1]), &device),
            emg_gt: Tensor::zeros([b, 1, 1], &device),
            keypoints_2d: Tensor::zeros([b, 1, 2], &device),
            loss_mask: Tensor::ones([b, 1, 1], &device),
        };
        (batch, output)
    }

    fn scalar(record: &LossRecord<TestBackend>, name: &str) -> f32 {
        record.get(name).unwrap().clone().into_scalar().elem()
    }

    #[test]
    fn test_total_from_preliminary() {
        let (batch, output) = fixture(&["a", "b"]);
        let losses = EmgLosses::new(LossConfig::default(), Phase::Train);
        let prelim = LossRecord::new().with(
            "mse",
            masked_mse(output.emg_output.clone(), output.emg_gt.clone(), output.loss_mask.clone()),
        );

        let record = losses.entire_batch(&batch, &output, prelim, None, 0).unwrap();
        assert!((scalar(&record, "total") - 2.5).abs() < 1e-6);
        assert!(record.get("l1").is_none());
    }

    #[test]
    fn test_exclusion_averages_over_kept() {
        let (batch, output) = fixture(&["a", "b"]);
        let losses = EmgLosses::new(LossConfig::default(), Phase::Train);

        let record = losses
            .entire_batch(&batch, &output, LossRecord::new(), Some("b"), 0)
            .unwrap();
        assert!((scalar(&record, "mse") - 1.0).abs() < 1e-6);

        let record = losses
            .entire_batch(&batch, &output, LossRecord::new(), Some("/"), 0)
            .unwrap();
        assert_eq!(scalar(&record, "total"), 0.0);
    }

    #[test]
    fn test_l1_term() {
        let (batch, output) = fixture(&["a", "b"]);
        let config = LossConfig::new().with_mse_weight(0.0).with_l1_weight(2.0);
        let losses = EmgLosses::new(config, Phase::Eval);

        let record = losses.entire_batch(&batch, &output, LossRecord::new(), None, 0).unwrap();
        assert!((scalar(&record, "l1") - 1.5).abs() < 1e-6);
        assert!((scalar(&record, "total") - 3.0).abs() < 1e-6);
        assert_eq!(losses.phase(), Phase::Eval);
    }
}
