//! Loss mask and masked MSE behavior.

use burn::backend::NdArray;
use burn::prelude::*;
use burn::tensor::{ElementConversion, TensorData};

use neural_mia::config::MaskOverride;
use neural_mia::loss::{build_loss_mask, example_weights, masked_mse};
use neural_mia::MiaError;

type TestBackend = NdArray;

fn paths(sessions: &[&str], frames: usize) -> Vec<Vec<String>> {
    sessions
        .iter()
        .map(|s| (0..frames).map(|f| format!("data/{}/clip/frame_{:04}.jpg", s, f)).collect())
        .collect()
}

fn scalar(t: Tensor<TestBackend, 1>) -> f32 {
    t.into_scalar().elem()
}

#[test]
fn test_override_applies_only_to_matching_session() {
    let device = Default::default();
    let rules = vec![MaskOverride::new("2423".to_string(), 1).with_value(0.0)];

    let mask = build_loss_mask::<TestBackend>(&paths(&["2423", "2517"], 3), 2, 3, &rules, &device)
        .unwrap();
    let values = mask.into_data().to_vec::<f32>().unwrap();

    // [example 0: ch0 ones, ch1 zeros][example 1: all ones]
    assert_eq!(values, vec![1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
}

#[test]
fn test_out_of_range_override_channel() {
    let rules = vec![MaskOverride::new("2423".to_string(), 4)];
    let result = build_loss_mask::<TestBackend>(&paths(&["2423"], 2), 2, 2, &rules, &Default::default());

    assert!(matches!(result, Err(MiaError::InvalidConfig { .. })));
}

#[test]
fn test_masked_entries_do_not_contribute() {
    let device = Default::default();
    let pred = Tensor::<TestBackend, 3>::from_data(
        TensorData::new(vec![0.5, 0.5, 9.0, -9.0], [1, 2, 2]),
        &device,
    );
    let target = Tensor::<TestBackend, 3>::zeros([1, 2, 2], &device);
    let mask = Tensor::<TestBackend, 3>::from_data(
        TensorData::new(vec![1.0, 1.0, 0.0, 0.0], [1, 2, 2]),
        &device,
    );

    // Masked entries still count in the denominator.
    let loss = scalar(masked_mse(pred, target, mask));
    assert!((loss - 0.5 / 4.0).abs() < 1e-6, "loss = {}", loss);
}

#[test]
fn test_perfect_prediction_is_zero() {
    let device = Default::default();
    let target = Tensor::<TestBackend, 3>::random(
        [2, 3, 4],
        burn::tensor::Distribution::Uniform(0.0, 1.0),
        &device,
    );
    let mask = Tensor::<TestBackend, 3>::ones([2, 3, 4], &device);

    assert_eq!(scalar(masked_mse(target.clone(), target, mask)), 0.0);
}

#[test]
fn test_example_weights_exclusion() {
    let device = Default::default();
    let (weights, kept) =
        example_weights::<TestBackend>(&paths(&["2423", "2517", "2423"], 2), Some("2423"), &device);

    assert_eq!(kept, 1);
    assert_eq!(weights.dims(), [3, 1, 1]);
    assert_eq!(weights.into_data().to_vec::<f32>().unwrap(), vec![0.0, 1.0, 0.0]);

    let (_, kept) = example_weights::<TestBackend>(&paths(&["2423"], 2), None, &device);
    assert_eq!(kept, 1);
}
