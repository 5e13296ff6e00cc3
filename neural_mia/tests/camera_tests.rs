//! Batched camera geometry against hand-computed values and the scalar path.

use burn::backend::NdArray;
use burn::prelude::*;
use burn::tensor::TensorData;

use mia_core::{
    project_point, weak_perspective_to_translation, BoundingBox, CameraIntrinsics, ImageSize,
    Mat3, Point2, Point3, WeakPerspectiveCamera,
};
use neural_mia::camera::{
    convert_weak_perspective_to_full_camera, identity_rotations, image_centers,
    perspective_projection,
};

type TestBackend = NdArray;

fn tensor2(values: Vec<f32>, shape: [usize; 2]) -> Tensor<TestBackend, 2> {
    Tensor::from_data(TensorData::new(values, shape), &Default::default())
}

fn tensor3(values: Vec<f32>, shape: [usize; 3]) -> Tensor<TestBackend, 3> {
    Tensor::from_data(TensorData::new(values, shape), &Default::default())
}

fn values<const D: usize>(t: Tensor<TestBackend, D>) -> Vec<f32> {
    t.into_data().to_vec::<f32>().unwrap()
}

fn assert_close(got: &[f32], expected: &[f32], tol: f32) {
    assert_eq!(got.len(), expected.len());
    for (i, (g, e)) in got.iter().zip(expected).enumerate() {
        assert!((g - e).abs() <= tol, "index {}: got {}, expected {}", i, g, e);
    }
}

#[test]
fn test_identity_projection() {
    let device = Default::default();
    let points = tensor3(vec![0.0, 0.0, 5.0, 1.0, -1.0, 5.0], [1, 2, 3]);

    let (p2d, cam) = perspective_projection(
        points,
        identity_rotations(1, &device),
        tensor2(vec![0.0, 0.0, 0.0], [1, 3]),
        Tensor::from_floats([100.0], &device),
        tensor2(vec![50.0, 50.0], [1, 2]),
    );

    assert_eq!(p2d.dims(), [1, 2, 2]);
    assert_close(&values(p2d), &[50.0, 50.0, 70.0, 30.0], 1e-4);
    assert_close(&values(cam), &[0.0, 0.0, 5.0, 1.0, -1.0, 5.0], 1e-6);
}

#[test]
fn test_two_cameras_hand_computed() {
    let device = Default::default();
    // Camera 0: identity, t = (0, 0, 10), f = 1000, c = (0, 0).
    // Camera 1: quarter turn about y, t = (0, 1, 4), f = 500, c = (320, 240).
    let quarter = Mat3::rotation_y(std::f32::consts::FRAC_PI_2).to_flat();
    let mut rotations = Mat3::IDENTITY.to_flat().to_vec();
    rotations.extend_from_slice(&quarter);

    let (p2d, _) = perspective_projection(
        tensor3(vec![1.0, 2.0, 0.0, 0.0, 0.0, 1.0], [2, 1, 3]),
        tensor3(rotations, [2, 3, 3]),
        tensor2(vec![0.0, 0.0, 10.0, 0.0, 1.0, 4.0], [2, 3]),
        Tensor::from_floats([1000.0, 500.0], &device),
        tensor2(vec![0.0, 0.0, 320.0, 240.0], [2, 2]),
    );

    // Camera 0: (1, 2, 10) -> (100, 200).
    // Camera 1: R (0, 0, 1) = (1, 0, 0); + t = (1, 1, 4) -> (445, 365).
    assert_close(&values(p2d), &[100.0, 200.0, 445.0, 365.0], 1e-2);
}

#[test]
fn test_weak_perspective_centered_crop() {
    let image = ImageSize::default();
    let c = image.center();

    let t = convert_weak_perspective_to_full_camera(
        tensor2(vec![1.0, 0.0, 0.0], [1, 3]),
        Tensor::from_floats([224.0], &Default::default()),
        tensor2(vec![c.x, c.y], [1, 2]),
        image,
        5000.0,
        224.0,
    );

    assert_close(&values(t), &[0.0, 0.0, 10000.0 / 224.0], 1e-3);
}

#[test]
fn test_batched_matches_scalar_path() {
    let device = Default::default();
    let image = ImageSize::default();
    let focal = 5000.0;
    let crops = [
        (WeakPerspectiveCamera::new(0.9, 0.05, -0.02), BoundingBox::new(Point2::new(600.0, 1000.0), 400.0)),
        (WeakPerspectiveCamera::new(1.3, -0.1, 0.08), BoundingBox::new(Point2::new(320.0, 1400.0), 260.0)),
    ];
    let joints = [Point3::new(0.1, -0.3, 0.05), Point3::new(-0.2, 0.4, -0.1)];

    let cams: Vec<f32> = crops.iter().flat_map(|(c, _)| c.as_array()).collect();
    let heights: Vec<f32> = crops.iter().map(|(_, b)| b.height).collect();
    let centers: Vec<f32> = crops.iter().flat_map(|(_, b)| b.center.as_array()).collect();
    let translation = convert_weak_perspective_to_full_camera(
        tensor2(cams, [2, 3]),
        Tensor::from_data(TensorData::new(heights, [2]), &device),
        tensor2(centers, [2, 2]),
        image,
        focal,
        224.0,
    );

    let points: Vec<f32> = (0..2).flat_map(|_| joints.iter().flat_map(|p| p.as_array())).collect();
    let (p2d, _) = perspective_projection(
        tensor3(points, [2, 2, 3]),
        identity_rotations(2, &device),
        translation,
        Tensor::full([2], focal, &device),
        image_centers(2, image, &device),
    );

    let k = CameraIntrinsics::for_image(focal, image);
    let mut expected = Vec::new();
    for (cam, bbox) in crops {
        let t = weak_perspective_to_translation(cam, bbox, image, focal, 224.0).unwrap();
        for joint in joints {
            let (px, _) = project_point(joint, &Mat3::IDENTITY, t, &k);
            expected.extend_from_slice(&px.as_array());
        }
    }

    assert_close(&values(p2d), &expected, 0.05);
}
