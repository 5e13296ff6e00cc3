//! Batched camera geometry on burn tensors.
//!
//! Tensor counterparts of [`mia_core::camera`]: weak-perspective to
//! full-image translation and pinhole perspective projection, each operating
//! on a whole flattened `batch * frames` set of cameras at once.

use burn::prelude::*;
use mia_core::ImageSize;

/// Project batches of 3D points through per-sample pinhole cameras.
///
/// - `points`: `[n, k, 3]`
/// - `rotation`: `[n, 3, 3]`
/// - `translation`: `[n, 3]`
/// - `focal_length`: `[n]`
/// - `camera_center`: `[n, 2]`
///
/// Returns `(points_2d [n, k, 2], points_camera [n, k, 3])` where the second
/// tensor holds the rotated and translated points before depth division.
/// Points at or behind the camera plane are not special-cased.
pub fn perspective_projection<B: Backend>(
    points: Tensor<B, 3>,
    rotation: Tensor<B, 3>,
    translation: Tensor<B, 2>,
    focal_length: Tensor<B, 1>,
    camera_center: Tensor<B, 2>,
) -> (Tensor<B, 3>, Tensor<B, 3>) {
    let [n, k, _] = points.dims();
    let intrinsics = intrinsic_matrix(focal_length, camera_center);

    // [n, 3, 3] x [n, 3, k] -> [n, 3, k]
    let rotated = rotation.matmul(points.swap_dims(1, 2)).swap_dims(1, 2);
    let points_camera = rotated + translation.unsqueeze_dim::<3>(1);

    let depth = points_camera.clone().slice([0..n, 0..k, 2..3]);
    let divided = points_camera.clone() / depth;

    let projected = intrinsics.matmul(divided.swap_dims(1, 2)).swap_dims(1, 2);
    let points_2d = projected.slice([0..n, 0..k, 0..2]);

    (points_2d, points_camera)
}

/// Build `[n, 3, 3]` intrinsic matrices from focal lengths and principal points.
pub fn intrinsic_matrix<B: Backend>(
    focal_length: Tensor<B, 1>,
    camera_center: Tensor<B, 2>,
) -> Tensor<B, 3> {
    let [n] = focal_length.dims();
    let device = focal_length.device();

    let f = focal_length.reshape([n, 1]);
    let cx = camera_center.clone().slice([0..n, 0..1]);
    let cy = camera_center.slice([0..n, 1..2]);
    let zeros = Tensor::<B, 2>::zeros([n, 1], &device);
    let ones = Tensor::<B, 2>::ones([n, 1], &device);

    let row0 = Tensor::cat(vec![f.clone(), zeros.clone(), cx], 1);
    let row1 = Tensor::cat(vec![zeros.clone(), f, cy], 1);
    let row2 = Tensor::cat(vec![zeros.clone(), zeros, ones], 1);

    Tensor::stack(vec![row0, row1, row2], 1)
}

/// Convert crop-local weak-perspective cameras into full-image translations.
///
/// - `cam_params`: `[n, 3]` laid out as `(s, tx, ty)`
/// - `bbox_height`: `[n]`
/// - `bbox_center`: `[n, 2]`
///
/// Returns `[n, 3]` translations `(tx + cx, ty + cy, tz)`. Callers guarantee
/// `s > 0`; see [`mia_core::weak_perspective_to_translation`] for the checked
/// scalar form.
pub fn convert_weak_perspective_to_full_camera<B: Backend>(
    cam_params: Tensor<B, 2>,
    bbox_height: Tensor<B, 1>,
    bbox_center: Tensor<B, 2>,
    image: ImageSize,
    focal_length: f32,
    crop_resolution: f32,
) -> Tensor<B, 2> {
    let [n, _] = cam_params.dims();

    let s = cam_params.clone().slice([0..n, 0..1]).reshape([n]);
    let tx = cam_params.clone().slice([0..n, 1..2]).reshape([n]);
    let ty = cam_params.slice([0..n, 2..3]).reshape([n]);
    let bcx = bbox_center.clone().slice([0..n, 0..1]).reshape([n]);
    let bcy = bbox_center.slice([0..n, 1..2]).reshape([n]);

    let r = bbox_height.clone().div_scalar(crop_resolution);
    let tz = (r.mul_scalar(crop_resolution) * s.clone())
        .recip()
        .mul_scalar(2.0 * focal_length);

    let s_h = s * bbox_height;
    let cx = bcx.sub_scalar(image.width / 2.0).mul_scalar(2.0) / s_h.clone();
    let cy = bcy.sub_scalar(image.height / 2.0).mul_scalar(2.0) / s_h;

    Tensor::stack(vec![tx + cx, ty + cy, tz], 1)
}

/// Principal points at the image center, repeated `n` times.
pub fn image_centers<B: Backend>(n: usize, image: ImageSize, device: &B::Device) -> Tensor<B, 2> {
    let c = image.center();
    Tensor::<B, 1>::from_floats([c.x, c.y], device)
        .reshape([1, 2])
        .repeat_dim(0, n)
}

/// `n` identity rotations.
pub fn identity_rotations<B: Backend>(n: usize, device: &B::Device) -> Tensor<B, 3> {
    Tensor::<B, 2>::eye(3, device)
        .reshape([1, 3, 3])
        .repeat_dim(0, n)
}

/// Divide the trailing `(x, y)` axis of pixel keypoints by the image size.
pub fn normalize_keypoints<B: Backend>(keypoints: Tensor<B, 4>, image: ImageSize) -> Tensor<B, 4> {
    let device = keypoints.device();
    let scale = Tensor::<B, 1>::from_floats([image.width, image.height], &device).reshape([1, 1, 1, 2]);
    keypoints / scale
}
