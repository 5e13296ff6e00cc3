//! Scalar camera geometry.
//!
//! Reference implementations of the two operations the training pipeline runs
//! in batched tensor form:
//!
//! - recovering a full-image camera translation from a weak-perspective camera
//!   estimated inside a subject crop
//! - pinhole perspective projection with intrinsics `K`
//!
//! ```text
//!     | f  0  cx |
//! K = | 0  f  cy |        p_img = K * (R p + t) / (R p + t).z
//!     | 0  0  1  |
//! ```

use crate::error::MiaCoreError;
use crate::types::{BoundingBox, ImageSize, Mat3, Point2, Point3, WeakPerspectiveCamera};

#[cfg(any(feature = "std", feature = "alloc"))]
use crate::alloc_prelude::Vec;

/// Pinhole intrinsics with square pixels and no skew.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraIntrinsics {
    /// Focal length in pixels.
    pub focal_length: f32,
    /// Principal point in pixels.
    pub center: Point2,
}

impl CameraIntrinsics {
    /// Create intrinsics from a focal length and principal point.
    #[inline]
    pub const fn new(focal_length: f32, center: Point2) -> Self {
        Self {
            focal_length,
            center,
        }
    }

    /// Intrinsics with the principal point at the image center.
    #[inline]
    pub fn for_image(focal_length: f32, image: ImageSize) -> Self {
        Self::new(focal_length, image.center())
    }

    /// The 3x3 intrinsic matrix.
    pub fn matrix(&self) -> Mat3 {
        let f = self.focal_length;
        Mat3::from_rows([
            [f, 0.0, self.center.x],
            [0.0, f, self.center.y],
            [0.0, 0.0, 1.0],
        ])
    }
}

/// Project a single point.
///
/// Returns `(pixel, camera_space_point)`. No depth check is made: a point at or
/// behind the camera plane produces non-finite or mirrored pixels. Use
/// [`try_project_point`] when that must be detected.
#[inline]
pub fn project_point(
    point: Point3,
    rotation: &Mat3,
    translation: Point3,
    intrinsics: &CameraIntrinsics,
) -> (Point2, Point3) {
    let cam = rotation.mul_point(point) + translation;
    let divided = cam / cam.z;
    let img = intrinsics.matrix().mul_point(divided);
    (Point2::new(img.x, img.y), cam)
}

/// Project a single point, rejecting points that are not in front of the camera.
pub fn try_project_point(
    point: Point3,
    rotation: &Mat3,
    translation: Point3,
    intrinsics: &CameraIntrinsics,
) -> Result<(Point2, Point3), MiaCoreError> {
    let depth = rotation.mul_point(point).z + translation.z;
    if !(depth > 0.0) {
        return Err(MiaCoreError::NonPositiveDepth { depth });
    }
    Ok(project_point(point, rotation, translation, intrinsics))
}

/// Project a set of points sharing one camera.
#[cfg(any(feature = "std", feature = "alloc"))]
pub fn project_points(
    points: &[Point3],
    rotation: &Mat3,
    translation: Point3,
    intrinsics: &CameraIntrinsics,
) -> Vec<Point2> {
    points
        .iter()
        .map(|&p| project_point(p, rotation, translation, intrinsics).0)
        .collect()
}

/// Convert a crop-local weak-perspective camera into a full-image translation.
///
/// With `r = h / crop_resolution`:
///
/// ```text
/// tz = 2 f / (r * crop_resolution * s)
/// cx = 2 (bbox_cx - W / 2) / (s h)
/// cy = 2 (bbox_cy - H / 2) / (s h)
/// t  = (tx + cx, ty + cy, tz)
/// ```
pub fn weak_perspective_to_translation(
    camera: WeakPerspectiveCamera,
    bbox: BoundingBox,
    image: ImageSize,
    focal_length: f32,
    crop_resolution: f32,
) -> Result<Point3, MiaCoreError> {
    let s = camera.scale;
    if !(s > 0.0) {
        return Err(MiaCoreError::NonPositiveScale { scale: s });
    }
    if !(bbox.height > 0.0) {
        return Err(MiaCoreError::DegenerateBoundingBox {
            height: bbox.height,
        });
    }

    let r = bbox.height / crop_resolution;
    let tz = 2.0 * focal_length / (r * crop_resolution * s);
    let cx = 2.0 * (bbox.center.x - image.width / 2.0) / (s * bbox.height);
    let cy = 2.0 * (bbox.center.y - image.height / 2.0) / (s * bbox.height);

    Ok(Point3::new(camera.tx + cx, camera.ty + cy, tz))
}

/// Inverse of [`weak_perspective_to_translation`] for a known crop.
///
/// Useful for synthesizing consistent estimator outputs from a ground-truth
/// translation.
pub fn translation_to_weak_perspective(
    translation: Point3,
    bbox: BoundingBox,
    image: ImageSize,
    focal_length: f32,
) -> Result<WeakPerspectiveCamera, MiaCoreError> {
    if !(translation.z > 0.0) {
        return Err(MiaCoreError::NonPositiveDepth {
            depth: translation.z,
        });
    }
    if !(bbox.height > 0.0) {
        return Err(MiaCoreError::DegenerateBoundingBox {
            height: bbox.height,
        });
    }

    let s = 2.0 * focal_length / (bbox.height * translation.z);
    let cx = 2.0 * (bbox.center.x - image.width / 2.0) / (s * bbox.height);
    let cy = 2.0 * (bbox.center.y - image.height / 2.0) / (s * bbox.height);

    Ok(WeakPerspectiveCamera::new(
        s,
        translation.x - cx,
        translation.y - cy,
    ))
}

/// Scale a pixel coordinate into `[0, 1]` image units.
#[inline]
pub fn normalize_to_image(pixel: Point2, image: ImageSize) -> Point2 {
    Point2::new(pixel.x / image.width, pixel.y / image.height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DEFAULT_CROP_RESOLUTION, DEFAULT_FOCAL_LENGTH};

    #[test]
    fn test_intrinsic_matrix_layout() {
        let k = CameraIntrinsics::new(500.0, Point2::new(320.0, 240.0)).matrix();
        assert_eq!(k.rows[0], [500.0, 0.0, 320.0]);
        assert_eq!(k.rows[1], [0.0, 500.0, 240.0]);
        assert_eq!(k.rows[2], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_identity_projection() {
        let k = CameraIntrinsics::new(1000.0, Point2::new(50.0, 60.0));
        let (px, cam) = project_point(
            Point3::new(0.2, -0.4, 2.0),
            &Mat3::IDENTITY,
            Point3::splat(0.0),
            &k,
        );

        assert!((px.x - (1000.0 * 0.1 + 50.0)).abs() < 1e-3);
        assert!((px.y - (1000.0 * -0.2 + 60.0)).abs() < 1e-3);
        assert_eq!(cam, Point3::new(0.2, -0.4, 2.0));
    }

    #[test]
    fn test_try_project_rejects_behind_camera() {
        let k = CameraIntrinsics::new(1000.0, Point2::new(0.0, 0.0));
        let err = try_project_point(
            Point3::new(0.0, 0.0, 1.0),
            &Mat3::IDENTITY,
            Point3::new(0.0, 0.0, -3.0),
            &k,
        )
        .unwrap_err();

        assert_eq!(err, MiaCoreError::NonPositiveDepth { depth: -2.0 });
    }

    #[test]
    fn test_centered_crop_has_no_offset() {
        let image = ImageSize::default();
        let bbox = BoundingBox::new(image.center(), DEFAULT_CROP_RESOLUTION);
        let t = weak_perspective_to_translation(
            WeakPerspectiveCamera::default(),
            bbox,
            image,
            DEFAULT_FOCAL_LENGTH,
            DEFAULT_CROP_RESOLUTION,
        )
        .unwrap();

        assert_eq!(t.x, 0.0);
        assert_eq!(t.y, 0.0);
        assert!((t.z - 2.0 * DEFAULT_FOCAL_LENGTH / 224.0).abs() < 1e-3);
    }

    #[test]
    fn test_zero_scale_rejected() {
        let err = weak_perspective_to_translation(
            WeakPerspectiveCamera::new(0.0, 0.0, 0.0),
            BoundingBox::new(Point2::new(0.0, 0.0), 100.0),
            ImageSize::default(),
            DEFAULT_FOCAL_LENGTH,
            DEFAULT_CROP_RESOLUTION,
        )
        .unwrap_err();

        assert_eq!(err, MiaCoreError::NonPositiveScale { scale: 0.0 });
    }

    #[test]
    fn test_weak_perspective_inverse() {
        let image = ImageSize::default();
        let bbox = BoundingBox::new(Point2::new(600.0, 1000.0), 400.0);
        let cam = WeakPerspectiveCamera::new(0.9, 0.05, -0.02);

        let t = weak_perspective_to_translation(
            cam,
            bbox,
            image,
            DEFAULT_FOCAL_LENGTH,
            DEFAULT_CROP_RESOLUTION,
        )
        .unwrap();
        let back = translation_to_weak_perspective(t, bbox, image, DEFAULT_FOCAL_LENGTH).unwrap();

        assert!((back.scale - cam.scale).abs() < 1e-4);
        assert!((back.tx - cam.tx).abs() < 1e-4);
        assert!((back.ty - cam.ty).abs() < 1e-4);
    }

    #[test]
    fn test_normalize_to_image() {
        let p = normalize_to_image(Point2::new(540.0, 480.0), ImageSize::default());
        assert_eq!(p, Point2::new(0.5, 0.25));
    }
}
