//! Core types for camera geometry.
//!
//! Provides point and matrix types plus the crop/camera descriptors produced
//! by a pose estimator for each video frame.

use core::ops::{Add, Div, Mul, Sub};

/// Side length (pixels) of the square crop a pose estimator runs on.
pub const DEFAULT_CROP_RESOLUTION: f32 = 224.0;

/// Focal length (pixels) assumed for full-frame reprojection.
pub const DEFAULT_FOCAL_LENGTH: f32 = 5000.0;

/// A 2D point in pixel or normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2 {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Point2 {
    /// Create a new Point2.
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Convert to an array.
    #[inline]
    pub const fn as_array(&self) -> [f32; 2] {
        [self.x, self.y]
    }
}

impl From<[f32; 2]> for Point2 {
    #[inline]
    fn from(arr: [f32; 2]) -> Self {
        Self {
            x: arr[0],
            y: arr[1],
        }
    }
}

impl Add for Point2 {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl Sub for Point2 {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl Mul<f32> for Point2 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

/// A 3D point with named fields for clarity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3 {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
    /// Z coordinate (depth in camera space).
    pub z: f32,
}

impl Point3 {
    /// Create a new Point3.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Create a Point3 with all components set to the same value.
    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self { x: v, y: v, z: v }
    }

    /// Convert to an array.
    #[inline]
    pub const fn as_array(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f32; 3]> for Point3 {
    #[inline]
    fn from(arr: [f32; 3]) -> Self {
        Self {
            x: arr[0],
            y: arr[1],
            z: arr[2],
        }
    }
}

impl From<Point3> for [f32; 3] {
    #[inline]
    fn from(p: Point3) -> Self {
        p.as_array()
    }
}

impl Add for Point3 {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Point3 {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Mul<f32> for Point3 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
            z: self.z * scalar,
        }
    }
}

impl Div<f32> for Point3 {
    type Output = Self;

    #[inline]
    fn div(self, scalar: f32) -> Self {
        Self {
            x: self.x / scalar,
            y: self.y / scalar,
            z: self.z / scalar,
        }
    }
}

/// Row-major 3x3 matrix, used for rotations and camera intrinsics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3 {
    /// Matrix rows.
    pub rows: [[f32; 3]; 3],
}

impl Mat3 {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    /// Create a matrix from rows.
    #[inline]
    pub const fn from_rows(rows: [[f32; 3]; 3]) -> Self {
        Self { rows }
    }

    /// Rotation of `angle` radians about the camera Y (vertical) axis.
    pub fn rotation_y(angle: f32) -> Self {
        let (s, c) = (libm::sinf(angle), libm::cosf(angle));
        Self::from_rows([[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]])
    }

    /// Matrix-vector product.
    #[inline]
    pub fn mul_point(&self, p: Point3) -> Point3 {
        let r = &self.rows;
        Point3::new(
            r[0][0] * p.x + r[0][1] * p.y + r[0][2] * p.z,
            r[1][0] * p.x + r[1][1] * p.y + r[1][2] * p.z,
            r[2][0] * p.x + r[2][1] * p.y + r[2][2] * p.z,
        )
    }

    /// Flatten in row-major order.
    #[inline]
    pub fn to_flat(&self) -> [f32; 9] {
        let r = &self.rows;
        [
            r[0][0], r[0][1], r[0][2], r[1][0], r[1][1], r[1][2], r[2][0], r[2][1], r[2][2],
        ]
    }
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Full image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageSize {
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl ImageSize {
    /// Create a new image size.
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Principal point at the image center.
    #[inline]
    pub fn center(&self) -> Point2 {
        Point2::new(self.width / 2.0, self.height / 2.0)
    }
}

impl Default for ImageSize {
    /// Portrait 1080x1920 video frames.
    fn default() -> Self {
        Self::new(1080.0, 1920.0)
    }
}

/// Square crop placed around a detected subject in the full image.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    /// Crop center in full-image pixels.
    pub center: Point2,
    /// Crop side length in full-image pixels.
    pub height: f32,
}

impl BoundingBox {
    /// Create a new bounding box.
    #[inline]
    pub const fn new(center: Point2, height: f32) -> Self {
        Self { center, height }
    }

    /// Packed `(center_x, center_y, height)` layout used by batch records.
    #[inline]
    pub const fn as_array(&self) -> [f32; 3] {
        [self.center.x, self.center.y, self.height]
    }
}

/// Weak-perspective camera `(s, tx, ty)` estimated in crop coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeakPerspectiveCamera {
    /// Scale.
    pub scale: f32,
    /// X offset in normalized crop units.
    pub tx: f32,
    /// Y offset in normalized crop units.
    pub ty: f32,
}

impl WeakPerspectiveCamera {
    /// Create a new weak-perspective camera.
    #[inline]
    pub const fn new(scale: f32, tx: f32, ty: f32) -> Self {
        Self { scale, tx, ty }
    }

    /// Packed `(s, tx, ty)` layout used by batch records.
    #[inline]
    pub const fn as_array(&self) -> [f32; 3] {
        [self.scale, self.tx, self.ty]
    }
}

impl Default for WeakPerspectiveCamera {
    fn default() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }
}
