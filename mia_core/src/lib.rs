//! # mia_core
//!
//! Pure camera geometry for training pose-to-EMG regressors.
//!
//! Pose estimators run on a square crop around the subject and report a
//! weak-perspective camera `(s, tx, ty)` in crop coordinates. To reproject the
//! estimated 3D joints onto the full video frame, that camera has to be turned
//! into a full-image translation and pushed through a pinhole projection. This
//! crate holds the scalar reference math for both steps; `neural_mia` runs the
//! same operations batched on tensors.
//!
//! ## Features
//!
//! - **no_std compatible**: Works in embedded environments with the `alloc` feature
//! - **Pure algorithms**: No tensors, no I/O
//! - **Checked variants**: Degenerate depth/scale reported as [`MiaCoreError`]
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables standard library support
//! - `alloc`: Enables heap allocation (Vec, etc.) without full std
//!
//! ## Usage
//!
//! ```
//! use mia_core::prelude::*;
//!
//! let image = ImageSize::default();
//! let bbox = BoundingBox::new(Point2::new(600.0, 900.0), 350.0);
//! let cam = WeakPerspectiveCamera::new(0.95, 0.02, -0.01);
//!
//! let t = weak_perspective_to_translation(
//!     cam, bbox, image, DEFAULT_FOCAL_LENGTH, DEFAULT_CROP_RESOLUTION,
//! ).unwrap();
//!
//! let k = CameraIntrinsics::for_image(DEFAULT_FOCAL_LENGTH, image);
//! let (pixel, _) = project_point(Point3::new(0.0, 0.1, 0.0), &Mat3::IDENTITY, t, &k);
//! assert!(pixel.x.is_finite() && pixel.y.is_finite());
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]

// Conditional std/alloc support
#[cfg(feature = "std")]
extern crate std;

#[cfg(all(feature = "alloc", not(feature = "std")))]
extern crate alloc;

// Internal alloc prelude for conditional compilation
#[cfg(feature = "std")]
mod alloc_prelude {
    pub use std::vec::Vec;
}

#[cfg(all(feature = "alloc", not(feature = "std")))]
mod alloc_prelude {
    pub use alloc::vec::Vec;
}

pub mod camera;
pub mod error;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::camera::{
        normalize_to_image, project_point, translation_to_weak_perspective, try_project_point,
        weak_perspective_to_translation, CameraIntrinsics,
    };
    pub use crate::error::MiaCoreError;
    pub use crate::types::{
        BoundingBox, ImageSize, Mat3, Point2, Point3, WeakPerspectiveCamera,
        DEFAULT_CROP_RESOLUTION, DEFAULT_FOCAL_LENGTH,
    };

    #[cfg(any(feature = "std", feature = "alloc"))]
    pub use crate::camera::project_points;
}

// Re-export everything at crate root for convenience
pub use camera::{
    normalize_to_image, project_point, translation_to_weak_perspective, try_project_point,
    weak_perspective_to_translation, CameraIntrinsics,
};
#[cfg(any(feature = "std", feature = "alloc"))]
pub use camera::project_points;
pub use error::MiaCoreError;
pub use types::{
    BoundingBox, ImageSize, Mat3, Point2, Point3, WeakPerspectiveCamera, DEFAULT_CROP_RESOLUTION,
    DEFAULT_FOCAL_LENGTH,
};
