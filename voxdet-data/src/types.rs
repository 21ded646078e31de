//! Core data types for LIDAR points and labelled boxes.
//!
//! These are CPU-side representations shared by the ingest code in this crate
//! and the voxelization / target encoding in voxdet-train.

use crate::error::{DataError, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A single LIDAR return.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Position in the sensor frame (x forward, y left, z up), metres.
    pub position: Vec3,
    /// Return strength, when the source format carries one.
    pub reflectance: Option<f32>,
}

impl Point {
    /// Create a point without reflectance.
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            reflectance: None,
        }
    }

    /// Create a point with a reflectance value.
    pub fn with_reflectance(position: Vec3, reflectance: f32) -> Self {
        Self {
            position,
            reflectance: Some(reflectance),
        }
    }
}

impl From<Vec3> for Point {
    fn from(position: Vec3) -> Self {
        Self::new(position)
    }
}

/// Box extent, metres. All components are strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxSize {
    pub height: f32,
    pub width: f32,
    pub length: f32,
}

impl BoxSize {
    /// Create a size, rejecting non-positive or non-finite components.
    pub fn new(height: f32, width: f32, length: f32) -> Result<Self> {
        for (name, v) in [("height", height), ("width", width), ("length", length)] {
            if !(v.is_finite() && v > 0.0) {
                return Err(DataError::InvalidBox(format!(
                    "{name} must be positive, got {v}"
                )));
            }
        }
        Ok(Self {
            height,
            width,
            length,
        })
    }
}

/// An oriented 3D box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Box3D {
    /// Center of the bottom face.
    pub center: Vec3,
    /// Yaw about +z, radians.
    pub rotation: f32,
    pub size: BoxSize,
}

impl Box3D {
    pub fn new(center: Vec3, rotation: f32, size: BoxSize) -> Self {
        Self {
            center,
            rotation,
            size,
        }
    }

    /// Geometric center (bottom-face center lifted by half the height).
    pub fn mid_center(&self) -> Vec3 {
        self.center + Vec3::Z * (self.size.height * 0.5)
    }
}

/// Number of corners per box.
pub const CORNER_COUNT: usize = 8;

/// The 8 corners of a [`Box3D`].
///
/// Slot order is fixed (see `voxdet_train::geometry`): slots 0, 1, 2, 5 lie on
/// the floor and 3, 4, 6, 7 on the roof.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corners(pub [Vec3; CORNER_COUNT]);

impl Corners {
    pub fn points(&self) -> &[Vec3; CORNER_COUNT] {
        &self.0
    }

    /// Flatten to 24 values, corner-major.
    pub fn to_flat(&self) -> [f32; CORNER_COUNT * 3] {
        let mut out = [0.0; CORNER_COUNT * 3];
        for (i, c) in self.0.iter().enumerate() {
            out[i * 3..i * 3 + 3].copy_from_slice(&c.to_array());
        }
        out
    }

    /// True when every corner satisfies `pred`.
    pub fn all(&self, pred: impl Fn(Vec3) -> bool) -> bool {
        self.0.iter().all(|c| pred(*c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_creation() {
        let p = Point::with_reflectance(Vec3::new(1.0, 2.0, 3.0), 0.5);
        assert_eq!(p.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(p.reflectance, Some(0.5));
        assert_eq!(Point::from(Vec3::ONE).reflectance, None);
    }

    #[test]
    fn test_box_size_rejects_non_positive() {
        assert!(BoxSize::new(1.5, 1.6, 3.9).is_ok());
        assert!(BoxSize::new(0.0, 1.6, 3.9).is_err());
        assert!(BoxSize::new(1.5, -1.0, 3.9).is_err());
        assert!(BoxSize::new(1.5, 1.6, f32::NAN).is_err());
    }

    #[test]
    fn test_mid_center() {
        let b = Box3D::new(Vec3::new(1.0, 2.0, -1.0), 0.0, BoxSize::new(2.0, 1.0, 4.0).unwrap());
        assert_eq!(b.mid_center(), Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_corners_flatten() {
        let mut pts = [Vec3::ZERO; CORNER_COUNT];
        pts[1] = Vec3::new(1.0, 2.0, 3.0);
        let flat = Corners(pts).to_flat();
        assert_eq!(&flat[3..6], &[1.0, 2.0, 3.0]);
        assert!(flat[..3].iter().all(|v| *v == 0.0));
    }
}
