//! Box corner geometry.
//!
//! Corners are produced in a fixed slot order shared by target encoding and
//! any decoder of predicted corners:
//!
//! | slot | x    | y    | z |
//! |------|------|------|---|
//! | 0    | -l/2 | -w/2 | 0 |
//! | 1    | +l/2 | -w/2 | 0 |
//! | 2    | -l/2 | +w/2 | 0 |
//! | 3    | -l/2 | -w/2 | h |
//! | 4    | -l/2 | +w/2 | h |
//! | 5    | +l/2 | +w/2 | 0 |
//! | 6    | +l/2 | -w/2 | h |
//! | 7    | +l/2 | +w/2 | h |
//!
//! before yaw rotation about +z and translation to the box's bottom center.

use crate::error::{Result, TrainError};
use glam::{Vec2, Vec3};
use voxdet_data::{Box3D, BoxSize, CORNER_COUNT, Corners};

/// Per-slot signs along (length, width) and whether the corner is on the roof.
const CORNER_LAYOUT: [(f32, f32, bool); CORNER_COUNT] = [
    (-1.0, -1.0, false),
    (1.0, -1.0, false),
    (-1.0, 1.0, false),
    (-1.0, -1.0, true),
    (-1.0, 1.0, true),
    (1.0, 1.0, false),
    (1.0, -1.0, true),
    (1.0, 1.0, true),
];

/// Corner offsets of an unrotated box whose bottom center is the origin.
pub fn local_corners(size: &BoxSize) -> [Vec3; CORNER_COUNT] {
    CORNER_LAYOUT.map(|(sx, sy, roof)| {
        Vec3::new(
            sx * size.length * 0.5,
            sy * size.width * 0.5,
            if roof { size.height } else { 0.0 },
        )
    })
}

/// The 8 corners of `b` in the frame its center is expressed in.
pub fn box_corners(b: &Box3D) -> Corners {
    let rot = Vec2::from_angle(b.rotation);
    Corners(local_corners(&b.size).map(|c| {
        let xy = rot.rotate(c.truncate());
        b.center + xy.extend(c.z)
    }))
}

/// Corners for parallel center / rotation / size sequences, in input order.
///
/// `rounding` rounds every coordinate to that many decimals.
pub fn batch_corners(
    centers: &[Vec3],
    rotations: &[f32],
    sizes: &[BoxSize],
    rounding: Option<u32>,
) -> Result<Vec<Corners>> {
    if centers.len() != rotations.len() || centers.len() != sizes.len() {
        return Err(TrainError::Shape(format!(
            "{} centers, {} rotations, {} sizes",
            centers.len(),
            rotations.len(),
            sizes.len()
        )));
    }
    Ok(centers
        .iter()
        .zip(rotations)
        .zip(sizes)
        .map(|((c, r), s)| {
            let corners = box_corners(&Box3D::new(*c, *r, *s));
            match rounding {
                Some(decimals) => round_corners(corners, decimals),
                None => corners,
            }
        })
        .collect())
}

fn round_corners(corners: Corners, decimals: u32) -> Corners {
    let factor = 10f32.powi(decimals as i32);
    Corners(corners.0.map(|c| (c * factor).round() / factor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::FRAC_PI_2;

    fn size(h: f32, w: f32, l: f32) -> BoxSize {
        BoxSize::new(h, w, l).unwrap()
    }

    #[test]
    fn test_zero_yaw_closed_form() {
        let (cx, cy, cz) = (10.0, -2.0, -1.5);
        let (h, w, l) = (1.5, 1.6, 4.0);
        let corners = box_corners(&Box3D::new(Vec3::new(cx, cy, cz), 0.0, size(h, w, l)));
        let expected = [
            Vec3::new(cx - l / 2.0, cy - w / 2.0, cz),
            Vec3::new(cx + l / 2.0, cy - w / 2.0, cz),
            Vec3::new(cx - l / 2.0, cy + w / 2.0, cz),
            Vec3::new(cx - l / 2.0, cy - w / 2.0, cz + h),
            Vec3::new(cx - l / 2.0, cy + w / 2.0, cz + h),
            Vec3::new(cx + l / 2.0, cy + w / 2.0, cz),
            Vec3::new(cx + l / 2.0, cy - w / 2.0, cz + h),
            Vec3::new(cx + l / 2.0, cy + w / 2.0, cz + h),
        ];
        for (got, want) in corners.points().iter().zip(expected) {
            assert_abs_diff_eq!(got.x, want.x, epsilon = 1e-6);
            assert_abs_diff_eq!(got.y, want.y, epsilon = 1e-6);
            assert_abs_diff_eq!(got.z, want.z, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_quarter_turn_swaps_axes() {
        let corners = box_corners(&Box3D::new(Vec3::ZERO, FRAC_PI_2, size(1.0, 2.0, 4.0)));
        // Slot 1 is (+l/2, -w/2) = (2, -1) locally; rotated by 90 degrees -> (1, 2).
        assert_abs_diff_eq!(corners.0[1].x, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(corners.0[1].y, 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(corners.0[1].z, 0.0);
    }

    #[test]
    fn test_rotation_preserves_edge_lengths() {
        let corners = box_corners(&Box3D::new(Vec3::new(3.0, 4.0, 0.0), 0.7, size(1.5, 1.6, 4.2)));
        let c = corners.points();
        assert_abs_diff_eq!(c[0].distance(c[1]), 4.2, epsilon = 1e-5);
        assert_abs_diff_eq!(c[0].distance(c[2]), 1.6, epsilon = 1e-5);
        assert_abs_diff_eq!(c[0].distance(c[3]), 1.5, epsilon = 1e-5);
    }

    #[test]
    fn test_batch_preserves_order_and_rounds() {
        let centers = [Vec3::ZERO, Vec3::new(5.0, 5.0, 0.0)];
        let rotations = [0.3, 0.0];
        let sizes = [size(1.0, 1.0, 1.0), size(2.0, 2.0, 2.0)];
        let corners = batch_corners(&centers, &rotations, &sizes, Some(2)).unwrap();
        assert_eq!(corners.len(), 2);
        assert_eq!(corners[1].0[0], Vec3::new(4.0, 4.0, 0.0));
        let x = corners[0].0[0].x;
        assert_abs_diff_eq!(x, (x * 100.0).round() / 100.0, epsilon = 1e-6);
    }

    #[test]
    fn test_batch_length_mismatch() {
        let err = batch_corners(&[Vec3::ZERO], &[], &[size(1.0, 1.0, 1.0)], None).unwrap_err();
        assert!(matches!(err, TrainError::Shape(_)));
    }
}
