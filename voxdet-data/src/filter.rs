//! Field-of-view filtering of LIDAR points.

use crate::types::Point;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Keeps points inside the camera's forward cone, `x - margin >= |y|`.
///
/// With a zero margin this is the 90 degree wedge in front of the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraFovFilter {
    /// Backward shift of the cone apex along sensor x, metres.
    pub margin: f32,
}

impl CameraFovFilter {
    pub fn new(margin: f32) -> Self {
        Self { margin }
    }

    pub fn contains(&self, point: &Point) -> bool {
        let p = point.position;
        p.x - self.margin >= p.y.abs()
    }

    /// Points inside the cone, in input order.
    pub fn apply(&self, points: &[Point]) -> Vec<Point> {
        let kept: Vec<Point> = points.iter().filter(|p| self.contains(p)).copied().collect();
        debug!("Camera-angle filter kept {}/{} points", kept.len(), points.len());
        kept
    }
}
