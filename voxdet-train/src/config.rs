//! Pipeline configuration.
//!
//! All lengths are metres in the sensor frame (x forward, y left, z up).

use crate::error::{Result, TrainError};
use crate::voxel::CellIndex;
use glam::{UVec3, Vec3};
use serde::{Deserialize, Serialize};
use std::path::Path;
use voxdet_data::{CameraFovFilter, LabelConfig};

/// Largest grid accepted by [`GridBounds::shape`], in cells.
pub const MAX_GRID_CELLS: u64 = 1 << 30;

/// Largest neighbourhood radius, in map cells, for [`SphereSearch::DensestNeighbor`].
pub const MAX_SEARCH_RADIUS: u32 = 64;

/// Axis-aligned region covered by a grid, `[min, max)` per axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl GridBounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Cubic region `[-half, half)` on every axis.
    pub fn symmetric(half: f32) -> Self {
        Self::new(Vec3::splat(-half), Vec3::splat(half))
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Number of cells per axis, `ceil(extent / resolution)`. Fails when the
    /// total exceeds [`MAX_GRID_CELLS`].
    pub fn shape(&self, resolution: f32) -> Result<UVec3> {
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(TrainError::config(format!(
                "resolution must be positive, got {resolution}"
            )));
        }
        let extent = self.extent();
        let mut dims = [0u32; 3];
        for (axis, dim) in dims.iter_mut().enumerate() {
            let cells = cell_count(extent[axis] as f64, resolution as f64);
            if !(cells >= 1.0 && cells <= u32::MAX as f64) {
                return Err(TrainError::config(format!(
                    "axis {axis}: bounds [{}, {}) at resolution {resolution} give {cells} cells",
                    self.min[axis], self.max[axis]
                )));
            }
            *dim = cells as u32;
        }
        let total = dims
            .iter()
            .try_fold(1u64, |acc, d| acc.checked_mul(*d as u64));
        if !total.is_some_and(|total| total <= MAX_GRID_CELLS) {
            return Err(TrainError::config(format!(
                "resolution {resolution} gives a {}x{}x{} grid, above the {MAX_GRID_CELLS} cell limit",
                dims[0], dims[1], dims[2]
            )));
        }
        Ok(UVec3::from_array(dims))
    }

    /// Cell holding `p`, `floor((p - min) / resolution)`, if inside `shape`.
    pub fn cell_of(&self, p: Vec3, resolution: f32, shape: UVec3) -> Option<CellIndex> {
        let rel = (p - self.min) / resolution;
        let idx = rel.floor();
        if !idx.is_finite() || idx.cmplt(Vec3::ZERO).any() {
            return None;
        }
        let cell = idx.as_uvec3();
        cell.cmplt(shape).all().then_some(cell)
    }

    /// World position of a cell's minimum corner, `cell * resolution + min`.
    pub fn anchor_of(&self, cell: CellIndex, resolution: f32) -> Vec3 {
        cell.as_vec3() * resolution + self.min
    }
}

impl Default for GridBounds {
    /// Forward 90 m, lateral +-50 m, vertical -4.5..5.5 m.
    fn default() -> Self {
        Self::new(Vec3::new(0.0, -50.0, -4.5), Vec3::new(90.0, 50.0, 5.5))
    }
}

// Quotients within float noise of an integer are not rounded up.
fn cell_count(extent: f64, resolution: f64) -> f64 {
    let q = extent / resolution;
    let r = q.round();
    if (q - r).abs() <= 1e-6 * r.abs().max(1.0) {
        r
    } else {
        q.ceil()
    }
}

/// Voxel grid resolution and coverage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoxelConfig {
    /// Cell edge length.
    pub resolution: f32,
    pub bounds: GridBounds,
}

impl VoxelConfig {
    pub fn with_resolution(resolution: f32) -> Self {
        Self {
            resolution,
            ..Self::default()
        }
    }
}

impl Default for VoxelConfig {
    fn default() -> Self {
        Self {
            resolution: 0.2,
            bounds: GridBounds::default(),
        }
    }
}

/// Which point of a box is mapped to its objectness cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorPoint {
    /// The labelled (bottom-face) center.
    BoxBase,
    /// Bottom center lifted by half the box height.
    #[default]
    MidHeight,
}

/// Cell selection after the direct floor mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SphereSearch {
    /// Use the cell the anchor falls in.
    #[default]
    Direct,
    /// Move to the cell within `radius` cells holding the most occupied
    /// voxels. Ties keep the direct cell, then the first cell in x, y, z order.
    DensestNeighbor { radius: u32 },
}

/// Objectness map and corner target settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Map cell edge = voxel resolution * scale.
    pub scale: u32,
    pub anchor: AnchorPoint,
    pub search: SphereSearch,
}

impl TargetConfig {
    pub fn validate(&self) -> Result<()> {
        if self.scale == 0 {
            return Err(TrainError::config("target scale must be at least 1"));
        }
        match self.search {
            SphereSearch::DensestNeighbor { radius } if radius > MAX_SEARCH_RADIUS => Err(
                TrainError::config(format!("search radius {radius} exceeds {MAX_SEARCH_RADIUS}")),
            ),
            _ => Ok(()),
        }
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            scale: 4,
            anchor: AnchorPoint::default(),
            search: SphereSearch::default(),
        }
    }
}

/// Everything a frame needs besides its files.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub voxel: VoxelConfig,
    pub targets: TargetConfig,
    pub labels: LabelConfig,
    pub camera_filter: CameraFovFilter,
    /// Round box corners to this many decimals.
    pub corner_rounding: Option<u32>,
}

impl PipelineConfig {
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Check resolution, bounds and scale before any frame is processed.
    pub fn validate(&self) -> Result<()> {
        self.voxel.bounds.shape(self.voxel.resolution)?;
        self.targets.validate()?;
        self.voxel.bounds.shape(self.map_resolution())?;
        Ok(())
    }

    pub fn map_resolution(&self) -> f32 {
        self.voxel.resolution * self.targets.scale as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_shape() {
        let shape = GridBounds::default().shape(0.2).unwrap();
        assert_eq!(shape, UVec3::new(450, 500, 50));
        let map = GridBounds::default().shape(0.8).unwrap();
        assert_eq!(map, UVec3::new(113, 125, 13));
    }

    #[test]
    fn test_shape_rounds_up() {
        let bounds = GridBounds::new(Vec3::ZERO, Vec3::new(1.0, 2.5, 0.3));
        assert_eq!(bounds.shape(1.0).unwrap(), UVec3::new(1, 3, 1));
    }

    #[test]
    fn test_shape_ignores_float_noise() {
        let bounds = GridBounds::new(Vec3::ZERO, Vec3::splat(7.0));
        assert_eq!(bounds.shape(0.7).unwrap(), UVec3::splat(10));
    }

    #[test]
    fn test_invalid_resolution() {
        let bounds = GridBounds::default();
        assert!(matches!(bounds.shape(0.0), Err(TrainError::Config(_))));
        assert!(matches!(bounds.shape(-1.0), Err(TrainError::Config(_))));
        assert!(matches!(bounds.shape(f32::NAN), Err(TrainError::Config(_))));
    }

    #[test]
    fn test_tiny_resolution_exceeds_cell_limit() {
        let err = GridBounds::default().shape(1e-5).unwrap_err();
        assert!(matches!(err, TrainError::Config(ref m) if m.contains("cell limit")));
        // 1800 x 2000 x 200 = 720M cells, still accepted.
        assert!(GridBounds::default().shape(0.05).is_ok());
    }

    #[test]
    fn test_inverted_bounds() {
        let bounds = GridBounds::new(Vec3::ONE, Vec3::ZERO);
        assert!(matches!(bounds.shape(0.5), Err(TrainError::Config(_))));
    }

    #[test]
    fn test_cell_of_and_anchor() {
        let bounds = GridBounds::symmetric(2.0);
        let shape = bounds.shape(1.0).unwrap();
        assert_eq!(
            bounds.cell_of(Vec3::new(-1.0, -1.0, 0.0), 1.0, shape),
            Some(UVec3::new(1, 1, 2))
        );
        assert_eq!(bounds.cell_of(Vec3::new(2.0, 0.0, 0.0), 1.0, shape), None);
        assert_eq!(bounds.cell_of(Vec3::new(-2.5, 0.0, 0.0), 1.0, shape), None);
        assert_eq!(bounds.anchor_of(UVec3::new(1, 1, 2), 1.0), Vec3::new(-1.0, -1.0, 0.0));
    }

    #[test]
    fn test_config_json_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "voxel": { "resolution": 0.25 } }"#).unwrap();
        assert_eq!(config.voxel.resolution, 0.25);
        assert_eq!(config.voxel.bounds, GridBounds::default());
        assert_eq!(config.targets.scale, 4);
        assert_eq!(config.labels.filter.classes, vec!["Car".to_string()]);
        assert_eq!(config.map_resolution(), 1.0);
    }

    #[test]
    fn test_search_json() {
        let config: TargetConfig =
            serde_json::from_str(r#"{ "search": { "kind": "densest_neighbor", "radius": 1 } }"#)
                .unwrap();
        assert_eq!(config.search, SphereSearch::DensestNeighbor { radius: 1 });
    }

    #[test]
    fn test_validate_rejects_zero_scale() {
        let mut config = PipelineConfig::default();
        config.targets.scale = 0;
        assert!(config.validate().is_err());
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_caps_search_radius() {
        let mut config = PipelineConfig::default();
        config.targets.search = SphereSearch::DensestNeighbor { radius: MAX_SEARCH_RADIUS };
        assert!(config.validate().is_ok());
        config.targets.search = SphereSearch::DensestNeighbor { radius: u32::MAX };
        assert!(matches!(config.validate(), Err(TrainError::Config(_))));
    }
}
