//! Raw point cloud loading.

mod bin;
mod pcd;
mod ply;

use crate::error::{DataError, Result, read_bytes};
use crate::types::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Point cloud payload encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointCloudFormat {
    /// KITTI velodyne binary (`x y z reflectance` as `f32`).
    Bin,
    /// Point Cloud Library PCD, ascii or binary.
    Pcd,
    /// PLY vertex list.
    Ply,
}

impl PointCloudFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        ext.parse().ok()
    }
}

impl FromStr for PointCloudFormat {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bin" => Ok(PointCloudFormat::Bin),
            "pcd" => Ok(PointCloudFormat::Pcd),
            "ply" => Ok(PointCloudFormat::Ply),
            other => Err(DataError::UnsupportedFormat(format!(
                "point cloud format '{other}'"
            ))),
        }
    }
}

impl fmt::Display for PointCloudFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            PointCloudFormat::Bin => "bin",
            PointCloudFormat::Pcd => "pcd",
            PointCloudFormat::Ply => "ply",
        };
        f.write_str(tag)
    }
}

/// Load every point of a cloud file.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display(), format = %format))]
pub fn load_point_cloud(path: impl AsRef<Path>, format: PointCloudFormat) -> Result<Vec<Point>> {
    let path = path.as_ref();
    let points = match format {
        PointCloudFormat::Bin => bin::decode(&read_bytes(path)?)?,
        PointCloudFormat::Pcd => pcd::read(path)?,
        PointCloudFormat::Ply => ply::read(read_bytes(path)?.as_slice())?,
    };
    debug!("Loaded {} points", points.len());
    Ok(points)
}

/// Decode an in-memory KITTI velodyne payload.
pub fn decode_velodyne(bytes: &[u8]) -> Result<Vec<Point>> {
    bin::decode(bytes)
}

/// Size in bytes of one KITTI velodyne record.
pub const VELODYNE_RECORD_SIZE: usize = bin::RECORD_SIZE;
