//! Voxdet Data Crate
//!
//! File ingest for the LIDAR voxel detector: calibration records, 3D box
//! labels, raw point clouds and KITTI-style dataset directories. Everything
//! here is plain CPU-side parsing; voxelization and target encoding live in
//! voxdet-train.

pub mod calib;
pub mod cloud;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod labels;
pub mod types;

pub use calib::CalibrationParams;
pub use cloud::{PointCloudFormat, load_point_cloud};
pub use dataset::{FrameFiles, KittiLayout};
pub use error::{DataError, Result};
pub use filter::CameraFovFilter;
pub use labels::{LabelConfig, LabelFilter, LabelFormat, LabelFrame, LabelSet, read_labels};
pub use types::{Box3D, BoxSize, CORNER_COUNT, Corners, Point};
