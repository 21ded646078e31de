//! Camera/LIDAR calibration records.
//!
//! A record is a list of `key: v0 v1 ...` lines, each a row-major matrix. Only
//! the rectification (`R0_rect`) and the LIDAR-to-camera transform
//! (`Tr_velo_to_cam`) are required; every other numeric key is kept as-is.

use crate::error::{DataError, Result, read_to_string};
use glam::{Affine3A, Mat3, Vec3};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

pub const RECTIFICATION_KEY: &str = "R0_rect";
pub const VELO_TO_CAM_KEY: &str = "Tr_velo_to_cam";

/// Parsed calibration with its derived frame transforms.
#[derive(Debug, Clone)]
pub struct CalibrationParams {
    matrices: BTreeMap<String, Vec<f32>>,
    sensor_to_camera: Affine3A,
    camera_to_sensor: Mat3,
}

impl CalibrationParams {
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        read_to_string(path.as_ref())?.parse()
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        text.parse()
    }

    /// Build from already-split matrices. Derives the frame transforms.
    pub fn from_matrices(matrices: BTreeMap<String, Vec<f32>>) -> Result<Self> {
        let rect = mat3_from_row_major(required(&matrices, RECTIFICATION_KEY, 9)?);
        let velo = required(&matrices, VELO_TO_CAM_KEY, 12)?;
        let (rotation, translation) = split_3x4(velo);

        if rect.determinant().abs() <= f32::EPSILON {
            return Err(DataError::calibration(RECTIFICATION_KEY, "matrix is singular"));
        }
        if rotation.determinant().abs() <= f32::EPSILON {
            return Err(DataError::calibration(VELO_TO_CAM_KEY, "rotation is singular"));
        }

        let sensor_to_camera =
            Affine3A::from_mat3(rect) * Affine3A::from_mat3_translation(rotation, translation);
        let camera_to_sensor = rotation.inverse() * rect.inverse();

        debug!("Calibration loaded with {} matrices", matrices.len());
        Ok(Self {
            matrices,
            sensor_to_camera,
            camera_to_sensor,
        })
    }

    /// Raw row-major values for `key`.
    pub fn get(&self, key: &str) -> Option<&[f32]> {
        self.matrices.get(key).map(Vec::as_slice)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.matrices.keys().map(String::as_str)
    }

    /// `key` reshaped to 3x3, if it has exactly 9 elements.
    pub fn matrix3(&self, key: &str) -> Option<Mat3> {
        self.get(key)
            .filter(|v| v.len() == 9)
            .map(mat3_from_row_major)
    }

    /// `key` reshaped to 3x4 as an affine map, if it has exactly 12 elements.
    pub fn matrix3x4(&self, key: &str) -> Option<Affine3A> {
        self.get(key).filter(|v| v.len() == 12).map(|v| {
            let (m, t) = split_3x4(v);
            Affine3A::from_mat3_translation(m, t)
        })
    }

    /// Rectified camera coordinates of a sensor-frame point.
    pub fn sensor_to_camera(&self, p: Vec3) -> Vec3 {
        self.sensor_to_camera.transform_point3(p)
    }

    /// Sensor-frame coordinates of a rectified camera-frame point.
    ///
    /// Linear part only: the LIDAR/camera lever arm is left to the caller.
    pub fn camera_to_sensor(&self, p: Vec3) -> Vec3 {
        self.camera_to_sensor * p
    }

    pub fn camera_to_sensor_matrix(&self) -> Mat3 {
        self.camera_to_sensor
    }

    pub fn sensor_to_camera_transform(&self) -> Affine3A {
        self.sensor_to_camera
    }
}

impl FromStr for CalibrationParams {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        let mut matrices = BTreeMap::new();
        for (idx, line) in s.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (key, values) = line
                .split_once(':')
                .ok_or_else(|| DataError::parse(idx + 1, "expected 'key: values'"))?;
            let parsed: std::result::Result<Vec<f32>, _> =
                values.split_whitespace().map(str::parse::<f32>).collect();
            match parsed {
                Ok(v) => {
                    matrices.insert(key.trim().to_string(), v);
                }
                // Non-matrix entries such as `calib_time` are ignored.
                Err(_) => debug!("Skipping non-numeric calibration entry '{}'", key.trim()),
            }
        }
        Self::from_matrices(matrices)
    }
}

fn required<'a>(matrices: &'a BTreeMap<String, Vec<f32>>, key: &str, len: usize) -> Result<&'a [f32]> {
    let values = matrices
        .get(key)
        .ok_or_else(|| DataError::calibration(key, "missing"))?;
    if values.len() != len {
        return Err(DataError::calibration(
            key,
            format!("expected {len} elements, found {}", values.len()),
        ));
    }
    Ok(values)
}

fn mat3_from_row_major(v: &[f32]) -> Mat3 {
    Mat3::from_cols_array(&[v[0], v[3], v[6], v[1], v[4], v[7], v[2], v[5], v[8]])
}

fn split_3x4(v: &[f32]) -> (Mat3, Vec3) {
    let m = Mat3::from_cols_array(&[v[0], v[4], v[8], v[1], v[5], v[9], v[2], v[6], v[10]]);
    (m, Vec3::new(v[3], v[7], v[11]))
}
